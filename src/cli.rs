use crate::catalog::CatalogLister;
use crate::config::Config;
use crate::error::{JenkenvError, Result};
use crate::install::Installer;
use crate::resolver::{Scope, VersionResolver};
use crate::store::VersionStore;
use crate::supervisor::{ProcessRegistry, ProcessSupervisor};
use crate::utils::{confirm, print_info, print_success};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jenkenv")]
#[command(about = "Per-project Jenkins version manager", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(skip)]
    config: Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum MarkerScope {
    /// Version for the current directory (.jenkins_version in the cwd)
    Local,
    /// Default version for this user
    Global,
}

impl From<MarkerScope> for Scope {
    fn from(scope: MarkerScope) -> Self {
        match scope {
            MarkerScope::Local => Scope::Local,
            MarkerScope::Global => Scope::Global,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List installed Jenkins versions
    #[command(alias = "ls")]
    List,

    /// Run a Jenkinsfile as a single pipeline
    Run {
        /// Path to the Jenkinsfile
        jenkinsfile: String,

        /// Version to run with (defaults to the selected version)
        version: Option<String>,
    },

    /// Run the Jenkins server
    RunJenkins {
        /// Version to run (defaults to the selected version)
        version: Option<String>,
    },

    /// Select the version for this directory or this user
    Use {
        /// Marker scope
        scope: MarkerScope,

        /// Version to select
        version: String,
    },

    /// Reset a version's jenkins_home
    Clean {
        /// Version to clean (defaults to the selected version)
        version: Option<String>,
    },

    /// Install a Jenkins version
    #[command(group = ArgGroup::new("target").required(true))]
    Install {
        /// Version to install (e.g. 2.303)
        #[arg(group = "target")]
        version: Option<String>,

        /// List versions available for download instead
        #[arg(short = 'l', long = "list", group = "target")]
        list: bool,
    },

    /// Uninstall a Jenkins version
    Uninstall {
        /// Version to uninstall
        version: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl Cli {
    pub fn new(config: Config) -> Self {
        let mut cli = Self::parse();
        cli.config = config;
        cli
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::List => self.list(),
            Commands::Run {
                ref jenkinsfile,
                ref version,
            } => self.run_pipeline(jenkinsfile, version.as_deref()).await,
            Commands::RunJenkins { ref version } => self.run_jenkins(version.as_deref()).await,
            Commands::Use { scope, ref version } => self.use_version(scope.into(), version),
            Commands::Clean { ref version } => self.clean(version.as_deref()),
            Commands::Install { ref version, list } => {
                if list {
                    self.list_remote().await
                } else {
                    self.install(version.as_deref().unwrap_or_default()).await
                }
            }
            Commands::Uninstall { ref version, yes } => self.uninstall(version, yes),
        }
    }

    fn list(&self) -> Result<()> {
        let store = VersionStore::new(&self.config);
        let resolver = VersionResolver::new(&self.config)?;

        let installed = store.list_installed()?;
        if installed.is_empty() {
            print_info("no jenkins.war files installed");
            return Ok(());
        }

        let local = resolver.local_version()?;
        let global = resolver.global_version()?;

        println!("{}", "installed versions:".green().bold());
        for version in &installed {
            if Some(version) == local.as_ref() {
                println!("{} {}", "=>".cyan(), version);
            } else if Some(version) == global.as_ref() {
                println!("{}  {}", "*".yellow(), version);
            } else {
                println!("   {}", version);
            }
        }
        println!();
        println!("{} = local version", "=>".cyan());
        println!("{}  = global version", "*".yellow());

        Ok(())
    }

    async fn run_pipeline(&self, jenkinsfile: &str, version: Option<&str>) -> Result<()> {
        let store = VersionStore::new(&self.config);
        let version = self.resolve_installed(&store, version)?;

        let jenkinsfile = absolutize(jenkinsfile)?;
        let args = vec![
            "-w".to_string(),
            store.unpacked_dir(&version).display().to_string(),
            "-p".to_string(),
            store
                .workspace_dir(&version)
                .join("plugins")
                .display()
                .to_string(),
            "-f".to_string(),
            jenkinsfile.display().to_string(),
        ];

        self.run_supervised(&self.config.runner_path, &args, &[])
            .await
    }

    async fn run_jenkins(&self, version: Option<&str>) -> Result<()> {
        let store = VersionStore::new(&self.config);
        let version = self.resolve_installed(&store, version)?;

        let args = vec![
            "-jar".to_string(),
            store.archive_path(&version).display().to_string(),
        ];
        let envs = vec![(
            "JENKINS_HOME".to_string(),
            store.workspace_dir(&version).display().to_string(),
        )];

        self.run_supervised("java", &args, &envs).await
    }

    /// Spawn the child, stream its output, sweep the registry and exit with
    /// the child's own status so callers of jenkenv see server failures.
    async fn run_supervised(
        &self,
        program: &str,
        args: &[String],
        envs: &[(String, String)],
    ) -> Result<()> {
        let registry = ProcessRegistry::new();
        let supervisor = ProcessSupervisor::new(registry.clone());

        let handle = supervisor.spawn(program, args, envs).await?;
        let status = supervisor
            .stream_and_wait(handle, |line| println!("{}", line))
            .await?;

        registry.drain_and_cleanup().await;
        std::process::exit(status.code().unwrap_or(1));
    }

    fn resolve_installed(&self, store: &VersionStore, explicit: Option<&str>) -> Result<String> {
        let resolver = VersionResolver::new(&self.config)?;
        let version = resolver.resolve(explicit)?;

        if !store.is_installed(&version) {
            return Err(JenkenvError::VersionNotFound(version));
        }

        Ok(version)
    }

    fn use_version(&self, scope: Scope, version: &str) -> Result<()> {
        let resolver = VersionResolver::new(&self.config)?;
        let path = resolver.set_marker(scope, version)?;

        print_success(&format!(
            "set version {} at {}",
            version.cyan(),
            path.display().to_string().dimmed()
        ));
        Ok(())
    }

    fn clean(&self, version: Option<&str>) -> Result<()> {
        let store = VersionStore::new(&self.config);
        let resolver = VersionResolver::new(&self.config)?;

        let version = resolver.resolve(version)?;
        store.reset_workspace(&version)?;

        print_success(&format!("cleaned jenkins-{}", version));
        Ok(())
    }

    async fn list_remote(&self) -> Result<()> {
        let lister = CatalogLister::new(&self.config.download_url);

        print_info("Fetching available Jenkins versions...");
        let versions = lister.list_available().await?;

        println!("\n{}", "Available versions:".green().bold());
        for version in &versions {
            println!("  {}", version.cyan());
        }

        println!("\n{}", "Usage:".yellow());
        println!("  jenkenv install <version>");

        Ok(())
    }

    async fn install(&self, version: &str) -> Result<()> {
        let installer = Installer::new(self.config.clone());
        installer.install(version).await
    }

    fn uninstall(&self, version: &str, yes: bool) -> Result<()> {
        if !yes && !confirm(&format!("Uninstall jenkins-{}?", version)) {
            print_info("Uninstall cancelled");
            return Ok(());
        }

        let installer = Installer::new(self.config.clone());
        installer.uninstall(version)
    }
}

fn absolutize(path: &str) -> Result<PathBuf> {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
