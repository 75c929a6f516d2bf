use crate::config::Config;
use crate::download::Downloader;
use crate::error::{JenkenvError, Result};
use crate::store::VersionStore;
use crate::utils::print_info;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::path::Path;

/// Brings a Jenkins version from "not installed" to "runnable": downloads the
/// war into the version's subtree and extracts it next to it.
pub struct Installer {
    config: Config,
    store: VersionStore,
    downloader: Downloader,
}

impl Installer {
    pub fn new(config: Config) -> Self {
        let store = VersionStore::new(&config);
        Self {
            config,
            store,
            downloader: Downloader::new(),
        }
    }

    /// Install a Jenkins version.
    ///
    /// Re-installing overwrites the existing archive and unpacked tree; a
    /// failed install leaves the partial entry on disk (no rollback) so a
    /// retry can pick up where it left off.
    pub async fn install(&self, version: &str) -> Result<()> {
        let version_dir = self.store.version_dir(version);
        let archive = self.store.archive_path(version);

        println!(
            "{} jenkins-{}...",
            "Installing".green().bold(),
            version.cyan()
        );

        std::fs::create_dir_all(&version_dir)?;

        let url = format!("{}/{}/jenkins.war", self.config.download_url, version);
        self.downloader.download_with_progress(&url, &archive).await?;

        println!("{}", "Extracting war...".yellow());
        extract_zip(&archive, &self.store.unpacked_dir(version))?;

        println!(
            "{} installed jenkins-{} to {}",
            "✓".green().bold(),
            version.cyan(),
            version_dir.display().to_string().dimmed()
        );

        Ok(())
    }

    /// Uninstall a Jenkins version; a missing version is reported, not an error
    pub fn uninstall(&self, version: &str) -> Result<()> {
        match self.store.remove(version) {
            Ok(()) => {
                println!(
                    "{} uninstalled jenkins-{}",
                    "✓".green().bold(),
                    version.cyan()
                );
                Ok(())
            }
            Err(JenkenvError::VersionNotFound(_)) => {
                print_info(&format!(
                    "jenkins-{} is not installed; nothing to uninstall",
                    version
                ));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Extract a zip archive (the war) preserving its directory structure
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message("Extracting...");

    std::fs::create_dir_all(dest_dir)?;

    let file = File::open(archive_path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| JenkenvError::ExtractionFailed(e.to_string()))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| JenkenvError::ExtractionFailed(e.to_string()))?;

        let outpath = match file.enclosed_name() {
            Some(path) => dest_dir.join(path),
            None => continue,
        };

        if file.name().ends_with('/') {
            std::fs::create_dir_all(&outpath)?;
        } else {
            if let Some(p) = outpath.parent() {
                if !p.exists() {
                    std::fs::create_dir_all(p)?;
                }
            }
            let mut outfile = File::create(&outpath)?;
            std::io::copy(&mut file, &mut outfile)?;
        }

        // Set permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
            }
        }
    }

    pb.finish_with_message("Extraction complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_test_war(path: &Path) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        writer.add_directory("WEB-INF/", options).unwrap();
        writer.start_file("WEB-INF/web.xml", options).unwrap();
        writer.write_all(b"<web-app/>").unwrap();
        writer.start_file("index.jsp", options).unwrap();
        writer.write_all(b"<html/>").unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_extract_zip_preserves_structure() {
        let temp = TempDir::new().unwrap();
        let war = temp.path().join("jenkins.war");
        let dest = temp.path().join("jenkins");

        write_test_war(&war);
        extract_zip(&war, &dest).unwrap();

        assert_eq!(
            std::fs::read(dest.join("WEB-INF").join("web.xml")).unwrap(),
            b"<web-app/>"
        );
        assert_eq!(std::fs::read(dest.join("index.jsp")).unwrap(), b"<html/>");
    }

    #[test]
    fn test_extract_zip_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let war = temp.path().join("jenkins.war");
        std::fs::write(&war, b"definitely not a zip").unwrap();

        let result = extract_zip(&war, &temp.path().join("jenkins"));
        assert!(matches!(result, Err(JenkenvError::ExtractionFailed(_))));
    }

    #[test]
    fn test_uninstall_missing_version_is_a_no_op() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.jenkenv_dir = temp.path().to_path_buf();
        config.versions_dir = temp.path().join("versions");

        let installer = Installer::new(config);
        installer.uninstall("2.999").unwrap();
    }

    #[tokio::test]
    async fn test_install_fetches_and_unpacks() {
        let temp = TempDir::new().unwrap();

        // Serve a real (tiny) war from the mock index
        let war_src = temp.path().join("src.war");
        write_test_war(&war_src);
        let war_bytes = std::fs::read(&war_src).unwrap();

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/download/war/2.303/jenkins.war")
            .with_status(200)
            .with_body(war_bytes)
            .create_async()
            .await;

        let mut config = Config::default();
        config.jenkenv_dir = temp.path().to_path_buf();
        config.versions_dir = temp.path().join("versions");
        config.download_url = format!("{}/download/war", server.url());

        let installer = Installer::new(config.clone());
        installer.install("2.303").await.unwrap();

        let store = VersionStore::new(&config);
        assert!(store.archive_path("2.303").exists());
        assert!(store.unpacked_dir("2.303").join("index.jsp").exists());
    }
}
