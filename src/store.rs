use crate::config::{Config, VERSION_FILE_NAME};
use crate::error::{JenkenvError, Result};
use std::path::PathBuf;

/// On-disk layout and lifecycle of installed Jenkins versions.
///
/// Each installed version is a subtree under the versions root:
/// `<versions>/<id>/{jenkins.war, jenkins/, jenkins_home/}`. The members are
/// created lazily and independently; a partially installed version is still
/// a valid entry.
pub struct VersionStore {
    versions_dir: PathBuf,
}

impl VersionStore {
    pub fn new(config: &Config) -> Self {
        Self {
            versions_dir: config.versions_dir.clone(),
        }
    }

    #[cfg(test)]
    pub fn with_root(versions_dir: PathBuf) -> Self {
        Self { versions_dir }
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.versions_dir.join(version)
    }

    /// The downloaded war for a version
    pub fn archive_path(&self, version: &str) -> PathBuf {
        self.version_dir(version).join("jenkins.war")
    }

    /// The extracted, runnable form of the war
    pub fn unpacked_dir(&self, version: &str) -> PathBuf {
        self.version_dir(version).join("jenkins")
    }

    /// The mutable runtime data directory (JENKINS_HOME) for a version
    pub fn workspace_dir(&self, version: &str) -> PathBuf {
        self.version_dir(version).join("jenkins_home")
    }

    pub fn is_installed(&self, version: &str) -> bool {
        self.version_dir(version).exists()
    }

    /// List installed versions in filesystem order.
    ///
    /// A version is installed if its subtree exists, even partially. Any
    /// stray `.jenkins_version` marker is skipped.
    pub fn list_installed(&self) -> Result<Vec<String>> {
        let mut installed = Vec::new();

        if !self.versions_dir.exists() {
            return Ok(installed);
        }

        for entry in std::fs::read_dir(&self.versions_dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if name == VERSION_FILE_NAME {
                    continue;
                }
                installed.push(name.to_string());
            }
        }

        Ok(installed)
    }

    /// Recursively delete a version's subtree
    pub fn remove(&self, version: &str) -> Result<()> {
        let version_dir = self.version_dir(version);

        if !version_dir.exists() {
            return Err(JenkenvError::VersionNotFound(version.to_string()));
        }

        std::fs::remove_dir_all(&version_dir)?;
        Ok(())
    }

    /// Delete and recreate the workspace member, leaving the archive and the
    /// unpacked tree intact
    pub fn reset_workspace(&self, version: &str) -> Result<()> {
        let version_dir = self.version_dir(version);

        if !version_dir.exists() {
            return Err(JenkenvError::VersionNotFound(version.to_string()));
        }

        let workspace = self.workspace_dir(version);
        if workspace.exists() {
            std::fs::remove_dir_all(&workspace)?;
        }
        std::fs::create_dir_all(&workspace)?;

        Ok(())
    }
}
