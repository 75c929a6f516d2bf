use crate::config::Config;
use crate::error::{JenkenvError, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    Global,
}

/// Computes the effective Jenkins version for an operation.
///
/// Precedence is explicit argument > local marker > global marker. The local
/// marker lives in the working directory, the global one under the jenkenv
/// dir; a marker file that exists but is empty counts as absent.
pub struct VersionResolver {
    global_path: PathBuf,
    local_path: PathBuf,
}

impl VersionResolver {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            global_path: config.global_version_file(),
            local_path: config.local_version_file()?,
        })
    }

    #[cfg(test)]
    pub fn with_paths(global_path: PathBuf, local_path: PathBuf) -> Self {
        Self {
            global_path,
            local_path,
        }
    }

    pub fn resolve(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(version) = explicit {
            return Ok(version.to_string());
        }

        self.local_version()?
            .or(self.global_version()?)
            .ok_or(JenkenvError::NoVersionSelected)
    }

    pub fn local_version(&self) -> Result<Option<String>> {
        Self::read_marker(&self.local_path)
    }

    pub fn global_version(&self) -> Result<Option<String>> {
        Self::read_marker(&self.global_path)
    }

    pub fn set_marker(&self, scope: Scope, version: &str) -> Result<PathBuf> {
        let path = match scope {
            Scope::Local => &self.local_path,
            Scope::Global => &self.global_path,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, version)?;

        Ok(path.clone())
    }

    fn read_marker(path: &PathBuf) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let version = contents.trim();
                if version.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(version.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver_in(temp: &TempDir) -> VersionResolver {
        VersionResolver::with_paths(
            temp.path().join("global").join(".jenkins_version"),
            temp.path().join("local").join(".jenkins_version"),
        )
    }

    #[test]
    fn test_explicit_wins_over_markers() {
        let temp = TempDir::new().unwrap();
        let resolver = resolver_in(&temp);

        resolver.set_marker(Scope::Local, "A").unwrap();
        resolver.set_marker(Scope::Global, "B").unwrap();

        assert_eq!(resolver.resolve(Some("X")).unwrap(), "X");
    }

    #[test]
    fn test_local_wins_over_global() {
        let temp = TempDir::new().unwrap();
        let resolver = resolver_in(&temp);

        resolver.set_marker(Scope::Local, "A").unwrap();
        resolver.set_marker(Scope::Global, "B").unwrap();

        assert_eq!(resolver.resolve(None).unwrap(), "A");
    }

    #[test]
    fn test_global_used_when_local_absent() {
        let temp = TempDir::new().unwrap();
        let resolver = resolver_in(&temp);

        resolver.set_marker(Scope::Global, "B").unwrap();

        assert_eq!(resolver.resolve(None).unwrap(), "B");
    }

    #[test]
    fn test_each_scope_round_trips() {
        for scope in [Scope::Local, Scope::Global] {
            let temp = TempDir::new().unwrap();
            let resolver = resolver_in(&temp);

            resolver.set_marker(scope, "2.303").unwrap();
            assert_eq!(resolver.resolve(None).unwrap(), "2.303");
        }
    }

    #[test]
    fn test_empty_marker_counts_as_absent() {
        let temp = TempDir::new().unwrap();
        let resolver = resolver_in(&temp);

        resolver.set_marker(Scope::Local, "").unwrap();
        resolver.set_marker(Scope::Global, "B").unwrap();

        assert_eq!(resolver.resolve(None).unwrap(), "B");
    }

    #[test]
    fn test_no_version_anywhere_fails() {
        let temp = TempDir::new().unwrap();
        let resolver = resolver_in(&temp);

        assert!(matches!(
            resolver.resolve(None),
            Err(JenkenvError::NoVersionSelected)
        ));
    }

    #[test]
    fn test_set_marker_overwrites() {
        let temp = TempDir::new().unwrap();
        let resolver = resolver_in(&temp);

        resolver.set_marker(Scope::Global, "2.289").unwrap();
        resolver.set_marker(Scope::Global, "2.303").unwrap();

        assert_eq!(resolver.global_version().unwrap(), Some("2.303".into()));
    }
}
