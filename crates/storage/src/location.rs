//! Command operands: object keys or local paths.

use core::fmt;
use std::path::{Path, PathBuf};

/// Prefix marking an operand as an object key.
pub const STORE_SCHEME: &str = "store://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Object key, relative to the store root.
    Store(String),
    Local(PathBuf),
}

impl Location {
    pub fn parse(operand: &str) -> Self {
        match operand.strip_prefix(STORE_SCHEME) {
            Some(key) => Location::Store(key.to_string()),
            None => Location::Local(PathBuf::from(operand)),
        }
    }

    pub fn is_store(&self) -> bool {
        matches!(self, Location::Store(_))
    }

    /// Final path segment, used when the destination names a directory.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Location::Store(key) => key
                .rsplit('/')
                .next()
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            Location::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        }
    }

    /// Resolve a destination against its source: a store key ending in `/`
    /// (or empty), or an existing local directory, gets the source file name
    /// appended.
    pub async fn join_source_name(&self, source: &Location) -> Location {
        let Some(name) = source.file_name() else {
            return self.clone();
        };
        match self {
            Location::Store(key) if key.is_empty() || key.ends_with('/') => {
                Location::Store(format!("{key}{name}"))
            }
            Location::Local(path) => {
                if is_dir_hint(path).await {
                    Location::Local(path.join(name))
                } else {
                    self.clone()
                }
            }
            other => other.clone(),
        }
    }
}

async fn is_dir_hint(path: &Path) -> bool {
    if path.as_os_str().to_string_lossy().ends_with('/') {
        return true;
    }
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_dir())
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Store(key) => write!(f, "{STORE_SCHEME}{key}"),
            Location::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_operands() {
        assert_eq!(
            Location::parse("store://logs/a.txt"),
            Location::Store("logs/a.txt".into())
        );
        assert_eq!(
            Location::parse("./a.txt"),
            Location::Local(PathBuf::from("./a.txt"))
        );
        assert_eq!(
            Location::parse("store://logs/a.txt").to_string(),
            "store://logs/a.txt"
        );
    }

    #[tokio::test]
    async fn directory_destinations_take_the_source_name() {
        let src = Location::parse("/tmp/report.csv");

        assert_eq!(
            Location::parse("store://daily/").join_source_name(&src).await,
            Location::Store("daily/report.csv".into())
        );
        assert_eq!(
            Location::parse("store://").join_source_name(&src).await,
            Location::Store("report.csv".into())
        );
        assert_eq!(
            Location::parse("store://daily/r.csv").join_source_name(&src).await,
            Location::Store("daily/r.csv".into())
        );
        assert_eq!(
            Location::parse("out/")
                .join_source_name(&Location::parse("store://a/b.bin"))
                .await,
            Location::Local(PathBuf::from("out/b.bin"))
        );
    }

    #[tokio::test]
    async fn existing_local_directory_takes_the_source_name() {
        let dir = tempfile::tempdir().unwrap();
        let src = Location::parse("store://a/b.bin");

        assert_eq!(
            Location::Local(dir.path().to_path_buf())
                .join_source_name(&src)
                .await,
            Location::Local(dir.path().join("b.bin"))
        );
        assert_eq!(
            Location::Local(dir.path().join("c.bin"))
                .join_source_name(&src)
                .await,
            Location::Local(dir.path().join("c.bin"))
        );
    }
}
