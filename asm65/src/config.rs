use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyze::Options;
use crate::dialect::DialectId;
use crate::error::Error;

pub const FILE_NAME: &str = "asm65.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Warnings {
    pub unused: bool,
    pub branch_range: bool,
}

impl Default for Warnings {
    fn default() -> Self {
        Warnings {
            unused: true,
            branch_range: true,
        }
    }
}

/// Project file
///
/// ```yaml
/// dialect: ca65
/// main: [src/main.s]
/// shared: [src/zeropage.inc]
/// include: [include]
/// warnings:
///   unused: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dialect: Option<DialectId>,
    pub main: Vec<PathBuf>,
    pub shared: Vec<PathBuf>,
    pub include: Vec<PathBuf>,
    pub warnings: Warnings,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self, Error> {
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read a project file. Relative paths in it are taken from its directory.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        let mut config: Config = serde_yaml::from_reader(BufReader::new(file))
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        if let Some(base) = path.parent() {
            for p in config
                .main
                .iter_mut()
                .chain(config.shared.iter_mut())
                .chain(config.include.iter_mut())
            {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        }
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Nearest project file in `dir` or one of its ancestors
    pub fn find(dir: &Path) -> Option<PathBuf> {
        dir.ancestors()
            .map(|d| d.join(FILE_NAME))
            .find(|p| p.is_file())
    }

    pub fn options(&self) -> Options {
        Options {
            unused: self.warnings.unused,
            branch_range: self.warnings.branch_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test() {
        let config = Config::parse("dialect: acme\nwarnings:\n  unused: false\n").unwrap();
        assert_eq!(config.dialect, Some(DialectId::Acme));
        assert!(!config.options().unused);
        assert!(config.options().branch_range);
        assert!(config.main.is_empty());

        assert_eq!(Config::parse("").unwrap(), Config::default());
        assert!(matches!(Config::parse("dialect: [1"), Err(Error::Config(_))));
    }
}
