use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ConfigError, Result};
use crate::filter::{Filter, KindFilter, NamespaceFilter, PatternFilter, UniqueFilter};
use crate::finder::{ClassFinder, ParsePolicy};
use crate::kind::{DeclarationKind, KindMask};

pub const CONFIG_ENV: &str = "CLASS_SCANNER_CONFIG";
pub const LOCAL_CONFIG_FILE: &str = "class-scanner.json";

/// External configuration for a default finder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    /// Kind bitmask; absent means every kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
    pub filters: Vec<FilterSpec>,
    pub exclude: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    pub on_parse_error: ParsePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum FilterSpec {
    Kind {
        kinds: Vec<DeclarationKind>,
    },
    Namespace {
        prefixes: Vec<String>,
    },
    Pattern {
        pattern: String,
        #[serde(default)]
        exclude: bool,
    },
    Unique,
}

impl FilterSpec {
    pub fn build(&self) -> Result<Arc<dyn Filter>> {
        let filter: Arc<dyn Filter> = match self {
            FilterSpec::Kind { kinds } => {
                Arc::new(KindFilter::new(kinds.iter().copied().collect::<KindMask>()))
            }
            FilterSpec::Namespace { prefixes } => Arc::new(NamespaceFilter::new(prefixes)),
            FilterSpec::Pattern { pattern, exclude } => {
                let filter = PatternFilter::new(pattern)?;
                Arc::new(if *exclude { filter.excluding() } else { filter })
            }
            FilterSpec::Unique => Arc::new(UniqueFilter),
        };
        Ok(filter)
    }
}

impl ScannerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    pub fn mask(&self) -> KindMask {
        self.mode.map(KindMask::from_bits).unwrap_or(KindMask::ALL)
    }

    /// Builds the configured finder. Filters keep their listed order.
    pub fn finder(&self) -> Result<ClassFinder> {
        let filters = self
            .filters
            .iter()
            .map(FilterSpec::build)
            .collect::<Result<Vec<_>>>()?;

        let mut finder =
            ClassFinder::new(self.mask(), filters).with_parse_policy(self.on_parse_error);
        if !self.extensions.is_empty() {
            finder = finder.with_extensions(self.extensions.iter().cloned());
        }
        Ok(finder)
    }
}

/// Picks the config file: an explicit path, then `$CLASS_SCANNER_CONFIG`,
/// then `./class-scanner.json`, then the user config directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }

    if let Ok(p) = env::var(CONFIG_ENV)
        && !p.is_empty()
    {
        return Some(PathBuf::from(p));
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("class-scanner").join("config.json"))
        .filter(|p| p.is_file())
}

/// Loads the resolved config, falling back to defaults when none exists.
pub fn load_config(explicit: Option<&Path>) -> Result<(ScannerConfig, Option<PathBuf>)> {
    match resolve_config_path(explicit) {
        Some(path) => Ok((ScannerConfig::load(&path)?, Some(path))),
        None => Ok((ScannerConfig::default(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[test]
    fn parses_full_document() {
        let raw = r#"{
            "mode": 6,
            "filters": [
                {"type": "namespace", "prefixes": ["App\\Domain"]},
                {"type": "pattern", "pattern": "Test$", "exclude": true},
                {"type": "kind", "kinds": ["class"]},
                {"type": "unique"}
            ],
            "exclude": ["vendor"],
            "extensions": ["php", "inc"],
            "on_parse_error": "skip"
        }"#;
        let config: ScannerConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.mask(), KindMask::CLASSES | KindMask::ENUMS);
        assert_eq!(config.filters.len(), 4);
        assert_eq!(
            config.filters[1],
            FilterSpec::Pattern {
                pattern: "Test$".to_string(),
                exclude: true
            }
        );
        assert_eq!(config.on_parse_error, ParsePolicy::Skip);

        let finder = config.finder().unwrap();
        assert_eq!(finder.filters().len(), 4);
        assert_eq!(finder.parse_policy(), ParsePolicy::Skip);
    }

    #[test]
    fn empty_document_means_defaults() {
        let config: ScannerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.mask(), KindMask::ALL);
        assert!(config.filters.is_empty());
        assert_eq!(config.on_parse_error, ParsePolicy::Abort);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(serde_json::from_str::<ScannerConfig>(r#"{"modes": 1}"#).is_err());
        assert!(
            serde_json::from_str::<ScannerConfig>(r#"{"filters": [{"type": "reflection"}]}"#)
                .is_err()
        );
    }

    #[test]
    fn invalid_pattern_fails_when_building() {
        let config = ScannerConfig {
            filters: vec![FilterSpec::Pattern {
                pattern: "[".to_string(),
                exclude: false,
            }],
            ..Default::default()
        };
        assert!(matches!(
            config.finder(),
            Err(Error::Config(ConfigError::InvalidPattern { .. }))
        ));
    }

    #[test]
    fn load_reports_path_of_broken_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("class-scanner.json");
        std::fs::write(&path, "{ not json").unwrap();

        match ScannerConfig::load(&path) {
            Err(Error::Config(ConfigError::Json { path: reported, .. })) => {
                assert_eq!(reported, path)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn explicit_path_wins() {
        let explicit = Path::new("/etc/custom.json");
        assert_eq!(
            resolve_config_path(Some(explicit)),
            Some(explicit.to_path_buf())
        );
    }
}
