//! Layered configuration for workspace discovery.
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults (every provider enabled, platform data locations).
//! 2. `config.toml`, `config.yaml` and `config.json` in the user's config
//!    directory, or a single explicitly requested file.
//! 3. `REVISIT_`-prefixed environment variables, with `__` separating nested
//!    keys (`REVISIT_PROVIDERS__VSCODE__ENABLED=false`).
//!
//! ```toml
//! [providers.vscode]
//! enabled = true
//! data_dir = "/custom/Code"
//! launchers = ["/opt/code/bin/code"]
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "REVISIT_";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-provider settings keyed by provider id (`vscode`, `visual-studio`).
    /// Providers without an entry use [`ProviderConfig::default`].
    pub providers: BTreeMap<String, ProviderConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub enabled: bool,
    /// Replaces the tool's platform data directory (the directory holding
    /// `User/globalStorage` for editors, or the per-instance directories for
    /// Visual Studio).
    pub data_dir: Option<PathBuf>,
    /// Executables tried after the search path and known install locations.
    pub launchers: Vec<PathBuf>,
}
impl Default for ProviderConfig {
    fn default() -> Self {
        Self { enabled: true, data_dir: None, launchers: Vec::new() }
    }
}

impl Config {
    /// Load from the default locations, or from `explicit` alone when given.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let figment = Self::figment(explicit)?;
        let config: Self = figment.extract().or_raise(|| ErrorKind::Invalid)?;
        tracing::debug!(providers = config.providers.len(), "Configuration loaded");
        Ok(config)
    }

    /// The merged sources [`load`](Self::load) extracts from.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match explicit {
            Some(file) => {
                if !file.is_file() {
                    exn::bail!(ErrorKind::NotFound(file.to_path_buf()));
                }
                figment = merge_file(figment, file)?;
            },
            None => {
                if let Some(dir) = Self::config_dir() {
                    tracing::trace!(dir = %dir.display(), "Looking for configuration files");
                    figment = figment
                        .merge(Toml::file(dir.join("config.toml")))
                        .merge(Yaml::file(dir.join("config.yaml")))
                        .merge(Json::file(dir.join("config.json")));
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// The per-user configuration directory, if the platform has one.
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "revisit").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Settings for one provider, falling back to the defaults.
    pub fn provider(&self, id: &str) -> ProviderConfig {
        self.providers.get(id).cloned().unwrap_or_default()
    }
}

fn merge_file(figment: Figment, file: &Path) -> Result<Figment> {
    let extension = file.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(file)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
        Some("json") => figment.merge(Json::file(file)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(file.to_path_buf())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        let provider = config.provider("vscode");
        assert!(provider.enabled);
        assert!(provider.data_dir.is_none());
        assert!(provider.launchers.is_empty());
    }

    #[rstest]
    #[case("config.toml", "[providers.cursor]\nenabled = false\ndata_dir = \"/data/Cursor\"\n")]
    #[case("config.yaml", "providers:\n  cursor:\n    enabled: false\n    data_dir: /data/Cursor\n")]
    #[case("config.json", r#"{"providers":{"cursor":{"enabled":false,"data_dir":"/data/Cursor"}}}"#)]
    fn test_explicit_file(#[case] name: &str, #[case] contents: &str) {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join(name);
        std::fs::write(&file, contents).unwrap();
        let config = Config::load(Some(&file)).unwrap();
        let cursor = config.provider("cursor");
        assert!(!cursor.enabled);
        assert_eq!(cursor.data_dir, Some(PathBuf::from("/data/Cursor")));
        assert!(config.provider("vscode").enabled);
    }

    #[test]
    fn test_missing_explicit_file() {
        let temp = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&temp.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unsupported_format() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("config.ini");
        std::fs::write(&file, "enabled=1").unwrap();
        let err = Config::load(Some(&file)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_invalid_value() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("config.toml");
        std::fs::write(&file, "[providers.vscode]\nenabled = \"sometimes\"\n").unwrap();
        let err = Config::load(Some(&file)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid));
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[providers.vscode]\nenabled = true\nlaunchers = [\"/opt/code\"]\n")?;
            jail.set_env("REVISIT_PROVIDERS__VSCODE__ENABLED", "false");
            let config = Config::load(Some(Path::new("config.toml"))).unwrap();
            let vscode = config.provider("vscode");
            assert!(!vscode.enabled);
            assert_eq!(vscode.launchers, vec![PathBuf::from("/opt/code")]);
            Ok(())
        });
    }
}
