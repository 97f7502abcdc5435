//! Layered configuration: defaults, then TOML files, then `SQUASH_*`
//! environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const ENV_PREFIX: &str = "SQUASH_";
pub const CONFIG_FILE: &str = "squash.toml";

/// Default compressor: the bare name is looked up on `PATH`.
pub const DEFAULT_COMPRESSOR: &str = "compress";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory transient input and output files are staged in.
    pub work_dir: PathBuf,
    /// Compressor executable, invoked as `<compressor> <input> <output>`.
    pub compressor: PathBuf,
    /// Kill the compressor after this many seconds. Unset waits forever.
    pub timeout_secs: Option<u64>,
    /// Accepted file extensions, without the dot. Empty accepts anything.
    pub allowed_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("squash"),
            compressor: PathBuf::from(DEFAULT_COMPRESSOR),
            timeout_secs: None,
            allowed_extensions: Vec::new(),
        }
    }
}

impl Config {
    /// The provider stack. An explicit `file` replaces the default lookup of
    /// `<user config>/squash/squash.toml` and `./squash.toml`.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(file) => figment = figment.merge(Toml::file(file)),
            None => {
                if let Some(dir) = user_config_dir() {
                    figment = figment.merge(Toml::file(dir.join("squash").join(CONFIG_FILE)));
                }
                figment = figment.merge(Toml::file(CONFIG_FILE));
            }
        }
        figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["log"]))
    }

    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(file))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.compressor.as_os_str().is_empty() {
            return Err(Error::EmptyCompressor);
        }
        if self.timeout_secs == Some(0) {
            return Err(Error::ZeroTimeout);
        }
        if let Some(bad) = self
            .allowed_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.contains(['.', '/', '\\']))
        {
            return Err(Error::InvalidExtension(bad.clone()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Per-user directory holding `squash/squash.toml`.
fn user_config_dir() -> Option<PathBuf> {
    if cfg!(windows) {
        return std::env::var_os("APPDATA").map(PathBuf::from);
    }
    if cfg!(target_os = "macos") {
        return home::home_dir().map(|home| home.join("Library").join("Application Support"));
    }
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|home| home.join(".config")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.work_dir.ends_with("squash"));
        assert_eq!(config.compressor, PathBuf::from(DEFAULT_COMPRESSOR));
        assert_eq!(config.timeout(), None);
        assert!(config.allowed_extensions.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
                    compressor = "/opt/huffman/compress"
                    timeout_secs = 30
                    allowed_extensions = ["txt", "png"]
                "#,
            )?;
            let config = Config::load(Some(Path::new("custom.toml"))).unwrap();
            assert_eq!(config.compressor, PathBuf::from("/opt/huffman/compress"));
            assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
            assert_eq!(config.allowed_extensions, vec!["txt", "png"]);
            assert_eq!(config.work_dir, Config::default().work_dir);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, r#"work_dir = "/from/file""#)?;
            jail.set_env("SQUASH_WORK_DIR", "/from/env");
            jail.set_env("SQUASH_TIMEOUT_SECS", "5");
            jail.set_env("SQUASH_ALLOWED_EXTENSIONS", "[txt, mp4]");
            jail.set_env("SQUASH_LOG", "debug");
            let config: Config = Config::figment(None).extract()?;
            assert_eq!(config.work_dir, PathBuf::from("/from/env"));
            assert_eq!(config.timeout_secs, Some(5));
            assert_eq!(config.allowed_extensions, vec!["txt", "mp4"]);
            Ok(())
        });
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn test_user_config_file_is_picked_up() {
        Jail::expect_with(|jail| {
            std::fs::create_dir("squash").unwrap();
            jail.create_file("squash/squash.toml", "timeout_secs = 45")?;
            let dir = jail.directory().display().to_string();
            jail.set_env("XDG_CONFIG_HOME", dir);
            assert_eq!(user_config_dir().as_deref(), Some(jail.directory()));
            let config: Config = Config::figment(None).extract()?;
            assert_eq!(config.timeout_secs, Some(45));
            Ok(())
        });
    }

    #[test]
    fn test_local_file_is_picked_up() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, r#"compressor = "./bin/compress""#)?;
            let config: Config = Config::figment(None).extract()?;
            assert_eq!(config.compressor, PathBuf::from("./bin/compress"));
            Ok(())
        });
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            compressor: PathBuf::new(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::EmptyCompressor)));

        let config = Config {
            timeout_secs: Some(0),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::ZeroTimeout)));

        let config = Config {
            allowed_extensions: vec!["txt".into(), ".png".into()],
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidExtension(ext)) if ext == ".png"));
    }

    #[test]
    fn test_load_reports_invalid_timeout() {
        Jail::expect_with(|jail| {
            jail.set_env("SQUASH_TIMEOUT_SECS", "0");
            assert!(matches!(Config::load(None), Err(Error::ZeroTimeout)));
            Ok(())
        });
    }
}
