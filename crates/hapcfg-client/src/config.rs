use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfError, ConfResult};

/// Directory name used for staged snapshots when none is configured.
pub const DEFAULT_TRANSACTION_DIR: &str = "transactions";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// The committed configuration file.
    pub config_file: PathBuf,
    /// Where staged snapshots live. Defaults to `transactions/` next to
    /// `config_file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_dir: Option<PathBuf>,
    /// Validate objects before any write.
    #[serde(default = "enabled")]
    pub use_validation: bool,
    #[serde(default = "enabled")]
    pub use_cache: bool,
}

fn enabled() -> bool {
    true
}

impl ClientConfig {
    pub fn new(config_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            transaction_dir: None,
            use_validation: true,
            use_cache: true,
        }
    }

    /// Read a TOML client configuration.
    pub fn load(path: &Path) -> ConfResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| ConfError::Config(format!("{}: {e}", path.display())))?;
        text.parse()
    }

    /// The staging directory, with the default applied.
    pub fn transaction_dir(&self) -> PathBuf {
        match &self.transaction_dir {
            Some(dir) => dir.clone(),
            None => self
                .config_file
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(DEFAULT_TRANSACTION_DIR),
        }
    }
}

impl std::str::FromStr for ClientConfig {
    type Err = ConfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(|e| ConfError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ClientConfig::new("/etc/haproxy/haproxy.cfg");
        assert!(c.use_validation);
        assert!(c.use_cache);
        assert_eq!(
            c.transaction_dir(),
            PathBuf::from("/etc/haproxy/transactions")
        );
    }

    #[test]
    fn parse_minimal_toml() {
        let c: ClientConfig = "config_file = \"/srv/lb.cfg\"".parse().unwrap();
        assert_eq!(c, ClientConfig::new("/srv/lb.cfg"));
    }

    #[test]
    fn parse_full_toml() {
        let c: ClientConfig = r#"
            config_file = "lb.cfg"
            transaction_dir = "/var/lib/hapcfg"
            use_validation = false
            use_cache = false
        "#
        .parse()
        .unwrap();
        assert_eq!(c.transaction_dir(), PathBuf::from("/var/lib/hapcfg"));
        assert!(!c.use_validation);
        assert!(!c.use_cache);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = "use_cache = true".parse::<ClientConfig>().unwrap_err();
        assert!(matches!(err, ConfError::Config(_)));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hapcfg.toml");
        fs::write(&path, "config_file = \"a.cfg\"\nuse_cache = false\n").unwrap();
        let c = ClientConfig::load(&path).unwrap();
        assert!(!c.use_cache);
        assert_eq!(c.transaction_dir(), PathBuf::from("transactions"));

        assert!(ClientConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
