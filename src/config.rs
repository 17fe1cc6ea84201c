use eyre::{Result, WrapErr};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "slotbook.toml";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub poll: PollConfig,
    pub admin: AdminAccount,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    Memory,
    File {
        #[serde(default = "default_store_path")]
        path: PathBuf,
    },
    Sql {
        url: String,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("slotbook.json")
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig { interval_secs: 5 }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// The single system account allowed to manage companies.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AdminAccount {
    pub username: String,
    pub password: String,
}

impl Default for AdminAccount {
    fn default() -> Self {
        AdminAccount {
            username: "admin".to_owned(),
            password: "admin123".to_owned(),
        }
    }
}

impl Config {
    pub fn parse(contents: &str) -> Result<Config> {
        toml::from_str(contents).wrap_err("cannot parse configuration")
    }

    pub fn load(file_name: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(file_name)
            .wrap_err_with(|| format!("cannot load configuration file {}", file_name.display()))?;
        Self::parse(&contents)
            .wrap_err_with(|| format!("invalid configuration file {}", file_name.display()))
    }

    /// Load the given file, or the default one when it exists, or fall back to
    /// the built-in defaults.
    pub fn locate(file_name: Option<&Path>) -> Result<Config> {
        match file_name {
            Some(file_name) => Self::load(file_name),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Config::default()),
        }
    }
}
