use std::{env, path::PathBuf};

use crate::appinfo::APPINFO_FILE_NAME;

/// Environment variable overriding [`Config::appinfo_path`].
pub const APPINFO_PATH_ENV: &str = "XPEDITE_APPINFO_PATH";

/// Activation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The app-info file that call site records are appended to.
    pub appinfo_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            appinfo_path: PathBuf::from(APPINFO_FILE_NAME),
        }
    }
}

impl Config {
    /// Defaults, overridden by any variables set in the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = env::var_os(APPINFO_PATH_ENV).filter(|path| !path.is_empty()) {
            config.appinfo_path = PathBuf::from(path);
        }
        config
    }

    pub fn with_appinfo_path(mut self, appinfo_path: impl Into<PathBuf>) -> Self {
        self.appinfo_path = appinfo_path.into();
        self
    }
}
