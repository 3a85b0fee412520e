//! Settings for the backend factory and the `conftree-get` tool.
//!
//! Layers, lowest to highest priority: compiled defaults, `conftree.toml` in
//! the platform config directory, `CONFTREE_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use confique::Config;

use crate::error::Result;

#[derive(Config, Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Backend URI used when none is passed explicitly, e.g.
    /// `json:///etc/app/config.json` or `etcd-v3://127.0.0.1:2379`.
    #[config(env = "CONFTREE_URI")]
    pub uri: Option<String>,

    /// Deadline for each remote request, in seconds. Unset means calls block
    /// until the transport gives up.
    #[config(env = "CONFTREE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Prefix applied right after a backend is opened.
    #[config(env = "CONFTREE_PREFIX")]
    pub prefix: Option<String>,
}

impl Settings {
    /// Load from the environment and the platform config file, if present.
    pub fn load() -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = default_file() {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }

    /// Load from one TOML file only. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::builder().file(path).load()?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// `conftree.toml` in the platform config directory.
pub fn default_file() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "conftree")?;
    Some(dirs.config_dir().join("conftree.toml"))
}
