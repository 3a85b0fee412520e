//! Clap front end for `conftree-get`.
//!
//! Compiled only with the `clap` feature (on by default). The binary is a
//! thin wrapper: parse [`GetArgs`], load [`Settings`], call
//! [`GetArgs::run`] and print what it returns.

use clap::Parser;

use crate::error::{ConftreeError, Result};
use crate::settings::Settings;
use crate::uri;

/// Printed when a scalar read finds nothing.
pub const MISSING_KEY: &str = "Key did not exist";

/// Read a value or a subtree from a configuration backend.
#[derive(Debug, Parser)]
#[command(name = "conftree-get", version)]
pub struct GetArgs {
    /// Backend URI, e.g. `json:///etc/app.json` or `etcd-v3://127.0.0.1:2379`.
    /// Falls back to the `uri` setting (`CONFTREE_URI`).
    #[arg(long)]
    pub uri: Option<String>,

    /// Slash-delimited path of the value to read.
    #[arg(short, long)]
    pub key: String,

    /// Print the whole subtree under the key.
    #[arg(short, long)]
    pub recursive: bool,

    /// With --recursive, print the subtree as JSON instead of an indented dump.
    #[arg(long, requires = "recursive")]
    pub json: bool,
}

impl GetArgs {
    /// Run the lookup and return the text to print, newline-terminated.
    pub fn run(&self, settings: &Settings) -> Result<String> {
        let uri = self
            .uri
            .as_deref()
            .or(settings.uri.as_deref())
            .ok_or_else(|| ConftreeError::InvalidUri {
                uri: String::new(),
                reason: "no backend given; pass --uri or set CONFTREE_URI".into(),
            })?;
        let backend = uri::open(uri, settings)?;

        if !self.recursive {
            let value = backend.get_string(&self.key)?;
            return Ok(format!("{}\n", value.as_deref().unwrap_or(MISSING_KEY)));
        }

        let node = backend.get_recursive(&self.key)?;
        if self.json {
            let mut out = serde_json::to_string_pretty(&node)?;
            out.push('\n');
            Ok(out)
        } else {
            Ok(node.to_string())
        }
    }
}
