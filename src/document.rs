//! Read-only backend over a structured document loaded once from disk.
//!
//! The document is parsed ([`serde_json`] or [`toml`]), flattened into
//! `(path, leaf)` pairs and folded into a [`Node`] at construction. Every
//! read is served from that in-memory tree.
//!
//! Prefix handling is asymmetric: [`get_recursive`](Backend::get_recursive)
//! reads relative to the active prefix, while
//! [`get_string`](Backend::get_string) always reads from the document root.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::backend::Backend;
use crate::error::{ConftreeError, Result};
use crate::flatten::flatten;
use crate::tree::{Node, get_subtree, join_path, key_values_to_tree};

/// Parser used for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// `.toml` files are TOML; everything else is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Json,
        }
    }
}

#[derive(Debug)]
pub struct DocumentBackend {
    source: PathBuf,
    root: Node,
    prefix: String,
}

impl DocumentBackend {
    /// Load `path`, choosing the parser from its extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::open_as(path, DocumentFormat::from_path(path))
    }

    pub fn open_as(path: impl AsRef<Path>, format: DocumentFormat) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConftreeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&text, format, path.to_path_buf())
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::parse(text, DocumentFormat::Json, PathBuf::from("<json>"))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::parse(text, DocumentFormat::Toml, PathBuf::from("<toml>"))
    }

    /// The full tree, ignoring any prefix.
    pub fn root(&self) -> &Node {
        &self.root
    }

    fn parse(text: &str, format: DocumentFormat, source: PathBuf) -> Result<Self> {
        let parse_error = |reason: String| ConftreeError::Parse {
            path: source.clone(),
            reason,
        };
        let pairs = match format {
            DocumentFormat::Json => {
                let value: serde_json::Value =
                    serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?;
                flatten(&value)
            }
            DocumentFormat::Toml => {
                let table: toml::Table =
                    toml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
                flatten(&table)
            }
        }
        .map_err(|e| ConftreeError::Construction {
            path: e.path().to_string(),
            reason: format!("{} in {}", e.reason(), source.display()),
        })?;

        debug!("loaded {} values from {}", pairs.len(), source.display());
        let root = key_values_to_tree(pairs)?;
        if root.is_leaf() {
            warn!("{} holds a single scalar, not a tree", source.display());
        }
        Ok(Self {
            source,
            root,
            prefix: String::new(),
        })
    }
}

impl Backend for DocumentBackend {
    fn put_string(&mut self, _path: &str, _value: &str) -> Result<()> {
        Err(ConftreeError::Unsupported {
            backend: "document",
            operation: "put_string",
        })
    }

    fn get_string(&self, path: &str) -> Result<Option<String>> {
        match get_subtree(&self.root, path) {
            Ok(node) => Ok(node.get::<String>()),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set_prefix(&mut self, path: &str) -> Result<()> {
        get_subtree(&self.root, path)?;
        debug!("{}: prefix set to '{path}'", self.source.display());
        self.prefix = path.to_string();
        Ok(())
    }

    fn get_recursive(&self, path: &str) -> Result<Node> {
        get_subtree(&self.root, &join_path(&self.prefix, path)).cloned()
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}
