//! Hierarchical configuration access over heterogeneous stores. Point at a
//! document or an etcd cluster and read values by path.
//!
//! ```ignore
//! let mut config = conftree::open("etcd-v3://127.0.0.1:2379", &Settings::default())?;
//! config.set_prefix("services/api")?;
//! let url = config.get_string("database/url")?;
//! let everything = config.get_recursive("")?;
//! ```
//!
//! Every backend answers the same four calls from the [`Backend`] trait,
//! whatever the data looks like underneath, and hands back either a text
//! value or a [`Node`] tree.
//!
//! # The tree
//!
//! A [`Node`] is either a [`Leaf`] holding one scalar (text, integer, float or
//! boolean) or a branch of named children in insertion order. Paths name
//! children joined with `/`; `""` is the node itself.
//!
//! - [`get_subtree`] walks a path and fails with
//!   [`NotFound`](ConftreeError::NotFound) at the first missing component.
//! - [`Node::get`] extracts a typed value only when the leaf holds exactly that
//!   kind. An `Int` is never read back as an `f64`.
//! - [`key_values_to_tree`] folds flat `(path, leaf)` pairs into a tree and is
//!   what both backends use to assemble results. [`Node::flatten`] undoes it.
//! - [`print_tree`] (or `Display`) gives an indented dump for humans.
//!
//! Code that needs to branch on leaf kind goes through the [`visitor`]
//! module, which makes forgetting a kind a compile error.
//!
//! # Backends
//!
//! | Backend | Source | Writes | Prefix check |
//! |---------|--------|--------|--------------|
//! | [`DocumentBackend`] | JSON or TOML file, loaded once | never | against the loaded tree |
//! | [`EtcdBackend`] | etcd v3 through its JSON gateway | yes | none (keys may not exist yet) |
//!
//! The document backend keeps the whole tree in memory. Note that its
//! `get_string` always reads from the document root while `get_recursive`
//! honours the prefix.
//!
//! The etcd backend stores nothing but its prefix. Paths become flat keys
//! (`db/url` under prefix `cfg` is `cfg.db.url`); a recursive read is a
//! single prefix-range request folded back into a tree. The wire sits behind
//! the [`KvClient`] trait; [`MemoryStore`] implements it in process.
//!
//! # Choosing a backend
//!
//! [`open`] takes a URI (`json://`, `toml://`, `file://`, `etcd-v3://host:port`,
//! `memory://`) and returns a `Box<dyn Backend>`. [`Settings`] supplies the
//! defaults: a fallback URI, a remote request timeout and a prefix, layered
//! from `conftree.toml` and `CONFTREE_*` variables.
//!
//! # Errors
//!
//! Scalar reads return `Ok(None)` for anything that is not a text leaf, so
//! existence checks stay cheap. Malformed paths, writes to read-only
//! backends, unreachable stores and contradictory source data are
//! [`ConftreeError`]s. A store failure is always
//! [`Connectivity`](ConftreeError::Connectivity), never mistaken for a missing
//! key. Nothing is retried.

pub mod error;
pub mod visitor;

mod backend;
#[cfg(feature = "clap")]
mod cli;
mod document;
mod etcd;
mod flatten;
mod kv;
mod settings;
mod tree;
mod uri;

#[cfg(test)]
mod fixtures;

pub use backend::Backend;
#[cfg(feature = "clap")]
pub use cli::{GetArgs, MISSING_KEY};
pub use document::{DocumentBackend, DocumentFormat};
pub use error::{ConftreeError, Result};
pub use etcd::{EtcdBackend, STORE_SEPARATOR};
pub use flatten::{FlattenError, flatten};
pub use kv::{GatewayClient, KvClient, MemoryStore};
pub use settings::Settings;
pub use tree::{
    Leaf, LeafKind, LeafValue, Node, SEPARATOR, get_subtree, join_path, key_values_to_tree,
    print_tree, split_path,
};
pub use uri::{BackendUri, open};
