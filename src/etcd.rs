//! Backend over a flat, remote key-value namespace (etcd v3).
//!
//! Tree paths map onto single flat keys: components are joined with
//! [`STORE_SEPARATOR`] and the translated prefix goes in front, so with prefix
//! `cfg` the path `db/url` is the key `cfg.db.url`. Recursive reads issue one
//! prefix-range request and fold the returned pairs back into a [`Node`].
//!
//! Only what a call asks for is fetched; nothing is cached between calls.

use log::debug;

use crate::backend::Backend;
use crate::error::{ConftreeError, Result};
use crate::kv::{GatewayClient, KvClient};
use crate::settings::Settings;
use crate::tree::{Leaf, Node, SEPARATOR, join_path, key_values_to_tree, split_path};

/// Separator between components of a flat store key.
pub const STORE_SEPARATOR: char = '.';

pub struct EtcdBackend<C = GatewayClient> {
    client: C,
    prefix: String,
    key_prefix: String,
}

impl EtcdBackend<GatewayClient> {
    /// Backend talking to the etcd gateway at `host:port`. No request is made
    /// until the first operation.
    pub fn connect(host: &str, port: u16, settings: &Settings) -> Self {
        debug!("etcd backend for {host}:{port}, timeout {:?}", settings.timeout());
        Self::with_client(GatewayClient::new(host, port, settings.timeout()))
    }
}

impl<C: KvClient> EtcdBackend<C> {
    pub fn with_client(client: C) -> Self {
        Self {
            client,
            prefix: String::new(),
            key_prefix: String::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// The flat key for `path` under the active prefix.
    pub fn flat_key(&self, path: &str) -> Result<String> {
        let relative = translate(path)?;
        Ok(join_key(&self.key_prefix, &relative))
    }
}

/// Map a tree path to store-key form. Components holding the store separator
/// could not be told apart from nesting, so they are rejected.
fn translate(path: &str) -> Result<String> {
    let components = split_path(path)?;
    if components.iter().any(|c| c.contains(STORE_SEPARATOR)) {
        return Err(ConftreeError::InvalidPath {
            path: path.to_string(),
            reason: format!("component contains the store separator '{STORE_SEPARATOR}'"),
        });
    }
    Ok(components.join(STORE_SEPARATOR.to_string().as_str()))
}

fn join_key(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}{STORE_SEPARATOR}{rest}"),
    }
}

impl<C: KvClient> Backend for EtcdBackend<C> {
    fn put_string(&mut self, path: &str, value: &str) -> Result<()> {
        let key = self.flat_key(path)?;
        if key.is_empty() {
            return Err(ConftreeError::InvalidPath {
                path: path.to_string(),
                reason: "cannot write a value at the root".into(),
            });
        }
        debug!("put {key} on {}", self.client.endpoint());
        self.client.put(&key, value)
    }

    fn get_string(&self, path: &str) -> Result<Option<String>> {
        let key = self.flat_key(path)?;
        if key.is_empty() {
            return Ok(None);
        }
        debug!("get {key} from {}", self.client.endpoint());
        self.client.get(&key)
    }

    fn set_prefix(&mut self, path: &str) -> Result<()> {
        self.key_prefix = translate(path)?;
        self.prefix = path.to_string();
        debug!("prefix set to '{path}' (key prefix '{}')", self.key_prefix);
        Ok(())
    }

    fn get_recursive(&self, path: &str) -> Result<Node> {
        let key = self.flat_key(path)?;
        let scan = if key.is_empty() {
            String::new()
        } else {
            format!("{key}{STORE_SEPARATOR}")
        };
        debug!("range '{scan}' on {}", self.client.endpoint());
        let entries = self.client.range_prefix(&scan)?;

        if entries.is_empty() {
            if !key.is_empty()
                && let Some(value) = self.client.get(&key)?
            {
                return Ok(Node::Leaf(Leaf::Text(value)));
            }
            return Err(ConftreeError::NotFound(join_path(&self.prefix, path)));
        }

        let pairs = entries
            .into_iter()
            .map(|(flat, value)| -> Result<(String, Leaf)> {
                let relative = flat.strip_prefix(&scan).unwrap_or(&flat);
                // A '/' inside a stored key would read back as extra nesting.
                if relative.contains(SEPARATOR) {
                    return Err(ConftreeError::Construction {
                        path: flat.clone(),
                        reason: format!("store key contains the path separator '{SEPARATOR}'"),
                    });
                }
                Ok((
                    relative.replace(STORE_SEPARATOR, SEPARATOR.to_string().as_str()),
                    Leaf::Text(value),
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        key_values_to_tree(pairs)
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}
