//! Flat key-value store clients used by the etcd backend.
//!
//! [`KvClient`] is the seam between tree paths and the wire. [`GatewayClient`]
//! talks to a real etcd cluster through its v3 JSON gateway (gRPC methods
//! exposed as `POST /v3/kv/*`, keys and values base64-encoded).
//! [`MemoryStore`] keeps an ordered map in process.
//!
//! Every failure to reach the store or to make sense of its answer is a
//! [`ConftreeError::Connectivity`]. An absent key is `Ok(None)`.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use log::debug;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::error::{ConftreeError, Result};

/// Point and prefix-range operations over a flat string keyspace.
pub trait KvClient: Send {
    /// Where the store lives, for error messages.
    fn endpoint(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<String>>;

    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// All pairs whose key starts with `prefix`, in key order. The empty
    /// prefix selects the whole keyspace.
    fn range_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>>;
}

/// Client for the etcd v3 JSON gateway.
pub struct GatewayClient {
    agent: ureq::Agent,
    endpoint: String,
}

#[derive(Serialize)]
struct RangeRequest {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    range_end: Option<String>,
}

#[derive(Deserialize)]
struct RangeResponse {
    #[serde(default)]
    kvs: Vec<WireKeyValue>,
}

// The gateway omits empty fields, so an empty value arrives missing.
#[derive(Deserialize)]
struct WireKeyValue {
    key: String,
    #[serde(default)]
    value: String,
}

#[derive(Serialize)]
struct PutRequest {
    key: String,
    value: String,
}

impl GatewayClient {
    pub fn new(host: &str, port: u16, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            endpoint: format!("http://{host}:{port}"),
        }
    }

    fn unreachable(&self, reason: impl ToString) -> ConftreeError {
        ConftreeError::Connectivity {
            endpoint: self.endpoint.clone(),
            reason: reason.to_string(),
        }
    }

    fn call<B: Serialize, R: DeserializeOwned>(&self, method: &str, body: &B) -> Result<R> {
        let url = format!("{}/v3/kv/{method}", self.endpoint);
        debug!("POST {url}");
        let response = self
            .agent
            .post(&url)
            .send_json(body)
            .map_err(|e| self.unreachable(e))?;
        response
            .into_json()
            .map_err(|e| self.unreachable(format!("malformed {method} response: {e}")))
    }

    fn range(&self, key: &[u8], range_end: Option<&[u8]>) -> Result<Vec<(String, String)>> {
        let request = RangeRequest {
            key: BASE64_STANDARD.encode(key),
            range_end: range_end.map(|end| BASE64_STANDARD.encode(end)),
        };
        let response: RangeResponse = self.call("range", &request)?;
        response
            .kvs
            .into_iter()
            .map(|kv| -> Result<(String, String)> {
                Ok((self.decode(&kv.key)?, self.decode(&kv.value)?))
            })
            .collect()
    }

    fn decode(&self, field: &str) -> Result<String> {
        let bytes = BASE64_STANDARD
            .decode(field)
            .map_err(|e| self.unreachable(format!("bad base64 in response: {e}")))?;
        String::from_utf8(bytes).map_err(|e| self.unreachable(format!("non UTF-8 data: {e}")))
    }
}

impl KvClient for GatewayClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let pairs = self.range(key.as_bytes(), None)?;
        Ok(pairs.into_iter().next().map(|(_, value)| value))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let request = PutRequest {
            key: BASE64_STANDARD.encode(key),
            value: BASE64_STANDARD.encode(value),
        };
        let _: IgnoredAny = self.call("put", &request)?;
        Ok(())
    }

    fn range_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let (key, end) = prefix_range(prefix.as_bytes());
        self.range(&key, Some(&end))
    }
}

/// etcd's `[key, range_end)` for "every key starting with `prefix`".
///
/// `range_end` is `prefix` with its last byte below 0xff incremented; a
/// `range_end` of `"\0"` means "no upper bound". The empty prefix maps to
/// `["\0", "\0")`, the whole keyspace.
fn prefix_range(prefix: &[u8]) -> (Vec<u8>, Vec<u8>) {
    if prefix.is_empty() {
        return (vec![0], vec![0]);
    }
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xff {
            end.push(last + 1);
            return (prefix.to_vec(), end);
        }
    }
    (prefix.to_vec(), vec![0])
}

/// An in-process keyspace behind the same interface.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries.lock().map_err(|_| ConftreeError::Connectivity {
            endpoint: "memory".into(),
            reason: "store lock poisoned".into(),
        })
    }
}

impl KvClient for MemoryStore {
    fn endpoint(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn range_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let entries = self.lock()?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}
