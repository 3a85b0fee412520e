//! Backend selection from a URI-like descriptor.
//!
//! | URI | Backend |
//! |-----|---------|
//! | `json:///etc/app/config.json` | [`DocumentBackend`], JSON |
//! | `toml:///etc/app/config.toml` | [`DocumentBackend`], TOML |
//! | `file:///etc/app/config.toml` | [`DocumentBackend`], format from extension |
//! | `etcd-v3://10.0.0.5:2379` | [`EtcdBackend`] over the v3 gateway |
//! | `memory://` | [`EtcdBackend`] over an empty [`MemoryStore`] |
//!
//! File paths may be percent-encoded.

use std::path::PathBuf;
use std::str::FromStr;

use log::debug;
use percent_encoding::percent_decode_str;

use crate::backend::Backend;
use crate::document::{DocumentBackend, DocumentFormat};
use crate::error::{ConftreeError, Result};
use crate::etcd::EtcdBackend;
use crate::kv::MemoryStore;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendUri {
    /// A document on disk. `format: None` picks the parser from the extension.
    Document {
        path: PathBuf,
        format: Option<DocumentFormat>,
    },
    EtcdV3 { host: String, port: u16 },
    Memory,
}

impl BackendUri {
    pub fn parse(uri: &str) -> Result<Self> {
        let invalid = |reason: &str| ConftreeError::InvalidUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };
        let (scheme, rest) = uri.split_once("://").ok_or_else(|| invalid("missing '://'"))?;
        match scheme.to_ascii_lowercase().as_str() {
            "json" => document(rest, Some(DocumentFormat::Json)).map_err(|r| invalid(&r)),
            "toml" => document(rest, Some(DocumentFormat::Toml)).map_err(|r| invalid(&r)),
            "file" => document(rest, None).map_err(|r| invalid(&r)),
            "etcd-v3" | "etcd" => {
                let authority = rest.trim_end_matches('/');
                let (host, port) = authority
                    .rsplit_once(':')
                    .ok_or_else(|| invalid("expected host:port"))?;
                if host.is_empty() {
                    return Err(invalid("empty host"));
                }
                let port = port.parse().map_err(|_| invalid("port must be a number 0-65535"))?;
                Ok(BackendUri::EtcdV3 {
                    host: host.to_string(),
                    port,
                })
            }
            "memory" => Ok(BackendUri::Memory),
            _ => Err(invalid("unknown scheme")),
        }
    }

    /// Construct the backend this URI names.
    pub fn open(&self, settings: &Settings) -> Result<Box<dyn Backend>> {
        debug!("opening {self:?}");
        let backend: Box<dyn Backend> = match self {
            BackendUri::Document { path, format: None } => Box::new(DocumentBackend::open(path)?),
            BackendUri::Document {
                path,
                format: Some(format),
            } => Box::new(DocumentBackend::open_as(path, *format)?),
            BackendUri::EtcdV3 { host, port } => Box::new(EtcdBackend::connect(host, *port, settings)),
            BackendUri::Memory => Box::new(EtcdBackend::with_client(MemoryStore::new())),
        };
        Ok(backend)
    }
}

fn document(rest: &str, format: Option<DocumentFormat>) -> std::result::Result<BackendUri, String> {
    if rest.is_empty() {
        return Err("empty file path".into());
    }
    let path = percent_decode_str(rest)
        .decode_utf8()
        .map_err(|e| format!("bad percent-encoding: {e}"))?;
    Ok(BackendUri::Document {
        path: PathBuf::from(path.into_owned()),
        format,
    })
}

impl FromStr for BackendUri {
    type Err = ConftreeError;

    fn from_str(s: &str) -> Result<Self> {
        BackendUri::parse(s)
    }
}

/// Parse `uri`, open the backend and apply the prefix from `settings`.
pub fn open(uri: &str, settings: &Settings) -> Result<Box<dyn Backend>> {
    let mut backend = BackendUri::parse(uri)?.open(settings)?;
    if let Some(prefix) = &settings.prefix {
        backend.set_prefix(prefix)?;
    }
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::SAMPLE_JSON;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parses_document_schemes() {
        assert_eq!(
            BackendUri::parse("json:///etc/app/config.json").unwrap(),
            BackendUri::Document {
                path: "/etc/app/config.json".into(),
                format: Some(DocumentFormat::Json),
            }
        );
        assert_eq!(
            "toml://relative/app.toml".parse::<BackendUri>().unwrap(),
            BackendUri::Document {
                path: "relative/app.toml".into(),
                format: Some(DocumentFormat::Toml),
            }
        );
        assert_eq!(
            BackendUri::parse("file:///srv/app.toml").unwrap(),
            BackendUri::Document {
                path: "/srv/app.toml".into(),
                format: None,
            }
        );
    }

    #[test]
    fn decodes_percent_escapes_in_paths() {
        let uri = BackendUri::parse("json:///tmp/my%20config.json").unwrap();
        assert_eq!(
            uri,
            BackendUri::Document {
                path: "/tmp/my config.json".into(),
                format: Some(DocumentFormat::Json),
            }
        );
    }

    #[test]
    fn parses_etcd_host_and_port() {
        assert_eq!(
            BackendUri::parse("etcd-v3://10.0.0.5:2379").unwrap(),
            BackendUri::EtcdV3 {
                host: "10.0.0.5".into(),
                port: 2379,
            }
        );
        assert_eq!(
            BackendUri::parse("ETCD://localhost:2379/").unwrap(),
            BackendUri::EtcdV3 {
                host: "localhost".into(),
                port: 2379,
            }
        );
    }

    #[test]
    fn rejects_malformed_uris() {
        for bad in [
            "no-scheme",
            "ftp://host/file",
            "json://",
            "etcd-v3://localhost",
            "etcd-v3://:2379",
            "etcd-v3://localhost:port",
            "etcd-v3://localhost:99999",
        ] {
            let err = BackendUri::parse(bad).unwrap_err();
            assert!(matches!(err, ConftreeError::InvalidUri { .. }), "{bad}");
        }
    }

    #[test]
    fn opens_document_backend() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.json");
        fs::write(&path, SAMPLE_JSON).unwrap();
        let backend = open(&format!("json://{}", path.display()), &Settings::default()).unwrap();
        assert_eq!(backend.get_string("host").unwrap(), Some("localhost".into()));
    }

    #[test]
    fn applies_prefix_from_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.json");
        fs::write(&path, SAMPLE_JSON).unwrap();
        let settings = Settings {
            prefix: Some("database".into()),
            ..Settings::default()
        };
        let backend = open(&format!("file://{}", path.display()), &settings).unwrap();
        assert_eq!(backend.prefix(), "database");
        assert!(backend.get_recursive("url").is_ok());
    }

    #[test]
    fn opening_missing_document_fails() {
        let dir = TempDir::new().unwrap();
        let uri = format!("json://{}", dir.path().join("absent.json").display());
        assert!(matches!(open(&uri, &Settings::default()), Err(ConftreeError::Io { .. })));
    }

    #[test]
    fn memory_backend_is_writable() {
        let mut backend = open("memory://", &Settings::default()).unwrap();
        backend.put_string("a/b", "1").unwrap();
        assert_eq!(backend.get_string("a/b").unwrap(), Some("1".into()));
    }

    #[test]
    fn etcd_uri_opens_without_network() {
        let backend = open("etcd-v3://127.0.0.1:2379", &Settings::default()).unwrap();
        assert_eq!(backend.prefix(), "");
    }
}
