//! The contract every storage adapter implements.

use crate::error::Result;
use crate::tree::Node;

/// Uniform read/write access to configuration by `/`-delimited path.
///
/// Calls block until the underlying store answers. A backend owns its prefix
/// state; `set_prefix` takes `&mut self`, so callers sharing an instance
/// across threads must serialize access themselves.
pub trait Backend: Send {
    /// Write a text value. Read-only backends return
    /// [`Unsupported`](crate::ConftreeError::Unsupported).
    fn put_string(&mut self, path: &str, value: &str) -> Result<()>;

    /// Read a text value.
    ///
    /// `Ok(None)` when nothing is at `path`, when `path` is a subtree, or when
    /// the leaf holds another kind. Errors are reserved for malformed paths
    /// and store failures.
    fn get_string(&self, path: &str) -> Result<Option<String>>;

    /// Replace the prefix prepended to subsequent paths.
    fn set_prefix(&mut self, path: &str) -> Result<()>;

    /// Read the whole subtree at `path` (after the prefix).
    ///
    /// Fails with [`NotFound`](crate::ConftreeError::NotFound) if nothing is
    /// there.
    fn get_recursive(&self, path: &str) -> Result<Node>;

    /// The active prefix, `""` when unset.
    fn prefix(&self) -> &str;
}
