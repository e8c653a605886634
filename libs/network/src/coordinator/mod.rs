//! Coordination Service Abstraction
//!
//! The registry client talks to the external coordination service through
//! [`Coordinator`]. Any backend offering sessions, ephemeral nodes, child
//! listing and child-change watches fits; [`InMemoryCoordinator`] is the
//! in-process backend used by tests and the probe binary.
//!
//! ## Path Model
//!
//! Paths are `/`-separated and absolute. Creating a node creates missing
//! parents as persistent nodes. Ephemeral nodes belong to the session that
//! created them and vanish when that session closes or expires.

use crate::error::CoordinatorResult;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast;

pub mod memory;

pub use memory::InMemoryCoordinator;

/// Server-assigned session identifier
pub type SessionId = u64;

/// Kind of change under a watched parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildEventKind {
    Added,
    Removed,
}

/// Notification that the children of `parent` changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEvent {
    pub parent: String,
    pub child: String,
    pub kind: ChildEventKind,
}

/// Primitives the registry client needs from a coordination service
#[async_trait]
pub trait Coordinator: Send + Sync {
    /// Open a new session
    async fn connect(&self, address: &str, session_timeout: Duration) -> CoordinatorResult<SessionId>;

    /// Keep `session` alive; fails once the session is unusable
    async fn ping(&self, session: SessionId) -> CoordinatorResult<()>;

    /// Create an ephemeral node owned by `session`
    async fn create_ephemeral(&self, session: SessionId, path: &str, data: Vec<u8>) -> CoordinatorResult<()>;

    async fn delete(&self, session: SessionId, path: &str) -> CoordinatorResult<()>;

    /// Child names of `path`, oldest first
    async fn children(&self, session: SessionId, path: &str) -> CoordinatorResult<Vec<String>>;

    async fn get_data(&self, session: SessionId, path: &str) -> CoordinatorResult<Vec<u8>>;

    /// Subscribe to child additions and removals under `path`
    ///
    /// The path does not need to exist yet.
    async fn watch_children(
        &self,
        session: SessionId,
        path: &str,
    ) -> CoordinatorResult<broadcast::Receiver<ChildEvent>>;

    /// Close `session`, removing its ephemeral nodes
    async fn close_session(&self, session: SessionId) -> CoordinatorResult<()>;
}

/// Parent of an absolute path, `None` for the root
pub(crate) fn parent_path(path: &str) -> Option<&str> {
    let idx = path.rfind('/')?;
    if idx == 0 {
        if path.len() > 1 {
            Some("/")
        } else {
            None
        }
    } else {
        Some(&path[..idx])
    }
}

/// Last path segment
pub(crate) fn node_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
