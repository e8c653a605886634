//! In-process coordination service
//!
//! Keeps the node tree, sessions and watches in memory. Besides serving as a
//! registry for single-process deployments it exposes fault injection
//! (`set_available`, `expire_session`) and counters for tests.

use super::{node_name, parent_path, ChildEvent, ChildEventKind, Coordinator, SessionId};
use crate::error::{CoordinatorError, CoordinatorResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

const WATCH_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
struct Node {
    data: Vec<u8>,
    owner: Option<SessionId>,
    /// Creation order, used to list children oldest first
    created: u64,
}

#[derive(Default)]
struct TreeState {
    nodes: BTreeMap<String, Node>,
    sessions: HashSet<SessionId>,
    watchers: HashMap<String, broadcast::Sender<ChildEvent>>,
    next_created: u64,
}

impl TreeState {
    fn check_session(&self, session: SessionId) -> CoordinatorResult<()> {
        if self.sessions.contains(&session) {
            Ok(())
        } else {
            Err(CoordinatorError::SessionExpired { session })
        }
    }

    fn exists(&self, path: &str) -> bool {
        path == "/" || self.nodes.contains_key(path)
    }

    fn insert(&mut self, path: &str, data: Vec<u8>, owner: Option<SessionId>) {
        self.next_created += 1;
        self.nodes.insert(
            path.to_string(),
            Node {
                data,
                owner,
                created: self.next_created,
            },
        );
        self.notify(path, ChildEventKind::Added);
    }

    fn remove(&mut self, path: &str) -> bool {
        let removed = self.nodes.remove(path).is_some();
        if removed {
            self.notify(path, ChildEventKind::Removed);
        }
        removed
    }

    fn ensure_parents(&mut self, path: &str) {
        let mut ancestors = Vec::new();
        let mut current = parent_path(path);
        while let Some(parent) = current {
            if self.exists(parent) {
                break;
            }
            ancestors.push(parent.to_string());
            current = parent_path(parent);
        }
        for ancestor in ancestors.into_iter().rev() {
            self.insert(&ancestor, Vec::new(), None);
        }
    }

    fn children(&self, path: &str) -> Vec<String> {
        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{}/", path)
        };

        let mut children: Vec<(&String, u64)> = self
            .nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| !key[prefix.len()..].contains('/'))
            .map(|(key, node)| (key, node.created))
            .collect();
        children.sort_by_key(|(_, created)| *created);
        children
            .into_iter()
            .map(|(key, _)| node_name(key).to_string())
            .collect()
    }

    fn notify(&self, path: &str, kind: ChildEventKind) {
        let Some(parent) = parent_path(path) else {
            return;
        };
        if let Some(tx) = self.watchers.get(parent) {
            // no receivers left is fine
            let _ = tx.send(ChildEvent {
                parent: parent.to_string(),
                child: node_name(path).to_string(),
                kind,
            });
        }
    }

    fn drop_session(&mut self, session: SessionId) -> usize {
        self.sessions.remove(&session);
        let owned: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.owner == Some(session))
            .map(|(path, _)| path.clone())
            .collect();
        for path in &owned {
            self.remove(path);
        }
        owned.len()
    }
}

/// Coordination service held entirely in process memory
pub struct InMemoryCoordinator {
    state: Mutex<TreeState>,
    available: AtomicBool,
    next_session: AtomicU64,
    connect_attempts: AtomicUsize,
    watch_subscriptions: AtomicUsize,
    operations: AtomicUsize,
}

impl Default for InMemoryCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCoordinator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TreeState::default()),
            available: AtomicBool::new(true),
            next_session: AtomicU64::new(1),
            connect_attempts: AtomicUsize::new(0),
            watch_subscriptions: AtomicUsize::new(0),
            operations: AtomicUsize::new(0),
        }
    }

    /// Simulate the service going down or coming back
    ///
    /// While unavailable every call fails with `ConnectionLoss`; sessions
    /// and nodes survive the outage.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Expire `session` server-side, dropping its ephemeral nodes
    pub fn expire_session(&self, session: SessionId) -> usize {
        let removed = self.state.lock().drop_session(session);
        debug!(session, removed, "expired session");
        removed
    }

    /// Number of `connect` calls received, successful or not
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Number of `watch_children` subscriptions handed out
    pub fn watch_subscriptions(&self) -> usize {
        self.watch_subscriptions.load(Ordering::SeqCst)
    }

    /// Total calls received through the [`Coordinator`] trait
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    pub fn live_sessions(&self) -> usize {
        self.state.lock().sessions.len()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state.lock().exists(path)
    }

    /// Children of `path` without going through a session
    pub fn list(&self, path: &str) -> Vec<String> {
        self.state.lock().children(path)
    }

    fn begin(&self) -> CoordinatorResult<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CoordinatorError::ConnectionLoss)
        }
    }
}

#[async_trait]
impl Coordinator for InMemoryCoordinator {
    async fn connect(&self, address: &str, _session_timeout: Duration) -> CoordinatorResult<SessionId> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        self.begin()?;

        let session = self.next_session.fetch_add(1, Ordering::SeqCst);
        self.state.lock().sessions.insert(session);
        debug!(session, address, "session opened");
        Ok(session)
    }

    async fn ping(&self, session: SessionId) -> CoordinatorResult<()> {
        self.begin()?;
        self.state.lock().check_session(session)
    }

    async fn create_ephemeral(&self, session: SessionId, path: &str, data: Vec<u8>) -> CoordinatorResult<()> {
        self.begin()?;
        let mut state = self.state.lock();
        state.check_session(session)?;

        if state.exists(path) {
            return Err(CoordinatorError::NodeExists {
                path: path.to_string(),
            });
        }
        state.ensure_parents(path);
        state.insert(path, data, Some(session));
        Ok(())
    }

    async fn delete(&self, session: SessionId, path: &str) -> CoordinatorResult<()> {
        self.begin()?;
        let mut state = self.state.lock();
        state.check_session(session)?;

        if state.remove(path) {
            Ok(())
        } else {
            Err(CoordinatorError::NoNode {
                path: path.to_string(),
            })
        }
    }

    async fn children(&self, session: SessionId, path: &str) -> CoordinatorResult<Vec<String>> {
        self.begin()?;
        let state = self.state.lock();
        state.check_session(session)?;

        if !state.exists(path) {
            return Err(CoordinatorError::NoNode {
                path: path.to_string(),
            });
        }
        Ok(state.children(path))
    }

    async fn get_data(&self, session: SessionId, path: &str) -> CoordinatorResult<Vec<u8>> {
        self.begin()?;
        let state = self.state.lock();
        state.check_session(session)?;

        state
            .nodes
            .get(path)
            .map(|node| node.data.clone())
            .ok_or_else(|| CoordinatorError::NoNode {
                path: path.to_string(),
            })
    }

    async fn watch_children(
        &self,
        session: SessionId,
        path: &str,
    ) -> CoordinatorResult<broadcast::Receiver<ChildEvent>> {
        self.begin()?;
        let mut state = self.state.lock();
        state.check_session(session)?;

        let receiver = state
            .watchers
            .entry(path.to_string())
            .or_insert_with(|| broadcast::channel(WATCH_CHANNEL_CAPACITY).0)
            .subscribe();
        self.watch_subscriptions.fetch_add(1, Ordering::SeqCst);
        Ok(receiver)
    }

    async fn close_session(&self, session: SessionId) -> CoordinatorResult<()> {
        self.begin()?;
        let mut state = self.state.lock();
        state.check_session(session)?;

        let removed = state.drop_session(session);
        debug!(session, removed, "session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_children_listed_in_creation_order() {
        let coordinator = InMemoryCoordinator::new();
        let session = coordinator.connect("mem", TIMEOUT).await.unwrap();

        for name in ["zeta", "alpha", "mid"] {
            coordinator
                .create_ephemeral(session, &format!("/rpc/svc/{}", name), Vec::new())
                .await
                .unwrap();
        }

        assert_eq!(
            coordinator.children(session, "/rpc/svc").await.unwrap(),
            vec!["zeta", "alpha", "mid"]
        );
        assert_eq!(coordinator.children(session, "/rpc").await.unwrap(), vec!["svc"]);
        assert_eq!(coordinator.children(session, "/").await.unwrap(), vec!["rpc"]);
        assert!(matches!(
            coordinator.children(session, "/missing").await,
            Err(CoordinatorError::NoNode { .. })
        ));
    }

    #[tokio::test]
    async fn test_ephemeral_nodes_die_with_session() {
        let coordinator = InMemoryCoordinator::new();
        let owner = coordinator.connect("mem", TIMEOUT).await.unwrap();
        let observer = coordinator.connect("mem", TIMEOUT).await.unwrap();

        coordinator
            .create_ephemeral(owner, "/rpc/svc/a", b"a".to_vec())
            .await
            .unwrap();
        let mut events = coordinator.watch_children(observer, "/rpc/svc").await.unwrap();

        coordinator.close_session(owner).await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.kind, ChildEventKind::Removed);
        assert_eq!(event.child, "a");
        // persistent parents survive
        assert!(coordinator.children(observer, "/rpc/svc").await.unwrap().is_empty());
        assert!(matches!(
            coordinator.ping(owner).await,
            Err(CoordinatorError::SessionExpired { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_create_and_missing_delete() {
        let coordinator = InMemoryCoordinator::new();
        let session = coordinator.connect("mem", TIMEOUT).await.unwrap();

        coordinator.create_ephemeral(session, "/a/b", Vec::new()).await.unwrap();
        assert!(matches!(
            coordinator.create_ephemeral(session, "/a/b", Vec::new()).await,
            Err(CoordinatorError::NodeExists { .. })
        ));
        coordinator.delete(session, "/a/b").await.unwrap();
        assert!(matches!(
            coordinator.delete(session, "/a/b").await,
            Err(CoordinatorError::NoNode { .. })
        ));
    }

    #[tokio::test]
    async fn test_unavailable_rejects_everything() {
        let coordinator = InMemoryCoordinator::new();
        let session = coordinator.connect("mem", TIMEOUT).await.unwrap();
        coordinator.set_available(false);

        assert_eq!(coordinator.ping(session).await, Err(CoordinatorError::ConnectionLoss));
        assert_eq!(
            coordinator.connect("mem", TIMEOUT).await,
            Err(CoordinatorError::ConnectionLoss)
        );
        assert_eq!(coordinator.connect_attempts(), 2);

        coordinator.set_available(true);
        coordinator.ping(session).await.unwrap();
    }
}
