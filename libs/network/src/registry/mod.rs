//! Coordination Registry Client
//!
//! Holds one session to the coordination service and exposes the three
//! primitives discovery needs: ephemeral registration, listing the instances
//! of a service and watching that list for changes.
//!
//! ## Session handling
//!
//! `start()` connects with bounded exponential backoff. A background
//! keepalive pings the session every third of the session timeout; when a
//! ping fails the client reconnects with the same backoff, re-creates every
//! ephemeral node it owns and re-arms watches. Running out of retries leaves
//! the client `Lost`: calls fail fast with `RegistryUnavailable` until
//! `start()` succeeds again.

mod session;

pub use session::SessionState;

use crate::coordinator::{ChildEvent, Coordinator, SessionId};
use crate::error::{CoordinatorError, CoordinatorResult, DiscoveryError, Result};
use crate::instance::{InstanceId, ServiceInfo};
use parking_lot::{Mutex, RwLock};
use rpc_config::RegistrySettings;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct Registration {
    service: String,
    path: String,
    payload: Vec<u8>,
}

struct Shared {
    settings: RegistrySettings,
    coordinator: Arc<dyn Coordinator>,
    session: RwLock<Option<SessionId>>,
    state_tx: watch::Sender<SessionState>,
    registered: Mutex<HashMap<InstanceId, Registration>>,
    /// Serializes connect, reconnect and close
    reconnect_lock: tokio::sync::Mutex<()>,
    /// Attempts spent by the last failed connect
    failed_attempts: AtomicU32,
    closed: AtomicBool,
}

/// Client side of the coordination registry
pub struct RegistryClient {
    shared: Arc<Shared>,
    keepalive: Mutex<Option<JoinHandle<()>>>,
}

/// Live child-change subscription for one service
///
/// Delivery stops when the handle is cancelled or dropped.
#[derive(Debug)]
pub struct WatchHandle {
    service: String,
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(crate) fn validate_service_name(service: &str) -> Result<()> {
    if service.is_empty() {
        return Err(DiscoveryError::invalid_instance("service name cannot be empty"));
    }
    if service.contains('/') {
        return Err(DiscoveryError::invalid_instance(format!(
            "service name '{}' cannot contain '/'",
            service
        )));
    }
    Ok(())
}

impl RegistryClient {
    pub fn new(settings: RegistrySettings, coordinator: Arc<dyn Coordinator>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Latent);
        Self {
            shared: Arc::new(Shared {
                settings,
                coordinator,
                session: RwLock::new(None),
                state_tx,
                registered: Mutex::new(HashMap::new()),
                reconnect_lock: tokio::sync::Mutex::new(()),
                failed_attempts: AtomicU32::new(0),
                closed: AtomicBool::new(false),
            }),
            keepalive: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.shared.settings
    }

    /// Establish the session and start the keepalive
    ///
    /// A no-op while a session is held. After `Lost` this tries again with a
    /// fresh retry budget.
    pub async fn start(&self) -> Result<()> {
        let shared = &self.shared;
        if shared.closed.load(Ordering::SeqCst) {
            return Err(shared.closed_error());
        }

        {
            let _guard = shared.reconnect_lock.lock().await;
            let held = *shared.session.read();
            if held.is_some() {
                return Ok(());
            }

            match session::establish(&shared.settings, shared.coordinator.as_ref()).await {
                Ok(session) => {
                    *shared.session.write() = Some(session);
                    shared.set_state(SessionState::Connected);
                    info!(session, address = %shared.settings.address, "registry client started");
                }
                Err(err) => {
                    if let DiscoveryError::RegistryUnavailable { attempts, .. } = &err {
                        shared.failed_attempts.store(*attempts, Ordering::SeqCst);
                    }
                    shared.set_state(SessionState::Lost);
                    return Err(err);
                }
            }
        }

        self.spawn_keepalive();
        Ok(())
    }

    fn spawn_keepalive(&self) {
        let shared = Arc::downgrade(&self.shared);
        let interval = self.shared.settings.keepalive_interval();
        let task = tokio::spawn(keepalive_loop(shared, interval));

        if let Some(previous) = self.keepalive.lock().replace(task) {
            previous.abort();
        }
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state_tx.borrow()
    }

    /// Receiver of session state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        *self.shared.session.read()
    }

    /// Publish `instance` as an ephemeral node under its service path
    pub async fn register_instance(&self, instance: &ServiceInfo) -> Result<InstanceId> {
        validate_service_name(&instance.service_name)?;
        if instance.host.trim().is_empty() {
            return Err(DiscoveryError::invalid_instance(format!(
                "instance of '{}' has an empty host",
                instance.service_name
            )));
        }

        let id = InstanceId::generate();
        let path = format!(
            "{}/{}",
            self.shared.settings.service_path(&instance.service_name),
            id
        );
        let payload = serde_json::to_vec(instance)?;

        let coordinator = &self.shared.coordinator;
        let (node, data) = (&path, &payload);
        self.shared
            .with_session(move |session| coordinator.create_ephemeral(session, node, data.clone()))
            .await?;

        self.shared.registered.lock().insert(
            id.clone(),
            Registration {
                service: instance.service_name.clone(),
                path,
                payload,
            },
        );
        info!(
            service = %instance.service_name,
            instance = %id,
            address = %instance.address(),
            "registered instance"
        );
        Ok(id)
    }

    /// Remove a registration made by this client
    ///
    /// Returns `false` when the id is not one of ours.
    pub async fn unregister_instance(&self, id: &InstanceId) -> Result<bool> {
        let registration = self.shared.registered.lock().remove(id);
        let Some(registration) = registration else {
            return Ok(false);
        };

        let coordinator = &self.shared.coordinator;
        let node = &registration.path;
        match self
            .shared
            .with_session(move |session| coordinator.delete(session, node))
            .await
        {
            Ok(()) | Err(DiscoveryError::Coordinator(CoordinatorError::NoNode { .. })) => {
                info!(service = %registration.service, instance = %id, "unregistered instance");
                Ok(true)
            }
            Err(err) => {
                // keep it so a reconnect or close still cleans it up
                self.shared.registered.lock().insert(id.clone(), registration);
                Err(err)
            }
        }
    }

    /// Number of instances this client currently keeps registered
    pub fn registered_count(&self) -> usize {
        self.shared.registered.lock().len()
    }

    /// Current instances of `service`, oldest registration first
    pub async fn lookup(&self, service: &str) -> Result<Vec<ServiceInfo>> {
        validate_service_name(service)?;
        self.shared.lookup(service).await
    }

    /// Subscribe to changes in the instance list of `service`
    ///
    /// Every change notification re-lists the service and hands the fresh
    /// list to `callback` on a background task. Bursts of notifications are
    /// coalesced into one refresh.
    pub async fn watch<F>(&self, service: &str, callback: F) -> Result<WatchHandle>
    where
        F: Fn(&str, Vec<ServiceInfo>) + Send + Sync + 'static,
    {
        validate_service_name(service)?;
        let path = self.shared.settings.service_path(service);
        let events = self.shared.subscribe_children(&path).await?;
        let state_rx = self.shared.state_tx.subscribe();

        let task = tokio::spawn(watch_loop(
            Arc::downgrade(&self.shared),
            service.to_string(),
            path,
            events,
            state_rx,
            callback,
        ));
        debug!(service, "watch armed");

        Ok(WatchHandle {
            service: service.to_string(),
            task,
        })
    }

    /// Deregister own instances, stop the keepalive and close the session
    ///
    /// Idempotent. Every later call fails with `RegistryUnavailable`.
    pub async fn close(&self) {
        let shared = &self.shared;
        if shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let _guard = shared.reconnect_lock.lock().await;
        let session = shared.session.write().take();

        let registrations: Vec<(InstanceId, Registration)> = shared.registered.lock().drain().collect();
        if let Some(session) = session {
            for (id, registration) in registrations {
                if let Err(err) = shared.coordinator.delete(session, &registration.path).await {
                    debug!(instance = %id, error = %err, "deregistration on close failed");
                }
            }
        }

        if let Some(task) = self.keepalive.lock().take() {
            task.abort();
        }

        if let Some(session) = session {
            if let Err(err) = shared.coordinator.close_session(session).await {
                debug!(session, error = %err, "closing registry session failed");
            }
        }

        shared.set_state(SessionState::Closed);
        info!("registry client closed");
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

impl Drop for RegistryClient {
    fn drop(&mut self) {
        if let Some(task) = self.keepalive.get_mut().take() {
            task.abort();
        }
    }
}

impl Shared {
    fn set_state(&self, state: SessionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            info!(from = %previous, to = %state, "registry session state changed");
        }
    }

    fn closed_error(&self) -> DiscoveryError {
        DiscoveryError::registry_unavailable("registry client is closed", 0)
    }

    fn current_session(&self) -> Result<SessionId> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.closed_error());
        }
        let held = *self.session.read();
        held.ok_or_else(|| {
            DiscoveryError::registry_unavailable(
                format!("no registry session ({})", *self.state_tx.borrow()),
                self.failed_attempts.load(Ordering::SeqCst),
            )
        })
    }

    /// Run `op` against the current session, recovering once on connection loss
    async fn with_session<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(SessionId) -> Fut,
        Fut: Future<Output = CoordinatorResult<T>>,
    {
        let session = self.current_session()?;
        match op(session).await {
            Err(err) if err.is_connection_error() => {
                warn!(session, error = %err, "registry operation hit a connection error");
                let session = self.recover(session).await?;
                Ok(op(session).await?)
            }
            other => Ok(other?),
        }
    }

    /// Replace a failed session
    ///
    /// Concurrent callers that saw the same failure share one reconnect.
    async fn recover(&self, failed: SessionId) -> Result<SessionId> {
        let _guard = self.reconnect_lock.lock().await;
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.closed_error());
        }

        let held = *self.session.read();
        match held {
            Some(current) if current != failed => return Ok(current),
            None => return self.current_session(),
            Some(_) => {}
        }

        self.set_state(SessionState::Suspended);
        match session::establish(&self.settings, self.coordinator.as_ref()).await {
            Ok(session) => {
                *self.session.write() = Some(session);
                if let Err(err) = self.coordinator.close_session(failed).await {
                    debug!(session = failed, error = %err, "old session already gone");
                }
                self.reregister(session).await;
                self.set_state(SessionState::Reconnected);
                Ok(session)
            }
            Err(err) => {
                if let DiscoveryError::RegistryUnavailable { attempts, .. } = &err {
                    self.failed_attempts.store(*attempts, Ordering::SeqCst);
                }
                *self.session.write() = None;
                self.set_state(SessionState::Lost);
                Err(err)
            }
        }
    }

    /// Re-create our ephemeral nodes under a new session
    async fn reregister(&self, session: SessionId) {
        let registrations: Vec<(InstanceId, Registration)> = self
            .registered
            .lock()
            .iter()
            .map(|(id, registration)| (id.clone(), registration.clone()))
            .collect();

        for (id, registration) in registrations {
            let path = &registration.path;
            let mut result = self
                .coordinator
                .create_ephemeral(session, path, registration.payload.clone())
                .await;
            if let Err(CoordinatorError::NodeExists { .. }) = result {
                // left behind by a session the server has not expired yet
                result = match self.coordinator.delete(session, path).await {
                    Ok(()) => {
                        self.coordinator
                            .create_ephemeral(session, path, registration.payload.clone())
                            .await
                    }
                    Err(err) => Err(err),
                };
            }

            match result {
                Ok(()) => debug!(service = %registration.service, instance = %id, "re-registered instance"),
                Err(err) => warn!(
                    service = %registration.service,
                    instance = %id,
                    error = %err,
                    "failed to re-register instance"
                ),
            }
        }
    }

    async fn subscribe_children(&self, path: &str) -> Result<broadcast::Receiver<ChildEvent>> {
        let coordinator = &self.coordinator;
        self.with_session(move |session| coordinator.watch_children(session, path))
            .await
    }

    async fn lookup(&self, service: &str) -> Result<Vec<ServiceInfo>> {
        let coordinator = &self.coordinator;
        let path = self.settings.service_path(service);
        let parent = path.as_str();

        let children = match self
            .with_session(move |session| coordinator.children(session, parent))
            .await
        {
            Ok(children) => children,
            Err(DiscoveryError::Coordinator(CoordinatorError::NoNode { .. })) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let mut instances = Vec::with_capacity(children.len());
        for child in children {
            let child_path = format!("{}/{}", path, child);
            let node = child_path.as_str();
            let data = match self
                .with_session(move |session| coordinator.get_data(session, node))
                .await
            {
                Ok(data) => data,
                // removed between listing and read
                Err(DiscoveryError::Coordinator(CoordinatorError::NoNode { .. })) => continue,
                Err(err) => return Err(err),
            };

            match serde_json::from_slice::<ServiceInfo>(&data) {
                Ok(instance) => instances.push(instance),
                Err(err) => warn!(
                    service,
                    instance = %child,
                    error = %err,
                    "skipping undecodable instance payload"
                ),
            }
        }
        Ok(instances)
    }
}

async fn keepalive_loop(shared: Weak<Shared>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if shared.closed.load(Ordering::SeqCst) {
            break;
        }

        let held = *shared.session.read();
        let Some(session) = held else {
            // lost; start() spawns a fresh keepalive
            break;
        };

        if let Err(err) = shared.coordinator.ping(session).await {
            warn!(session, error = %err, "registry keepalive failed");
            if let Err(err) = shared.recover(session).await {
                warn!(error = %err, "registry session lost");
                break;
            }
        }
    }
}

enum Wake {
    Event(Option<RecvError>),
    State(bool),
    Retry,
}

/// Deliver a fresh listing of `service` whenever it may have changed
///
/// A refresh that fails leaves the loop dirty: it retries on a backoff timer
/// and on the next reconnect until one listing succeeds. Entering
/// `Connected` or `Reconnected` re-arms the child watch first, since changes
/// made while the session was down produced no event we could see.
async fn watch_loop<F>(
    client: Weak<Shared>,
    service: String,
    path: String,
    mut events: broadcast::Receiver<ChildEvent>,
    mut state_rx: watch::Receiver<SessionState>,
    callback: F,
) where
    F: Fn(&str, Vec<ServiceInfo>) + Send + Sync + 'static,
{
    let mut subscribed = true;
    let mut dirty = false;
    let mut failures: u32 = 0;
    let mut retry_delay = Duration::ZERO;

    loop {
        let wake = tokio::select! {
            event = events.recv(), if subscribed => Wake::Event(event.err()),
            changed = state_rx.changed() => Wake::State(changed.is_ok()),
            _ = tokio::time::sleep(retry_delay), if dirty => Wake::Retry,
        };

        let rearm = match wake {
            Wake::Event(None) | Wake::Event(Some(RecvError::Lagged(_))) => {
                // coalesce whatever else is queued into this refresh
                loop {
                    match events.try_recv() {
                        Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                        Err(_) => break,
                    }
                }
                false
            }
            Wake::Event(Some(RecvError::Closed)) => {
                debug!(service = %service, "watch channel closed, re-arming");
                subscribed = false;
                true
            }
            Wake::State(false) => break,
            Wake::State(true) => {
                let state = *state_rx.borrow_and_update();
                match state {
                    SessionState::Connected | SessionState::Reconnected => true,
                    SessionState::Closed => break,
                    _ => continue,
                }
            }
            Wake::Retry => !subscribed,
        };

        let Some(shared) = client.upgrade() else {
            break;
        };

        if rearm {
            match shared.subscribe_children(&path).await {
                Ok(receiver) => {
                    events = receiver;
                    subscribed = true;
                    debug!(service = %service, "watch re-armed");
                }
                Err(err) => {
                    subscribed = false;
                    dirty = true;
                    retry_delay = shared.settings.backoff_delay(failures);
                    failures = failures.saturating_add(1);
                    warn!(
                        service = %service,
                        error = %err,
                        retry_in_ms = retry_delay.as_millis() as u64,
                        "failed to re-arm watch"
                    );
                    continue;
                }
            }
        }

        match shared.lookup(&service).await {
            Ok(instances) => {
                dirty = false;
                failures = 0;
                callback(&service, instances);
            }
            Err(err) => {
                dirty = true;
                retry_delay = shared.settings.backoff_delay(failures);
                failures = failures.saturating_add(1);
                warn!(
                    service = %service,
                    error = %err,
                    retry_in_ms = retry_delay.as_millis() as u64,
                    "watch refresh failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::InMemoryCoordinator;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn settings() -> RegistrySettings {
        RegistrySettings {
            base_path: "/test_rpc".to_string(),
            base_sleep_ms: 1,
            max_sleep_ms: 5,
            max_retries: 2,
            ..RegistrySettings::default()
        }
    }

    async fn started(coordinator: &Arc<InMemoryCoordinator>) -> RegistryClient {
        let client = RegistryClient::new(settings(), coordinator.clone());
        client.start().await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let coordinator = Arc::new(InMemoryCoordinator::new());
        let client = started(&coordinator).await;
        client.start().await.unwrap();

        assert_eq!(coordinator.connect_attempts(), 1);
        assert_eq!(client.state(), SessionState::Connected);
        assert!(client.session_id().is_some());
    }

    #[tokio::test]
    async fn test_register_lookup_unregister() {
        let coordinator = Arc::new(InMemoryCoordinator::new());
        let client = started(&coordinator).await;

        let first = client
            .register_instance(&ServiceInfo::new("orders", "10.0.0.1", 8080))
            .await
            .unwrap();
        client
            .register_instance(&ServiceInfo::new("orders", "10.0.0.2", 8080))
            .await
            .unwrap();
        assert!(coordinator.exists(&format!("/test_rpc/orders/{}", first)));

        let hosts: Vec<String> = client
            .lookup("orders")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.host)
            .collect();
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2"]);

        assert!(client.unregister_instance(&first).await.unwrap());
        assert!(!client.unregister_instance(&first).await.unwrap());
        assert_eq!(client.lookup("orders").await.unwrap().len(), 1);
        assert!(client.lookup("unknown").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_service_names() {
        let coordinator = Arc::new(InMemoryCoordinator::new());
        let client = started(&coordinator).await;

        assert!(matches!(
            client.lookup("a/b").await,
            Err(DiscoveryError::InvalidInstance { .. })
        ));
        assert!(matches!(
            client.register_instance(&ServiceInfo::new("", "h", 1)).await,
            Err(DiscoveryError::InvalidInstance { .. })
        ));
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_skipped() {
        let coordinator = Arc::new(InMemoryCoordinator::new());
        let client = started(&coordinator).await;
        client
            .register_instance(&ServiceInfo::new("orders", "10.0.0.1", 8080))
            .await
            .unwrap();

        let session = client.session_id().unwrap();
        coordinator
            .create_ephemeral(session, "/test_rpc/orders/garbage", b"not json".to_vec())
            .await
            .unwrap();

        let instances = client.lookup("orders").await.unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].host, "10.0.0.1");
    }

    #[tokio::test]
    async fn test_watch_delivers_and_cancels() {
        let coordinator = Arc::new(InMemoryCoordinator::new());
        let client = started(&coordinator).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = client
            .watch("orders", move |service, instances| {
                let _ = tx.send((service.to_string(), instances.len()));
            })
            .await
            .unwrap();
        assert_eq!(handle.service(), "orders");

        client
            .register_instance(&ServiceInfo::new("orders", "10.0.0.1", 8080))
            .await
            .unwrap();

        let (service, count) = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(service, "orders");
        assert!(count >= 1);

        handle.cancel();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_active());
    }

    #[tokio::test]
    async fn test_watch_relists_after_restart_from_lost() {
        let coordinator = Arc::new(InMemoryCoordinator::new());
        let client = started(&coordinator).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = client
            .watch("orders", move |_, instances| {
                let _ = tx.send(instances.len());
            })
            .await
            .unwrap();
        let subscriptions = coordinator.watch_subscriptions();

        coordinator.set_available(false);
        assert!(client.lookup("orders").await.is_err());
        assert_eq!(client.state(), SessionState::Lost);

        coordinator.set_available(true);
        client.start().await.unwrap();
        assert_eq!(client.state(), SessionState::Connected);

        // no child event happened, the transition alone triggers a listing
        let count = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(coordinator.watch_subscriptions(), subscriptions + 1);
    }

    #[tokio::test]
    async fn test_close_deregisters_and_rejects() {
        let coordinator = Arc::new(InMemoryCoordinator::new());
        let client = started(&coordinator).await;
        let id = client
            .register_instance(&ServiceInfo::new("orders", "10.0.0.1", 8080))
            .await
            .unwrap();

        client.close().await;
        let ops = coordinator.operation_count();
        client.close().await;

        assert_eq!(coordinator.operation_count(), ops);
        assert!(!coordinator.exists(&format!("/test_rpc/orders/{}", id)));
        assert_eq!(coordinator.live_sessions(), 0);
        assert_eq!(client.state(), SessionState::Closed);
        assert!(matches!(
            client.lookup("orders").await,
            Err(DiscoveryError::RegistryUnavailable { .. })
        ));
        assert!(client.start().await.is_err());
    }

    #[tokio::test]
    async fn test_operation_recovers_expired_session() {
        let coordinator = Arc::new(InMemoryCoordinator::new());
        let client = started(&coordinator).await;
        client
            .register_instance(&ServiceInfo::new("orders", "10.0.0.1", 8080))
            .await
            .unwrap();

        let old = client.session_id().unwrap();
        coordinator.expire_session(old);

        // the lookup hits SessionExpired, reconnects and re-registers first
        let instances = client.lookup("orders").await.unwrap();
        assert_eq!(instances.len(), 1);
        assert_ne!(client.session_id(), Some(old));
        assert_eq!(client.state(), SessionState::Reconnected);
    }
}
