//! Local Service Cache
//!
//! One entry per service name, created on first request and kept fresh by a
//! registry watch. Reads never touch the registry once an entry is live.
//!
//! Construction is race-free: the entry is claimed through the DashMap entry
//! API, then a per-entry `OnceCell` makes sure exactly one caller arms the
//! watch and runs the initial lookup while concurrent callers await it. The
//! watch callback looks its entry up by name through a weak handle to the
//! map, so it never outlives the cache or captures a half-built entry.

use crate::error::{DiscoveryError, Result};
use crate::instance::ServiceInfo;
use crate::registry::{validate_service_name, RegistryClient, WatchHandle};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Snapshot {
    instances: Vec<ServiceInfo>,
    /// Construction attempt whose watch may write here
    attempt: u64,
    /// A watch refresh of the current attempt has landed; its initial lookup
    /// must not overwrite it
    refreshed: bool,
}

/// Cached instance list of one service
#[derive(Debug)]
pub struct ServiceCache {
    service: String,
    snapshot: RwLock<Snapshot>,
    watch: OnceCell<WatchHandle>,
}

impl ServiceCache {
    fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            snapshot: RwLock::new(Snapshot::default()),
            watch: OnceCell::new(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Copy of the current instance list
    pub fn instances(&self) -> Vec<ServiceInfo> {
        self.snapshot.read().instances.clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The watch is armed and the first listing has been applied
    pub fn is_initialized(&self) -> bool {
        self.watch.initialized()
    }

    /// Open a new construction attempt, disowning the watches of earlier ones
    fn begin_attempt(&self) -> u64 {
        let mut snapshot = self.snapshot.write();
        snapshot.attempt += 1;
        snapshot.refreshed = false;
        snapshot.attempt
    }

    fn apply_initial(&self, attempt: u64, instances: Vec<ServiceInfo>) {
        let mut snapshot = self.snapshot.write();
        if snapshot.attempt == attempt && !snapshot.refreshed {
            snapshot.instances = instances;
        }
    }

    fn apply_refresh(&self, attempt: u64, instances: Vec<ServiceInfo>) {
        let count = instances.len();
        let changed = {
            let mut snapshot = self.snapshot.write();
            if snapshot.attempt != attempt {
                debug!(service = %self.service, attempt, "dropping refresh from an abandoned watch");
                return;
            }
            snapshot.refreshed = true;
            let changed = snapshot.instances != instances;
            snapshot.instances = instances;
            changed
        };

        if changed {
            info!(service = %self.service, instances = count, "service cache updated");
        } else {
            debug!(service = %self.service, instances = count, "service cache refresh without changes");
        }
    }

    /// Stop watch delivery; the last snapshot stays readable
    pub fn close(&self) {
        if let Some(handle) = self.watch.get() {
            handle.cancel();
        }
    }
}

/// Per-service-name caches backed by one registry client
pub struct LocalServiceCache {
    registry: Arc<RegistryClient>,
    entries: Arc<DashMap<String, Arc<ServiceCache>>>,
    constructed: AtomicUsize,
    state_logger: Mutex<Option<JoinHandle<()>>>,
}

impl LocalServiceCache {
    pub fn new(registry: Arc<RegistryClient>) -> Self {
        Self {
            registry,
            entries: Arc::new(DashMap::new()),
            constructed: AtomicUsize::new(0),
            state_logger: Mutex::new(None),
        }
    }

    /// Snapshot of the instances of `service`, building its entry on first use
    pub async fn get_services(&self, service: &str) -> Result<Vec<ServiceInfo>> {
        Ok(self.entry(service).await?.instances())
    }

    /// Live cache entry for `service`
    pub async fn entry(&self, service: &str) -> Result<Arc<ServiceCache>> {
        // a name the registry would refuse never gets an entry
        validate_service_name(service).map_err(|err| DiscoveryError::cache_construction(service, err))?;

        let entry = self
            .entries
            .entry(service.to_string())
            .or_insert_with(|| {
                self.constructed.fetch_add(1, Ordering::SeqCst);
                Arc::new(ServiceCache::new(service))
            })
            .value()
            .clone();

        if entry.is_initialized() {
            return Ok(entry);
        }

        self.ensure_state_logger();
        entry
            .watch
            .get_or_try_init(|| self.start_entry(&entry))
            .await
            .map_err(|err| DiscoveryError::cache_construction(service, err))?;
        Ok(entry)
    }

    async fn start_entry(&self, entry: &Arc<ServiceCache>) -> Result<WatchHandle> {
        let attempt = entry.begin_attempt();
        let entries = Arc::downgrade(&self.entries);
        let handle = self
            .registry
            .watch(entry.service(), move |service, instances| {
                let Some(entries) = entries.upgrade() else {
                    return;
                };
                let cache = entries.get(service).map(|e| e.value().clone());
                if let Some(cache) = cache {
                    cache.apply_refresh(attempt, instances);
                }
            })
            .await?;

        // dropping the handle on failure disarms the watch
        let initial = self.registry.lookup(entry.service()).await?;
        info!(service = %entry.service(), instances = initial.len(), attempt, "service cache started");
        entry.apply_initial(attempt, initial);
        Ok(handle)
    }

    fn ensure_state_logger(&self) {
        let mut logger = self.state_logger.lock();
        if logger.is_some() {
            return;
        }

        let mut state_rx = self.registry.subscribe_state();
        let entries = Arc::downgrade(&self.entries);
        *logger = Some(tokio::spawn(async move {
            while state_rx.changed().await.is_ok() {
                let state = *state_rx.borrow_and_update();
                let Some(entries) = entries.upgrade() else {
                    break;
                };
                info!(state = %state, cached_services = entries.len(), "service cache saw registry state change");
            }
        }));
    }

    /// Names with a cache entry
    pub fn cached_services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many entries were ever created
    pub fn constructed_count(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }

    /// Cancel every watch and drop all entries
    pub fn close_all(&self) {
        let entries: Vec<Arc<ServiceCache>> = self.entries.iter().map(|e| e.value().clone()).collect();
        self.entries.clear();
        for entry in &entries {
            entry.close();
        }

        if let Some(task) = self.state_logger.lock().take() {
            task.abort();
        }
        debug!(closed = entries.len(), "service caches closed");
    }
}

impl Drop for LocalServiceCache {
    fn drop(&mut self) {
        if let Some(task) = self.state_logger.get_mut().take() {
            task.abort();
        }
    }
}
