//! Registry session state and connection establishment

use crate::coordinator::{Coordinator, SessionId};
use crate::error::{CoordinatorError, DiscoveryError, Result};
use rpc_config::RegistrySettings;
use std::fmt;
use tracing::{debug, warn};

/// Lifecycle of the registry session
///
/// `Latent` until the first connect succeeds. A failed keepalive moves the
/// session to `Suspended` while a reconnect runs; that ends in `Reconnected`
/// or, once the retry budget is spent, `Lost`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Latent,
    Connected,
    Suspended,
    Reconnected,
    Lost,
    Closed,
}

impl SessionState {
    /// A session is held (possibly while a reconnect is in flight)
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            SessionState::Connected | SessionState::Reconnected | SessionState::Suspended
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Latent => "latent",
            SessionState::Connected => "connected",
            SessionState::Suspended => "suspended",
            SessionState::Reconnected => "reconnected",
            SessionState::Lost => "lost",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Open a session, retrying with exponential backoff
///
/// Makes at most `max_retries + 1` attempts, each bounded by the connect
/// timeout, sleeping `backoff_delay(attempt)` between them.
pub(crate) async fn establish(
    settings: &RegistrySettings,
    coordinator: &dyn Coordinator,
) -> Result<SessionId> {
    let attempts = settings.max_retries.saturating_add(1);
    let mut last_error = String::new();

    for attempt in 0..attempts {
        let connect = coordinator.connect(&settings.address, settings.session_timeout());
        let outcome = match tokio::time::timeout(settings.connect_timeout(), connect).await {
            Ok(result) => result,
            Err(_) => Err(CoordinatorError::Timeout {
                timeout_ms: settings.connect_timeout_ms,
            }),
        };

        match outcome {
            Ok(session) => {
                debug!(session, attempt, address = %settings.address, "registry session established");
                return Ok(session);
            }
            Err(err) => {
                warn!(
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    address = %settings.address,
                    error = %err,
                    "registry connect attempt failed"
                );
                last_error = err.to_string();
            }
        }

        if attempt + 1 < attempts {
            tokio::time::sleep(settings.backoff_delay(attempt)).await;
        }
    }

    Err(DiscoveryError::registry_unavailable(
        format!("could not connect to {}: {}", settings.address, last_error),
        attempts,
    ))
}
