use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use shared::protocol::{Command, ServerResponse};
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{debug, warn};
use url::Url;

use crate::transport::{Transport, TransportEvent};

/// Fixed delay between a lost connection and the next attempt. No
/// backoff, no attempt cap.
pub const RETRY_DELAY: Duration = Duration::from_secs(3);

/// The manager's belief about transport availability. `Connecting`
/// counts as disconnected for gating purposes until the open event
/// fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// What the front end renders: a status line plus the single flag
/// that drives the style toggle and control enablement. `connected`
/// is derived from [`ConnectionState`] alone, so the displayed state
/// can never drift out of lockstep with the state machine.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub message: String,
    pub connected: bool,
}

struct ManagerInner {
    state: ConnectionState,
    /// Bumped for every new link and on close. Events carrying a
    /// stale epoch come from a superseded socket and are ignored.
    epoch: u64,
    outbound: Option<mpsc::UnboundedSender<String>>,
    retry: Option<JoinHandle<()>>,
}

/// Owns the single replaceable transport handle and keeps
/// [`ConnectionState`] consistent with what the transport reports.
///
/// All failures terminate at the status broadcast; nothing here
/// returns an error the caller must handle.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    endpoint: Url,
    inner: Mutex<ManagerInner>,
    updates: broadcast::Sender<StatusUpdate>,
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn Transport>, endpoint: Url) -> Arc<Self> {
        let (updates, _) = broadcast::channel(64);
        Arc::new(Self {
            transport,
            endpoint,
            inner: Mutex::new(ManagerInner {
                state: ConnectionState::Disconnected,
                epoch: 0,
                outbound: None,
                retry: None,
            }),
            updates,
        })
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<StatusUpdate> {
        self.updates.subscribe()
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.lock().await.state
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.state == ConnectionState::Connected
    }

    /// Start a new link unless one is already being attempted or is
    /// open. Cancels any pending retry timer first, so there is at
    /// most one outstanding timer at any moment. A construction
    /// failure is surfaced and not retried.
    ///
    /// Desugared to return a boxed future because the retry task
    /// awaits `connect` again, and recursive async fns cannot be
    /// expressed with an opaque return type.
    pub fn connect(self: &Arc<Self>) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let mut inner = self.inner.lock().await;
            if inner.state != ConnectionState::Disconnected {
                return;
            }
            if let Some(pending) = inner.retry.take() {
                pending.abort();
            }

            debug!(endpoint = %self.endpoint, "connecting");
            let handle = match self.transport.open(&self.endpoint) {
                Ok(handle) => handle,
                Err(error) => {
                    warn!(%error, "failed to construct transport");
                    self.publish(&inner, "Failed to connect to server");
                    return;
                }
            };

            inner.epoch += 1;
            inner.state = ConnectionState::Connecting;
            inner.outbound = Some(handle.outbound);

            let epoch = inner.epoch;
            let manager = Arc::clone(self);
            let mut events = handle.events;
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    manager.apply(epoch, event).await;
                }
            });
        })
    }

    /// Close the current link, if any. The transport then runs its
    /// normal close path, which reports Disconnected and schedules a
    /// retry.
    pub async fn disconnect(&self) {
        let mut inner = self.inner.lock().await;
        if inner.outbound.take().is_some() {
            debug!("closing current link");
        }
    }

    /// The hosting surface regained focus. While disconnected this
    /// connects immediately instead of waiting out the retry timer;
    /// otherwise it has no effect.
    pub async fn notify_focus(self: &Arc<Self>) {
        self.connect().await;
    }

    /// Transmit a command, or drop it with a status report. Commands
    /// are never buffered for later delivery.
    pub async fn send(&self, command: &Command) {
        let inner = self.inner.lock().await;
        if inner.state != ConnectionState::Connected {
            self.publish(&inner, "Not connected");
            return;
        }

        let frame = match serde_json::to_string(command) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(%error, action = %command.action, "failed to encode command");
                self.publish(&inner, "Failed to send command");
                return;
            }
        };
        let delivered = inner
            .outbound
            .as_ref()
            .map(|link| link.send(frame).is_ok())
            .unwrap_or(false);
        if !delivered {
            warn!(action = %command.action, "link rejected outbound command");
            self.publish(&inner, "Failed to send command");
        }
    }

    /// Publish a status line carrying the current connected flag.
    /// Used by the dispatcher for input-validation messages.
    pub(crate) async fn report(&self, message: &str) {
        let inner = self.inner.lock().await;
        self.publish(&inner, message);
    }

    /// The single transition function for transport events.
    async fn apply(self: &Arc<Self>, epoch: u64, event: TransportEvent) {
        let mut inner = self.inner.lock().await;
        if epoch != inner.epoch {
            debug!(epoch, current = inner.epoch, "ignoring event from superseded link");
            return;
        }

        match event {
            TransportEvent::Opened => {
                inner.state = ConnectionState::Connected;
                self.publish(&inner, "Connected");
            }
            TransportEvent::Closed => {
                inner.state = ConnectionState::Disconnected;
                inner.outbound = None;
                // Anything further from this link is stale, so one
                // socket can schedule at most one retry.
                inner.epoch += 1;
                self.publish(&inner, "Disconnected");

                let manager = Arc::clone(self);
                inner.retry = Some(tokio::spawn(async move {
                    tokio::time::sleep(RETRY_DELAY).await;
                    manager.inner.lock().await.retry = None;
                    manager.connect().await;
                }));
            }
            TransportEvent::Errored(error) => {
                // The close event that follows performs the actual
                // state transition.
                warn!(%error, "transport error");
                self.publish(&inner, "Connection error");
            }
            TransportEvent::Message(raw) => match serde_json::from_str::<ServerResponse>(&raw) {
                Ok(response) => {
                    if let Some(error) = response.error.filter(|error| !error.is_empty()) {
                        self.publish(&inner, &format!("Error: {error}"));
                    }
                }
                Err(error) => {
                    debug!(%error, "discarding undecodable server frame");
                }
            },
        }
    }

    fn publish(&self, inner: &ManagerInner, message: &str) {
        let _ = self.updates.send(StatusUpdate {
            message: message.to_string(),
            connected: inner.state == ConnectionState::Connected,
        });
    }
}

#[cfg(test)]
#[path = "tests/connection_tests.rs"]
mod tests;
