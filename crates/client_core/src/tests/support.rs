use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex as StdMutex,
};

use tokio::sync::mpsc;
use url::Url;

use crate::{
    error::TransportError,
    transport::{Transport, TransportEvent, TransportHandle},
};

/// One link handed out by [`FakeTransport`]. Tests drive the
/// manager by emitting events and inspect what it transmitted by
/// taking the outbound receiver.
pub(crate) struct FakeLink {
    events: mpsc::UnboundedSender<TransportEvent>,
    outbound: StdMutex<Option<mpsc::UnboundedReceiver<String>>>,
}

impl FakeLink {
    pub(crate) fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }

    pub(crate) fn take_outbound(&self) -> mpsc::UnboundedReceiver<String> {
        self.outbound
            .lock()
            .expect("outbound lock")
            .take()
            .expect("outbound already taken")
    }
}

/// In-memory transport. Construction either always succeeds,
/// recording a [`FakeLink`] per attempt, or always fails to model a
/// broken endpoint.
pub(crate) struct FakeTransport {
    links: StdMutex<Vec<Arc<FakeLink>>>,
    attempts: AtomicUsize,
    fail_open: bool,
}

impl FakeTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            links: StdMutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            fail_open: false,
        })
    }

    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            links: StdMutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            fail_open: true,
        })
    }

    /// Total `open` calls, including failed ones.
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn link(&self, index: usize) -> Arc<FakeLink> {
        Arc::clone(&self.links.lock().expect("links lock")[index])
    }
}

impl Transport for FakeTransport {
    fn open(&self, endpoint: &Url) -> Result<TransportHandle, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(TransportError::InvalidEndpoint(endpoint.to_string()));
        }
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.links.lock().expect("links lock").push(Arc::new(FakeLink {
            events: event_tx,
            outbound: StdMutex::new(Some(outbound_rx)),
        }));
        Ok(TransportHandle {
            outbound: outbound_tx,
            events: event_rx,
        })
    }
}

pub(crate) fn test_endpoint() -> Url {
    Url::parse("ws://localhost:8080/ws").expect("test endpoint")
}

/// Let every queued task run. Enough for the emit → pump → apply →
/// broadcast chain on a current-thread runtime.
pub(crate) async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
