use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::error::TransportError;

/// Discrete lifecycle events a link emits, in the order the transport
/// layer produces them: `Opened` precedes any `Message`, `Closed` is
/// terminal for the handle that emitted it.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Opened,
    Closed,
    Errored(String),
    Message(String),
}

/// One link attempt. Text frames pushed into `outbound` go to the
/// server once the link is open; dropping `outbound` closes the link,
/// which ends with the usual `Closed` event.
pub struct TransportHandle {
    pub outbound: mpsc::UnboundedSender<String>,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Produces link attempts. Construction failures are synchronous and
/// final; everything that happens after construction arrives as
/// [`TransportEvent`]s.
pub trait Transport: Send + Sync {
    fn open(&self, endpoint: &Url) -> Result<TransportHandle, TransportError>;
}

/// Derive the WebSocket endpoint from the server's web origin:
/// `http` becomes `ws`, `https` becomes `wss`, and the path is fixed
/// to `/ws`. `ws`/`wss` origins pass through unchanged.
pub fn endpoint_from_origin(origin: &Url) -> Result<Url, TransportError> {
    let scheme = match origin.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(TransportError::UnsupportedScheme(other.to_string())),
    };
    let mut endpoint = origin.clone();
    endpoint
        .set_scheme(scheme)
        .map_err(|_| TransportError::InvalidEndpoint(origin.to_string()))?;
    endpoint.set_path("/ws");
    endpoint.set_query(None);
    endpoint.set_fragment(None);
    Ok(endpoint)
}

/// tokio-tungstenite transport. `open` validates the endpoint and
/// spawns the handshake; handshake failures surface as
/// `Errored` followed by `Closed`, like a browser socket that fires
/// its error event and then closes.
pub struct WsTransport;

impl Transport for WsTransport {
    fn open(&self, endpoint: &Url) -> Result<TransportHandle, TransportError> {
        match endpoint.scheme() {
            "ws" | "wss" => {}
            other => return Err(TransportError::UnsupportedScheme(other.to_string())),
        }
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_link(endpoint.clone(), outbound_rx, event_tx));
        Ok(TransportHandle {
            outbound: outbound_tx,
            events: event_rx,
        })
    }
}

async fn run_link(
    endpoint: Url,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let (stream, _) = match connect_async(endpoint.as_str()).await {
        Ok(connected) => connected,
        Err(error) => {
            let _ = events.send(TransportEvent::Errored(error.to_string()));
            let _ = events.send(TransportEvent::Closed);
            return;
        }
    };
    let _ = events.send(TransportEvent::Opened);

    let (mut sink, mut reader) = stream.split();
    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(error) = sink.send(Message::Text(text)).await {
                        let _ = events.send(TransportEvent::Errored(error.to_string()));
                        break;
                    }
                }
                None => {
                    // The manager dropped the handle: close politely.
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            inbound = reader.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(TransportEvent::Message(text));
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    let _ = events.send(TransportEvent::Errored(error.to_string()));
                    break;
                }
            },
        }
    }
    let _ = events.send(TransportEvent::Closed);
}
