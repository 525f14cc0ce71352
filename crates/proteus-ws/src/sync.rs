//! The per-connection sync session.
//!
//! [`run_sync_session`] owns one upgraded connection from registration to
//! teardown. It splits the stream, spawns a writer task that drains the
//! connection's outbound queue, and runs the read loop on the caller's
//! task. Inbound text frames carry [`SyncMessage`] assignments; anything
//! that fails to parse, and any assignment to an undeclared field, is
//! dropped without a reply.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use proteus_state::SharedState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info};

use crate::connection::{ConnectionHandle, ConnectionId, DEFAULT_SEND_QUEUE};
use crate::message::Message;
use crate::registry::Registry;

/// An inbound state assignment from a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncMessage {
    /// The state field to assign.
    pub key: String,
    /// The new raw value.
    pub value: Value,
}

/// Observer invoked with every inbound frame before it is interpreted.
pub type FrameHook = Arc<dyn Fn(&Message) + Send + Sync>;

/// Drive one streaming connection until it closes.
///
/// Registers the connection, forwards queued broadcasts to the peer, and
/// applies inbound [`SyncMessage`] frames to the shared state. Returns
/// once the peer closes or the transport fails; the connection is always
/// unregistered before returning.
pub async fn run_sync_session<S>(
    stream: WebSocketStream<S>,
    state: SharedState,
    registry: Arc<Registry>,
    on_frame: Option<FrameHook>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let id = ConnectionId::new();
    let (handle, mut queue) = ConnectionHandle::channel(id, DEFAULT_SEND_QUEUE);
    let (mut write, mut read) = stream.split();

    registry.add(handle.clone());
    info!(connection_id = %id, "sync session started");

    // Writer task: drain the outbound queue onto the wire. Ends when every
    // handle for this connection has been dropped.
    let writer = tokio::spawn(async move {
        while let Some(message) = queue.recv().await {
            if write.send(message.into()).await.is_err() {
                break;
            }
        }
        let _ = write.close().await;
    });

    while let Some(frame) = read.next().await {
        let raw = match frame {
            Ok(raw) => raw,
            Err(e) => {
                debug!(connection_id = %id, error = %e, "read failed, ending session");
                break;
            }
        };

        let message = Message::from(raw);
        if let Some(hook) = &on_frame {
            hook(&message);
        }

        match message {
            Message::Text(text) => handle_text(&state, id, &text),
            Message::Close(_) => {
                debug!(connection_id = %id, "peer closed connection");
                break;
            }
            // Pings are answered by the transport; pongs and binary
            // frames carry nothing the protocol understands.
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    registry.remove(&id);
    drop(handle);
    let _ = writer.await;
    info!(connection_id = %id, "sync session ended");
}

/// Interpret one inbound text frame. Malformed payloads are dropped with
/// a debug log and no reply.
fn handle_text(state: &SharedState, id: ConnectionId, text: &str) {
    match serde_json::from_str::<SyncMessage>(text) {
        Ok(sync) => {
            // An unknown key is logged and dropped inside assign.
            state.assign(&sync.key, sync.value);
        }
        Err(e) => {
            debug!(connection_id = %id, error = %e, "dropping malformed sync frame");
        }
    }
}
