//! WebSocket HTTP upgrade handling.
//!
//! Validates RFC 6455 upgrade requests and builds the `101 Switching
//! Protocols` response. The server sends the response, waits for hyper to
//! hand over the raw connection, then calls [`complete_upgrade`] to wrap
//! it in a WebSocket stream.

use base64::Engine;
use bytes::Bytes;
use http::{header, Request, Response, StatusCode};
use http_body_util::Full;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tracing::debug;

use crate::error::{WsError, WsResult};

/// The WebSocket magic GUID used in the handshake.
const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Check if a request is a WebSocket upgrade request.
///
/// A valid upgrade request must carry `Connection: Upgrade`,
/// `Upgrade: websocket`, a `Sec-WebSocket-Key`, and
/// `Sec-WebSocket-Version: 13`.
pub fn is_websocket_request<B>(request: &Request<B>) -> bool {
    has_upgrade_header(request)
        && has_websocket_upgrade(request)
        && has_websocket_key(request)
        && has_websocket_version(request)
}

fn has_upgrade_header<B>(request: &Request<B>) -> bool {
    request
        .headers()
        .get(header::CONNECTION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_lowercase().contains("upgrade"))
}

fn has_websocket_upgrade<B>(request: &Request<B>) -> bool {
    request
        .headers()
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

fn has_websocket_key<B>(request: &Request<B>) -> bool {
    request
        .headers()
        .get("sec-websocket-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.is_empty())
}

fn has_websocket_version<B>(request: &Request<B>) -> bool {
    request
        .headers()
        .get("sec-websocket-version")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "13")
}

fn get_websocket_key<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get("sec-websocket-key")
        .and_then(|v| v.to_str().ok())
}

/// Compute the Sec-WebSocket-Accept value from the key.
fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    let result = hasher.finalize();
    base64::engine::general_purpose::STANDARD.encode(result)
}

fn upgrade_response(accept_key: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::SWITCHING_PROTOCOLS)
        .header(header::CONNECTION, "Upgrade")
        .header(header::UPGRADE, "websocket")
        .header("Sec-WebSocket-Accept", accept_key)
        .body(Full::new(Bytes::new()))
        .expect("static upgrade response")
}

fn bad_request_response(reason: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from(reason.to_string())))
        .expect("static bad request response")
}

/// Outcome of preparing a WebSocket upgrade.
pub struct WebSocketUpgrade {
    /// The response to send to the client.
    pub response: Response<Full<Bytes>>,
    /// Whether the upgrade handshake was accepted.
    pub accepted: bool,
}

/// Validate a WebSocket upgrade request.
///
/// # Errors
///
/// Returns [`WsError::NotWebSocketRequest`] describing the first failing
/// handshake requirement; on success returns the accept key.
pub fn validate_upgrade_request<B>(request: &Request<B>) -> WsResult<String> {
    if !has_upgrade_header(request) {
        return Err(WsError::not_websocket("missing Connection: Upgrade header"));
    }

    if !has_websocket_upgrade(request) {
        return Err(WsError::not_websocket("missing Upgrade: websocket header"));
    }

    let key = get_websocket_key(request)
        .ok_or_else(|| WsError::not_websocket("missing Sec-WebSocket-Key header"))?;

    if !has_websocket_version(request) {
        return Err(WsError::not_websocket(
            "missing or invalid Sec-WebSocket-Version header (must be 13)",
        ));
    }

    Ok(compute_accept_key(key))
}

/// Prepare a WebSocket upgrade.
///
/// Validates the request and builds either the `101` handshake response or
/// a `400` rejection. A successful handshake must be completed with
/// [`complete_upgrade`] once the underlying IO is available.
#[must_use]
pub fn prepare_upgrade<B>(request: &Request<B>) -> WebSocketUpgrade {
    match validate_upgrade_request(request) {
        Ok(accept_key) => WebSocketUpgrade {
            response: upgrade_response(&accept_key),
            accepted: true,
        },
        Err(e) => {
            debug!("WebSocket upgrade validation failed: {}", e);
            WebSocketUpgrade {
                response: bad_request_response(&e.to_string()),
                accepted: false,
            }
        }
    }
}

/// Complete a WebSocket upgrade over the raw IO stream.
///
/// Must be called after the `101` response has been sent.
pub async fn complete_upgrade<S>(stream: S) -> WebSocketStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    WebSocketStream::from_raw_socket(stream, tungstenite::protocol::Role::Server, None).await
}
