//! Server half of the WebSocket opening handshake
//!
//! The HTTP router reads the upgrade request itself, so the `101` answer is
//! produced here and the socket is then handed to the WebSocket layer.

use bytes::Bytes;
use http::header::{CONNECTION, SEC_WEBSOCKET_ACCEPT, SEC_WEBSOCKET_KEY, SEC_WEBSOCKET_VERSION, UPGRADE};
use http::{HeaderMap, Method, Request, Response, StatusCode};
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;

fn header_has_token(headers: &HeaderMap, name: http::header::HeaderName, token: &str) -> bool {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|part| part.trim().eq_ignore_ascii_case(token))
}

/// Whether the request asks to switch this connection to WebSocket
pub fn is_upgrade_request<B>(request: &Request<B>) -> bool {
    request.method() == Method::GET
        && header_has_token(request.headers(), CONNECTION, "upgrade")
        && header_has_token(request.headers(), UPGRADE, "websocket")
}

/// Builds the `101 Switching Protocols` answer, or a `400` if the request is unusable
pub fn upgrade_response<B>(request: &Request<B>) -> std::result::Result<Response<Bytes>, String> {
    let version = request
        .headers()
        .get(SEC_WEBSOCKET_VERSION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if version.trim() != "13" {
        return Err(format!("unsupported Sec-WebSocket-Version {version:?}"));
    }

    let key = request
        .headers()
        .get(SEC_WEBSOCKET_KEY)
        .ok_or_else(|| "missing Sec-WebSocket-Key".to_string())?;

    Response::builder()
        .status(StatusCode::SWITCHING_PROTOCOLS)
        .header(CONNECTION, "Upgrade")
        .header(UPGRADE, "websocket")
        .header(SEC_WEBSOCKET_ACCEPT, derive_accept_key(key.as_bytes()))
        .body(Bytes::new())
        .map_err(|e| e.to_string())
}
