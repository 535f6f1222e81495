//! Authenticated WebSocket upgrade.
//!
//! The session token rides in the `Sec-WebSocket-Protocol` header, the one
//! place browser WebSocket clients can smuggle a credential. It is verified
//! *before* the upgrade completes: a missing or invalid token is rejected
//! with 401 and no application-level connection ever exists. The accepted
//! token is echoed back as the negotiated subprotocol, which browsers
//! require.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::server::AppState;
use crate::websocket::session::run_session;

/// Pull the connection credential out of the upgrade request headers.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// GET /ws — token-authenticated WebSocket upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let Some(token) = credential_from_headers(&headers) else {
        warn!("websocket upgrade without credential, rejecting");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    match state.verifier.verify(token) {
        Ok(username) => {
            let router = state.router.clone();
            let capacity = state.config.send_queue_capacity;
            ws.max_message_size(state.config.max_message_size)
                .protocols([token.to_owned()])
                .on_upgrade(move |socket| run_session(socket, username, router, capacity))
        }
        Err(error) => {
            warn!(%error, "websocket upgrade with invalid credential, rejecting");
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_yields_no_credential() {
        let headers = HeaderMap::new();
        assert!(credential_from_headers(&headers).is_none());
    }

    #[test]
    fn empty_header_yields_no_credential() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(
            header::SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(""),
        );
        assert!(credential_from_headers(&headers).is_none());

        let _ = headers.insert(
            header::SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static("   "),
        );
        assert!(credential_from_headers(&headers).is_none());
    }

    #[test]
    fn token_is_extracted_and_trimmed() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(
            header::SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(" abc.def.ghi "),
        );
        assert_eq!(credential_from_headers(&headers), Some("abc.def.ghi"));
    }
}
