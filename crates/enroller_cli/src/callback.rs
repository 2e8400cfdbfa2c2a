//! Local listener for the OAuth redirect.
//!
//! A hosting platform receives the browser redirect itself and
//! re-renders the wizard with `is_from_redirect` set. On a terminal
//! there is no surrounding page, so this module stands up a one-shot
//! HTTP listener, waits for the redirect carrying the `profile`
//! parameter, and hands the full redirect URL back to the caller.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::State, http::Uri, response::Html, routing::get};
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("failed to bind the redirect listener: {0}")]
    Bind(String),

    #[error("timed out waiting for the redirect")]
    Timeout,

    #[error("redirect listener stopped unexpectedly: {0}")]
    Server(String),
}

/// Redirect URI the authorization flow should send the browser to.
pub fn redirect_uri(port: u16) -> String {
    format!("http://127.0.0.1:{}/redirect", port)
}

struct CallbackState {
    tx: Option<oneshot::Sender<String>>,
}

/// Wait for a single redirect on `port` and return its full URL.
pub async fn wait_for_redirect(port: u16, timeout: Duration) -> Result<String, CallbackError> {
    let (tx, rx) = oneshot::channel();
    let state = Arc::new(tokio::sync::Mutex::new(CallbackState { tx: Some(tx) }));

    let app = Router::new()
        .route("/redirect", get(handle_redirect))
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CallbackError::Bind(format!("port {}: {}", port, e)))?;

    tracing::debug!("redirect listener on http://{}/redirect", addr);

    let server = axum::serve(listener, app);

    tokio::select! {
        result = rx => {
            result.map_err(|_| CallbackError::Server("redirect channel closed".into()))
        }
        _ = tokio::time::sleep(timeout) => {
            Err(CallbackError::Timeout)
        }
        result = server => {
            match result {
                Ok(()) => Err(CallbackError::Server("listener shut down".into())),
                Err(e) => Err(CallbackError::Server(e.to_string())),
            }
        }
    }
}

async fn handle_redirect(
    State(state): State<Arc<tokio::sync::Mutex<CallbackState>>>,
    uri: Uri,
) -> Html<&'static str> {
    let full_url = format!("http://127.0.0.1{}", uri);

    let mut state = state.lock().await;
    if let Some(tx) = state.tx.take() {
        let _ = tx.send(full_url);
    }

    Html(RECEIVED_HTML)
}

const RECEIVED_HTML: &str = "<!doctype html><html><body>\
<h3>GitLab connection received.</h3>\
<p>You can close this window and return to the terminal.</p>\
</body></html>";
