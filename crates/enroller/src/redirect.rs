//! OAuth redirect decoding.
//!
//! When the host completes the OAuth handshake it redirects back to the
//! wizard with a `profile` query parameter: percent-encoded, base64-
//! encoded JSON of the shape `{"Integration":{"auth":{...}}}`. This
//! module locates the parameter and decodes it into the stored
//! [`OAuth2Auth`] record.
//!
//! The query string is treated as plain `&`-delimited `key=value`
//! pairs, decoded with `decodeURIComponent` semantics. Decode failures
//! are reported, not swallowed: earlier drafts left them uncaught,
//! which stranded the admin on a loading screen with no feedback.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

use crate::config::OAuth2Auth;
use crate::gitlab::DEFAULT_BASE_URL;

/// Snapshot of the shell's redirect state, handed to the wizard on
/// every render.
#[derive(Debug, Clone, Default)]
pub struct RedirectContext {
    /// The shell is still loading; render nothing but a spinner.
    pub loading: bool,
    /// The current page load came back from an OAuth redirect.
    pub is_from_redirect: bool,
    /// The shell is re-authorizing an existing installation.
    pub is_from_re_auth: bool,
    /// The full URL of the current page, query string included.
    pub current_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum RedirectError {
    #[error("profile parameter is not valid percent-encoding: {0}")]
    PercentDecode(#[from] std::string::FromUtf8Error),

    #[error("profile payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("profile payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The decoded `profile` payload.
#[derive(Debug, Deserialize)]
pub struct RedirectProfile {
    #[serde(rename = "Integration")]
    pub integration: ProfileIntegration,
}

#[derive(Debug, Deserialize)]
pub struct ProfileIntegration {
    pub auth: ProfileAuth,
}

/// Token bundle inside the profile payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAuth {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl OAuth2Auth {
    /// Build the stored auth record from a decoded redirect profile.
    ///
    /// Cloud redirects always originate from gitlab.com; the issue
    /// timestamp is stamped here.
    pub fn from_profile(auth: ProfileAuth) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: auth.access_token,
            refresh_token: auth.refresh_token,
            scopes: auth.scopes,
            issued_at: Utc::now().timestamp_millis(),
        }
    }
}

/// Extract and decode the `profile` parameter from a redirect URL.
///
/// Returns `Ok(None)` when the URL carries no query string or no
/// `profile` key.
pub fn extract_profile(current_url: &str) -> Result<Option<RedirectProfile>, RedirectError> {
    let Some((_, query)) = current_url.split_once('?') else {
        return Ok(None);
    };

    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key != "profile" {
            continue;
        }
        let decoded = urlencoding::decode(value)?;
        let raw = BASE64.decode(decoded.as_bytes())?;
        let profile: RedirectProfile = serde_json::from_slice(&raw)?;
        return Ok(Some(profile));
    }

    Ok(None)
}
