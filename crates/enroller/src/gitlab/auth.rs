//! Authorization header and base-URL resolution.

use crate::config::Credential;

/// Base URL used when a credential does not carry one.
pub const DEFAULT_BASE_URL: &str = "https://gitlab.com";

/// Build the `Authorization` header value for a credential.
///
/// GitLab accepts the lowercase `bearer` scheme for both personal
/// access tokens and OAuth2 access tokens.
pub fn auth_header(credential: &Credential) -> String {
    match credential {
        Credential::ApiKey(auth) => format!("bearer {}", auth.api_key),
        Credential::OAuth2(auth) => format!("bearer {}", auth.access_token),
    }
}

/// Resolve the `/api/v4` root for a credential.
pub fn api_base(credential: &Credential) -> String {
    let base = match credential {
        Credential::ApiKey(auth) => auth.base_url.as_str(),
        Credential::OAuth2(auth) => auth.base_url.as_str(),
    };
    let base = if base.is_empty() { DEFAULT_BASE_URL } else { base };
    format!("{}/api/v4", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKeyAuth, OAuth2Auth};

    fn api_key_credential(base_url: &str) -> Credential {
        Credential::ApiKey(ApiKeyAuth {
            base_url: base_url.to_string(),
            api_key: "glpat-abc123".to_string(),
        })
    }

    fn oauth_credential() -> Credential {
        Credential::OAuth2(OAuth2Auth {
            base_url: "https://gitlab.com".to_string(),
            access_token: "oauth-token".to_string(),
            refresh_token: "refresh".to_string(),
            scopes: vec!["api".to_string()],
            issued_at: 0,
        })
    }

    #[test]
    fn test_auth_header_selects_api_key() {
        assert_eq!(
            auth_header(&api_key_credential("https://gitlab.example.com")),
            "bearer glpat-abc123"
        );
    }

    #[test]
    fn test_auth_header_selects_access_token() {
        assert_eq!(auth_header(&oauth_credential()), "bearer oauth-token");
    }

    #[test]
    fn test_auth_header_is_deterministic() {
        let credential = oauth_credential();
        assert_eq!(auth_header(&credential), auth_header(&credential));
    }

    #[test]
    fn test_api_base_joins_v4() {
        assert_eq!(
            api_base(&api_key_credential("https://gitlab.example.com")),
            "https://gitlab.example.com/api/v4"
        );
    }

    #[test]
    fn test_api_base_strips_trailing_slash() {
        assert_eq!(
            api_base(&api_key_credential("https://gitlab.example.com/")),
            "https://gitlab.example.com/api/v4"
        );
    }

    #[test]
    fn test_api_base_defaults_to_cloud() {
        assert_eq!(api_base(&api_key_credential("")), "https://gitlab.com/api/v4");
    }
}
