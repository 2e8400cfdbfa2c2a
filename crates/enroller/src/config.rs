//! Persisted connector configuration and account records.
//!
//! The host shell owns the configuration blob: it hands the wizard the
//! current value and persists whatever the wizard hands back through
//! [`crate::shell::IntegrationShell::set_configuration`]. Everything
//! here is plain data; the serde shapes match what the platform stores.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation directive understood by the shell's validate callback.
pub const FETCH_ACCOUNTS: &str = "FETCH_ACCOUNTS";

/// Where the connector's GitLab data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrationType {
    /// gitlab.com, authorized through the host's OAuth handshake.
    Cloud,
    /// A self-managed GitLab instance, authorized with an API key.
    SelfManaged,
}

impl fmt::Display for IntegrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationType::Cloud => write!(f, "CLOUD"),
            IntegrationType::SelfManaged => write!(f, "SELF_MANAGED"),
        }
    }
}

/// OAuth2 token bundle captured from the host redirect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth2Auth {
    pub base_url: String,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Epoch milliseconds at which the tokens were captured.
    pub issued_at: i64,
}

/// API-key credential for a self-managed instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyAuth {
    pub base_url: String,
    pub api_key: String,
}

/// A credential authorizing GitLab API access.
///
/// The original structural record discriminated by field presence; here
/// the two arms are an explicit sum type and the discrimination happens
/// exactly once, in [`Configuration::credential`].
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    ApiKey(ApiKeyAuth),
    OAuth2(OAuth2Auth),
}

/// Kind of syncable account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountKind {
    /// A GitLab group. Every account this connector fetches is an org.
    Org,
    /// Kept so blobs persisted by the older namespace-based fetch still
    /// deserialize.
    User,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountKind::Org => write!(f, "ORG"),
            AccountKind::User => write!(f, "USER"),
        }
    }
}

/// A syncable unit: a GitLab group, as surfaced to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Stable identifier, coerced from GitLab's numeric group id.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    /// Derived from GitLab visibility: "private" maps to false,
    /// everything else to true.
    pub public: bool,
    /// Number of projects under the group, fetched lazily per account.
    #[serde(default)]
    pub total_count: u64,
}

/// The persisted per-installation record owned by the host shell.
///
/// Exactly one of `oauth2_auth` / `apikey_auth` is populated once
/// authorization completes, consistent with `integration_type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_type: Option<IntegrationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth2_auth: Option<OAuth2Auth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apikey_auth: Option<ApiKeyAuth>,
    /// Account selections keyed by account id. `None` until the first
    /// successful fetch; a present-but-empty map still counts as
    /// "has accounts".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts: Option<BTreeMap<String, Account>>,
    /// Transient directive for the validate callback, e.g.
    /// [`FETCH_ACCOUNTS`]. Cleared before the blob is persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl Configuration {
    /// Resolve the active credential. The API key wins when both auth
    /// records are present, matching the order the agent resolves them.
    pub fn credential(&self) -> Option<Credential> {
        if let Some(apikey) = &self.apikey_auth {
            return Some(Credential::ApiKey(apikey.clone()));
        }
        self.oauth2_auth.clone().map(Credential::OAuth2)
    }

    /// Whether the configuration already carries an accounts map.
    pub fn has_accounts(&self) -> bool {
        self.accounts.is_some()
    }

    /// The stored accounts in map order.
    pub fn account_list(&self) -> Vec<Account> {
        self.accounts
            .as_ref()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str) -> Account {
        Account {
            id: id.to_string(),
            name: format!("group-{id}"),
            description: None,
            avatar_url: None,
            kind: AccountKind::Org,
            public: true,
            total_count: 0,
        }
    }

    #[test]
    fn test_integration_type_wire_strings() {
        assert_eq!(
            serde_json::to_string(&IntegrationType::Cloud).unwrap(),
            "\"CLOUD\""
        );
        assert_eq!(
            serde_json::to_string(&IntegrationType::SelfManaged).unwrap(),
            "\"SELF_MANAGED\""
        );

        let parsed: IntegrationType = serde_json::from_str("\"SELF_MANAGED\"").unwrap();
        assert_eq!(parsed, IntegrationType::SelfManaged);
    }

    #[test]
    fn test_account_wire_casing() {
        let json = r#"{
            "id": "42",
            "name": "platform",
            "description": "Platform team",
            "avatarUrl": "https://gitlab.com/uploads/platform.png",
            "type": "ORG",
            "public": false,
            "totalCount": 7
        }"#;

        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.id, "42");
        assert_eq!(account.kind, AccountKind::Org);
        assert_eq!(account.total_count, 7);
        assert!(!account.public);

        let out = serde_json::to_value(&account).unwrap();
        assert_eq!(out["type"], "ORG");
        assert_eq!(out["totalCount"], 7);
        assert_eq!(out["avatarUrl"], "https://gitlab.com/uploads/platform.png");
    }

    #[test]
    fn test_account_total_count_defaults_to_zero() {
        let json = r#"{"id": "1", "name": "g", "type": "ORG", "public": true}"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.total_count, 0);
        assert!(account.description.is_none());
    }

    #[test]
    fn test_user_kind_still_deserializes() {
        let json = r#"{"id": "9", "name": "someone", "type": "USER", "public": true}"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.kind, AccountKind::User);
    }

    #[test]
    fn test_credential_prefers_api_key() {
        let config = Configuration {
            apikey_auth: Some(ApiKeyAuth {
                base_url: "https://gitlab.example.com".into(),
                api_key: "key".into(),
            }),
            oauth2_auth: Some(OAuth2Auth {
                base_url: "https://gitlab.com".into(),
                access_token: "token".into(),
                refresh_token: "refresh".into(),
                scopes: vec!["api".into()],
                issued_at: 0,
            }),
            ..Default::default()
        };

        assert!(matches!(config.credential(), Some(Credential::ApiKey(_))));
    }

    #[test]
    fn test_credential_none_without_auth() {
        assert!(Configuration::default().credential().is_none());
    }

    #[test]
    fn test_has_accounts_counts_empty_map() {
        let mut config = Configuration::default();
        assert!(!config.has_accounts());

        config.accounts = Some(BTreeMap::new());
        assert!(config.has_accounts());
        assert!(config.account_list().is_empty());
    }

    #[test]
    fn test_account_list_preserves_map_order() {
        let mut map = BTreeMap::new();
        map.insert("2".to_string(), account("2"));
        map.insert("1".to_string(), account("1"));

        let config = Configuration {
            accounts: Some(map),
            ..Default::default()
        };

        let list = config.account_list();
        let ids: Vec<&str> = list.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_transient_action_is_not_serialized_when_absent() {
        let config = Configuration::default();
        let out = serde_json::to_value(&config).unwrap();
        assert_eq!(out, serde_json::json!({}));
    }

    #[test]
    fn test_configuration_round_trip() {
        let mut accounts = BTreeMap::new();
        accounts.insert("5".to_string(), account("5"));

        let config = Configuration {
            integration_type: Some(IntegrationType::Cloud),
            oauth2_auth: Some(OAuth2Auth {
                base_url: "https://gitlab.com".into(),
                access_token: "a".into(),
                refresh_token: "b".into(),
                scopes: vec!["c".into()],
                issued_at: 1_700_000_000_000,
            }),
            apikey_auth: None,
            accounts: Some(accounts),
            action: None,
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: Configuration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
