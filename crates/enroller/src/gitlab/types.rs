//! GitLab wire types used by the wizard.

use serde::Deserialize;

use crate::config::{Account, AccountKind};

/// A top-level GitLab group, as returned by `GET /api/v4/groups`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabGroup {
    /// Numeric group id; coerced to a string on conversion.
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// "public", "internal", or "private".
    #[serde(default = "default_visibility")]
    pub visibility: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

fn default_visibility() -> String {
    "private".to_string()
}

impl From<GitLabGroup> for Account {
    fn from(group: GitLabGroup) -> Self {
        Account {
            id: group.id.to_string(),
            name: group.name,
            description: group.description,
            avatar_url: group.avatar_url,
            kind: AccountKind::Org,
            public: group.visibility != "private",
            total_count: 0,
        }
    }
}
