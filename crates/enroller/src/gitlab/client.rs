//! GitLab API client for the two reads the wizard performs.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::auth::{api_base, auth_header};
use super::error::GitLabError;
use super::types::GitLabGroup;
use crate::config::Credential;
use crate::http::{HttpTransport, ReqwestTransport};

/// Request timeout; the only timeout policy is the transport's own.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a group listing: the upstream status and the decoded
/// groups, empty on any non-200 status.
#[derive(Debug, Clone)]
pub struct GroupList {
    pub status: u16,
    pub groups: Vec<GitLabGroup>,
}

/// Result of a project count: the upstream status and the count, zero
/// on any non-200 status.
#[derive(Debug, Clone, Copy)]
pub struct ProjectCount {
    pub status: u16,
    pub count: u64,
}

/// Minimal GitLab REST client.
#[derive(Clone)]
pub struct GitLabClient {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
    authorization: String,
}

impl GitLabClient {
    /// Create a client for a credential over the reqwest transport.
    pub fn new(credential: &Credential) -> Result<Self, GitLabError> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)
            .map_err(|e| GitLabError::Http(e.to_string()))?;
        Ok(Self::with_transport(credential, Arc::new(transport)))
    }

    /// Create a client over an explicit transport.
    pub fn with_transport(credential: &Credential, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            api_base: api_base(credential),
            authorization: auth_header(credential),
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), "enroller".to_string()),
            ("Authorization".to_string(), self.authorization.clone()),
        ]
    }

    /// List the top-level groups visible to the credential.
    ///
    /// Any non-200 status degrades to an empty list with the status
    /// attached for the caller to branch on. Does not retry.
    // TODO: follow the page/per_page pagination params; only the first
    // page of groups is fetched today.
    pub async fn list_groups(&self) -> Result<GroupList, GitLabError> {
        let url = format!("{}/groups?top_level_only=true", self.api_base);
        debug!(%url, "listing groups");

        let response = self.transport.get(&url, &self.headers()).await?;
        if response.status != 200 {
            warn!(
                status = response.status,
                "group list returned non-200; treating as zero groups"
            );
            return Ok(GroupList {
                status: response.status,
                groups: Vec::new(),
            });
        }

        let groups: Vec<GitLabGroup> = serde_json::from_slice(&response.body)?;
        Ok(GroupList {
            status: 200,
            groups,
        })
    }

    /// Count the projects directly under a group, excluding shared
    /// projects.
    ///
    /// Any non-200 status yields a zero count with the status attached
    /// for the caller to log.
    pub async fn count_projects(&self, group_id: &str) -> Result<ProjectCount, GitLabError> {
        let url = format!(
            "{}/groups/{}/projects?with_shared=false",
            self.api_base, group_id
        );
        debug!(%url, "counting projects");

        let response = self.transport.get(&url, &self.headers()).await?;
        if response.status != 200 {
            return Ok(ProjectCount {
                status: response.status,
                count: 0,
            });
        }

        let projects: Vec<serde_json::Value> = serde_json::from_slice(&response.body)?;
        Ok(ProjectCount {
            status: 200,
            count: projects.len() as u64,
        })
    }
}
