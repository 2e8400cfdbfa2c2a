//! Raw GitLab REST access for the setup wizard.
//!
//! Only the two read operations the wizard needs: listing the top-level
//! groups visible to a credential, and counting the projects under one
//! group. Anything heavier (exports, webhooks, mutation) belongs to the
//! agent, not the setup flow.

mod auth;
mod client;
mod error;
mod types;

pub use auth::{DEFAULT_BASE_URL, api_base, auth_header};
pub use client::{GitLabClient, GroupList, ProjectCount};
pub use error::GitLabError;
pub use types::GitLabGroup;
