//! Account reconciliation.
//!
//! Merges a fresh upstream group fetch with the previously persisted
//! account selections. Before the installation completes, upstream is
//! authoritative and overwrites the persisted map; persisted entries
//! missing upstream are preserved in the result either way, so a
//! transient upstream absence (or a pagination gap) never drops a
//! selection the user already made.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::config::{Account, Configuration};
use crate::gitlab::{GitLabClient, GitLabError};

/// Merge freshly fetched accounts with the persisted selection map.
///
/// Returns the reconciled list: fetched accounts in fetch order,
/// followed by persisted accounts the fetch no longer contains. The map
/// is updated in place only pre-install.
pub fn reconcile(
    fetched: Vec<Account>,
    persisted: &mut BTreeMap<String, Account>,
    installed: bool,
) -> Vec<Account> {
    let mut result: Vec<Account> = Vec::with_capacity(fetched.len() + persisted.len());
    let mut fetched_ids: BTreeSet<String> = BTreeSet::new();

    for mut account in fetched {
        // Carry the previously known project count; the refresh below
        // only overwrites it on success.
        if let Some(existing) = persisted.get(&account.id) {
            account.total_count = existing.total_count;
        }
        fetched_ids.insert(account.id.clone());
        if !installed {
            persisted.insert(account.id.clone(), account.clone());
        }
        result.push(account);
    }

    for (id, account) in persisted.iter() {
        if !fetched_ids.contains(id) {
            result.push(account.clone());
        }
    }

    result
}

/// Refresh the project count on every reconciled account, one group at
/// a time.
///
/// The sequencing is deliberate: counts land in a shared list and the
/// wizard runs on a single event loop, so requests are awaited one by
/// one rather than raced. A failure is isolated to its account: the
/// count keeps its prior value, the failure is logged, and the batch
/// continues.
pub async fn attach_project_counts(
    client: &GitLabClient,
    accounts: &mut [Account],
    persisted: &mut BTreeMap<String, Account>,
) {
    for account in accounts.iter_mut() {
        match client.count_projects(&account.id).await {
            Ok(count) if count.status == 200 => {
                account.total_count = count.count;
                if let Some(stored) = persisted.get_mut(&account.id) {
                    stored.total_count = count.count;
                }
            }
            Ok(count) => {
                warn!(
                    account = %account.id,
                    status = count.status,
                    "project count fetch failed; keeping prior value"
                );
            }
            Err(err) => {
                warn!(
                    account = %account.id,
                    error = %err,
                    "project count fetch errored; keeping prior value"
                );
            }
        }
    }
}

/// Fetch the syncable accounts for a configuration: list the top-level
/// groups, reconcile them with the persisted selections, and refresh
/// the per-group project counts.
///
/// This is the backend of the `FETCH_ACCOUNTS` validation action. A
/// non-200 group listing degrades to zero fetched groups; persisted
/// selections still come back in the result.
pub async fn fetch_accounts(
    client: &GitLabClient,
    config: &mut Configuration,
    installed: bool,
) -> Result<Vec<Account>, GitLabError> {
    let list = client.list_groups().await?;
    if list.status != 200 {
        warn!(status = list.status, "group listing degraded to zero groups");
    }
    let fetched: Vec<Account> = list.groups.into_iter().map(Account::from).collect();

    let mut persisted = config.accounts.take().unwrap_or_default();
    let mut accounts = reconcile(fetched, &mut persisted, installed);
    attach_project_counts(client, &mut accounts, &mut persisted).await;
    config.accounts = Some(persisted);

    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::{AccountKind, ApiKeyAuth, Credential};
    use crate::http::MockTransport;

    const BASE: &str = "https://gitlab.example.com";

    fn account(id: &str, total_count: u64) -> Account {
        Account {
            id: id.to_string(),
            name: format!("group-{id}"),
            description: None,
            avatar_url: None,
            kind: AccountKind::Org,
            public: true,
            total_count,
        }
    }

    fn ids(accounts: &[Account]) -> Vec<&str> {
        accounts.iter().map(|a| a.id.as_str()).collect()
    }

    fn client(transport: &MockTransport) -> GitLabClient {
        let credential = Credential::ApiKey(ApiKeyAuth {
            base_url: BASE.to_string(),
            api_key: "glpat-abc123".to_string(),
        });
        GitLabClient::with_transport(&credential, Arc::new(transport.clone()))
    }

    fn count_url(id: &str) -> String {
        format!("{BASE}/api/v4/groups/{id}/projects?with_shared=false")
    }

    #[test]
    fn pre_install_result_is_the_union_and_the_map_follows_upstream() {
        let mut persisted = BTreeMap::new();
        persisted.insert("2".to_string(), account("2", 9));
        persisted.insert("3".to_string(), account("3", 4));

        let result = reconcile(vec![account("1", 0), account("2", 0)], &mut persisted, false);

        assert_eq!(ids(&result), vec!["1", "2", "3"]);
        assert_eq!(
            persisted.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["1", "2", "3"]
        );
        // The overwritten entry keeps its previously known count until a
        // refresh succeeds.
        assert_eq!(persisted["2"].total_count, 9);
        assert_eq!(result[1].total_count, 9);
    }

    #[test]
    fn installed_result_keeps_every_persisted_id_without_touching_the_map() {
        let mut persisted = BTreeMap::new();
        persisted.insert("3".to_string(), account("3", 4));

        let result = reconcile(vec![account("1", 0), account("2", 0)], &mut persisted, true);

        // New upstream ids are still appended to the list even though
        // the map is left alone.
        assert_eq!(ids(&result), vec!["1", "2", "3"]);
        assert_eq!(
            persisted.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["3"]
        );
    }

    #[test]
    fn empty_fetch_preserves_selections() {
        let mut persisted = BTreeMap::new();
        persisted.insert("5".to_string(), account("5", 2));

        let result = reconcile(Vec::new(), &mut persisted, true);
        assert_eq!(ids(&result), vec!["5"]);
        assert_eq!(result[0].total_count, 2);
    }

    #[tokio::test]
    async fn count_failures_are_isolated_per_account() {
        let transport = MockTransport::new();
        transport.push_response(count_url("1"), 200, br#"[{"id":1},{"id":2}]"#.to_vec());
        transport.push_response(count_url("2"), 404, b"{}".to_vec());
        transport.push_response(count_url("3"), 200, br#"[{"id":9}]"#.to_vec());

        let mut accounts = vec![account("1", 0), account("2", 5), account("3", 0)];
        let mut persisted = BTreeMap::new();
        persisted.insert("2".to_string(), account("2", 5));

        attach_project_counts(&client(&transport), &mut accounts, &mut persisted).await;

        assert_eq!(accounts[0].total_count, 2);
        // The failing account keeps its prior value; the rest populate.
        assert_eq!(accounts[1].total_count, 5);
        assert_eq!(accounts[2].total_count, 1);
        assert_eq!(persisted["2"].total_count, 5);
    }

    #[tokio::test]
    async fn transport_errors_do_not_abort_the_batch() {
        let transport = MockTransport::new();
        // No response registered for "1": the mock errors, which stands
        // in for a connection failure.
        transport.push_response(count_url("2"), 200, br#"[{"id":1}]"#.to_vec());

        let mut accounts = vec![account("1", 0), account("2", 0)];
        let mut persisted = BTreeMap::new();

        attach_project_counts(&client(&transport), &mut accounts, &mut persisted).await;

        assert_eq!(accounts[0].total_count, 0);
        assert_eq!(accounts[1].total_count, 1);
    }

    #[tokio::test]
    async fn fetch_accounts_lists_reconciles_and_counts() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{BASE}/api/v4/groups?top_level_only=true"),
            200,
            br#"[
                {"id": 1, "name": "platform", "visibility": "public"},
                {"id": 2, "name": "infra", "visibility": "private"}
            ]"#
            .to_vec(),
        );
        transport.push_response(count_url("1"), 200, br#"[{"id":1},{"id":2}]"#.to_vec());
        transport.push_response(count_url("2"), 200, b"[]".to_vec());

        let mut config = Configuration::default();
        let accounts = fetch_accounts(&client(&transport), &mut config, false)
            .await
            .expect("fetch accounts");

        assert_eq!(ids(&accounts), vec!["1", "2"]);
        assert_eq!(accounts[0].total_count, 2);
        assert_eq!(accounts[1].total_count, 0);
        assert!(!accounts[1].public);

        let stored = config.accounts.as_ref().expect("accounts map stored");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored["1"].total_count, 2);
    }

    #[tokio::test]
    async fn fetch_accounts_degrades_a_failed_listing_to_persisted_entries() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{BASE}/api/v4/groups?top_level_only=true"),
            500,
            b"{}".to_vec(),
        );
        transport.push_response(count_url("7"), 200, br#"[{"id":1}]"#.to_vec());

        let mut persisted = BTreeMap::new();
        persisted.insert("7".to_string(), account("7", 3));
        let mut config = Configuration {
            accounts: Some(persisted),
            ..Default::default()
        };

        let accounts = fetch_accounts(&client(&transport), &mut config, true)
            .await
            .expect("fetch accounts");

        assert_eq!(ids(&accounts), vec!["7"]);
        assert_eq!(accounts[0].total_count, 1);
    }
}
