use anyhow::{bail, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::JiraConfig;
use crate::providers::Source;
use crate::store::LocalStore;

pub async fn download_all(source: &dyn Source, store: &LocalStore, config: &JiraConfig) -> Result<()> {
    download_users(source, store).await?;
    download_projects(source, store).await?;
    download_issues(source, store, config).await?;
    Ok(())
}

pub async fn download_users(source: &dyn Source, store: &LocalStore) -> Result<usize> {
    let users = source.search_users().await?;
    store.save_users(&users)?;
    info!("{} users downloaded", users.len());
    Ok(users.len())
}

pub async fn download_projects(source: &dyn Source, store: &LocalStore) -> Result<usize> {
    let projects = source.list_projects().await?;
    store.save_projects(&projects)?;
    info!("{} projects downloaded", projects.len());
    Ok(projects.len())
}

pub async fn download_issues(
    source: &dyn Source,
    store: &LocalStore,
    config: &JiraConfig,
) -> Result<usize> {
    let mut issues: Vec<Value> = Vec::new();
    loop {
        let page = source.search_issues(issues.len(), config.page_size).await?;
        let fetched = page.issues.len();
        issues.extend(page.issues);
        info!("downloaded {} / {} issues", issues.len(), page.total);
        if issues.len() >= page.total {
            break;
        }
        if fetched == 0 {
            warn!(
                "jira reported {} issues but returned an empty page at {}",
                page.total,
                issues.len()
            );
            break;
        }
    }

    if config.retrieve_watchers {
        for issue in issues.iter_mut() {
            let Some(key) = issue["key"].as_str().map(str::to_string) else {
                bail!("issue without key in search result");
            };
            let watchers = source.list_watchers(&key).await?;
            issue["fields"]["watchers"] = Value::Array(watchers);
        }
        info!("retrieved watchers for {} issues", issues.len());
    }

    store.save_issues(&issues)?;
    info!("total of {} issues downloaded.", issues.len());
    Ok(issues.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::migration::fixtures::{user, IssueBuilder};
    use crate::providers::mock::MockSource;
    use serde_json::json;

    fn source(issue_count: usize) -> MockSource {
        MockSource {
            projects: vec![json!({ "id": "1", "key": "CI", "name": "Core" })],
            users: vec![user("alice"), user("bob")],
            issues: (1..=issue_count)
                .map(|n| IssueBuilder::story(&format!("CI-{n}")).json())
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn pages_through_all_issues() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let mut config = test_config().jira;
        config.page_size = 2;

        download_all(&source(5), &store, &config).await.unwrap();

        let issues = store.load_issues().unwrap();
        let keys: Vec<_> = issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, ["CI-1", "CI-2", "CI-3", "CI-4", "CI-5"]);
        assert_eq!(store.load_users().unwrap().len(), 2);
        assert_eq!(store.load_projects().unwrap()[0].key, "CI");
        assert!(issues[0].fields.watchers.is_none());
    }

    #[tokio::test]
    async fn empty_instance_writes_empty_extract() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let config = test_config().jira;
        assert_eq!(download_issues(&source(0), &store, &config).await.unwrap(), 0);
        assert!(store.load_issues().unwrap().is_empty());
    }

    #[tokio::test]
    async fn watchers_are_attached_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let mut config = test_config().jira;
        config.retrieve_watchers = true;
        let mut src = source(2);
        src.watchers.insert("CI-1".into(), vec![user("bob")]);

        download_issues(&src, &store, &config).await.unwrap();

        let issues = store.load_issues().unwrap();
        let watchers = issues[0].fields.watchers.as_ref().unwrap();
        assert_eq!(watchers[0].key, "bob");
        assert_eq!(issues[1].fields.watchers.as_deref().map(<[_]>::len), Some(0));
    }
}
