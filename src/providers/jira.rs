use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde_json::Value;

use super::{ensure_success, Source};
use crate::config::JiraConfig;
use crate::model::jira::{SearchPage, WatchersResponse};

pub struct JiraProvider {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl JiraProvider {
    pub fn new(config: &JiraConfig) -> Self {
        let creds = format!("{}:{}", config.user, config.password);
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        Self {
            base_url: format!("{}/rest/api/2", config.base_url()),
            auth_header: format!("Basic {encoded}"),
            client: reqwest::Client::new(),
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
    }
}

#[async_trait]
impl Source for JiraProvider {
    async fn list_projects(&self) -> Result<Vec<Value>> {
        let resp = self
            .get(&format!("{}/project", self.base_url))
            .send()
            .await
            .context("Jira project listing failed")?;
        let resp = ensure_success(resp, "Jira").await?;
        resp.json().await.context("Failed to parse Jira projects")
    }

    async fn search_users(&self) -> Result<Vec<Value>> {
        let resp = self
            .get(&format!("{}/user/search", self.base_url))
            .query(&[("username", "%"), ("maxResults", "1000")])
            .send()
            .await
            .context("Jira user search failed")?;
        let resp = ensure_success(resp, "Jira").await?;
        resp.json().await.context("Failed to parse Jira users")
    }

    async fn search_issues(&self, start_at: usize, max_results: u32) -> Result<SearchPage> {
        let resp = self
            .get(&format!("{}/search", self.base_url))
            .query(&[
                ("jql", String::new()),
                ("fields", "*all".to_string()),
                ("startAt", start_at.to_string()),
                ("maxResults", max_results.to_string()),
            ])
            .send()
            .await
            .context("Jira issue search failed")?;
        let resp = ensure_success(resp, "Jira").await?;
        resp.json().await.context("Failed to parse Jira search page")
    }

    async fn list_watchers(&self, issue_key: &str) -> Result<Vec<Value>> {
        let url = format!(
            "{}/issue/{}/watchers",
            self.base_url,
            urlencoding::encode(issue_key)
        );
        let resp = self
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Jira watcher lookup for {issue_key} failed"))?;
        let resp = ensure_success(resp, "Jira").await?;
        let watchers: WatchersResponse = resp.json().await?;
        Ok(watchers.watchers)
    }

    async fn download_attachment(&self, content_url: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(content_url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .with_context(|| format!("Attachment download from {content_url} failed"))?;
        let resp = ensure_success(resp, "Jira").await?;
        Ok(resp.bytes().await?.to_vec())
    }

    async fn update_description(&self, issue_key: &str, description: &str) -> Result<()> {
        let url = format!("{}/issue/{}", self.base_url, urlencoding::encode(issue_key));
        let body = serde_json::json!({ "fields": { "description": description } });
        let resp = self
            .client
            .put(&url)
            .header("Authorization", &self.auth_header)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Jira update of {issue_key} failed"))?;
        ensure_success(resp, "Jira").await?;
        Ok(())
    }
}
