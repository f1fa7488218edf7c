pub mod clubhouse;
pub mod jira;
pub mod session;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::error::MigrationError;
use crate::model::clubhouse::{
    CreateEpic, CreateProject, CreateStory, CreateStoryLink, CreateUser, EntityId, Epic, File,
    Invite, Label, Member, Project, Story, StoryLink, UpdateFile, Workflow,
};
use crate::model::jira::SearchPage;

/// The issue tracker being migrated away from.
#[async_trait]
pub trait Source: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Value>>;
    async fn search_users(&self) -> Result<Vec<Value>>;
    async fn search_issues(&self, start_at: usize, max_results: u32) -> Result<SearchPage>;
    async fn list_watchers(&self, issue_key: &str) -> Result<Vec<Value>>;
    async fn download_attachment(&self, content_url: &str) -> Result<Vec<u8>>;
    async fn update_description(&self, issue_key: &str, description: &str) -> Result<()>;
}

/// The token-authenticated Clubhouse REST API.
#[async_trait]
pub trait Destination: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn create_project(&self, project: &CreateProject) -> Result<Project>;
    async fn delete_project(&self, id: EntityId) -> Result<()>;

    async fn list_epics(&self) -> Result<Vec<Epic>>;
    async fn create_epic(&self, epic: &CreateEpic) -> Result<Epic>;
    async fn delete_epic(&self, id: EntityId) -> Result<()>;

    /// All non-archived stories, including their story links.
    async fn search_stories(&self) -> Result<Vec<Story>>;
    async fn list_project_stories(&self, project_id: EntityId) -> Result<Vec<Story>>;
    async fn create_story(&self, story: &CreateStory) -> Result<Story>;
    async fn delete_story(&self, id: EntityId) -> Result<()>;

    async fn create_story_link(&self, link: &CreateStoryLink) -> Result<StoryLink>;

    async fn list_labels(&self) -> Result<Vec<Label>>;
    async fn archive_label(&self, id: EntityId) -> Result<()>;
    async fn delete_label(&self, id: EntityId) -> Result<()>;

    async fn list_files(&self) -> Result<Vec<File>>;
    async fn upload_file(&self, filename: &str, bytes: Vec<u8>) -> Result<File>;
    async fn update_file(&self, id: EntityId, update: &UpdateFile) -> Result<File>;
    async fn delete_file(&self, id: EntityId) -> Result<()>;

    async fn list_members(&self) -> Result<Vec<Member>>;
    async fn list_workflows(&self) -> Result<Vec<Workflow>>;
}

/// User creation is not part of the public API; it goes through the web
/// app's session-authenticated endpoints.
#[async_trait]
pub trait Invitations: Send + Sync {
    async fn invite(&self, emails: &[String]) -> Result<Vec<Invite>>;
    async fn create_user(&self, invite_id: &str, user: &CreateUser) -> Result<()>;
}

/// Turn a non-2xx response into an error that carries the response body.
pub(crate) async fn ensure_success(
    resp: reqwest::Response,
    api: &'static str,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(MigrationError::Api {
        api,
        status: status.as_u16(),
        body,
    }
    .into())
}

#[cfg(test)]
pub mod mock;
