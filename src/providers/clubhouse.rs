use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ensure_success, Destination};
use crate::model::clubhouse::{
    CreateEpic, CreateProject, CreateStory, CreateStoryLink, EntityId, Epic, File, Label, Member,
    Project, Story, StoryLink, UpdateFile, Workflow,
};

const API_BASE: &str = "https://api.clubhouse.io/api/v3";

pub struct ClubhouseProvider {
    base_url: String,
    api_token: String,
    client: reqwest::Client,
}

impl ClubhouseProvider {
    pub fn new(api_token: String) -> Self {
        Self {
            base_url: API_BASE.to_string(),
            api_token,
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("Clubhouse-Token", &self.api_token)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .request(Method::GET, path)
            .send()
            .await
            .with_context(|| format!("Clubhouse GET {path} failed"))?;
        let resp = ensure_success(resp, "Clubhouse").await?;
        resp.json()
            .await
            .with_context(|| format!("Failed to parse Clubhouse response for {path}"))
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let resp = self
            .request(method.clone(), path)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Clubhouse {method} {path} failed"))?;
        let resp = ensure_success(resp, "Clubhouse").await?;
        resp.json()
            .await
            .with_context(|| format!("Failed to parse Clubhouse response for {path}"))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let resp = self
            .request(Method::DELETE, path)
            .send()
            .await
            .with_context(|| format!("Clubhouse DELETE {path} failed"))?;
        ensure_success(resp, "Clubhouse").await?;
        Ok(())
    }
}

#[async_trait]
impl Destination for ClubhouseProvider {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.get_json("/projects").await
    }

    async fn create_project(&self, project: &CreateProject) -> Result<Project> {
        self.send_json(Method::POST, "/projects", project).await
    }

    async fn delete_project(&self, id: EntityId) -> Result<()> {
        self.delete(&format!("/projects/{id}")).await
    }

    async fn list_epics(&self) -> Result<Vec<Epic>> {
        self.get_json("/epics").await
    }

    async fn create_epic(&self, epic: &CreateEpic) -> Result<Epic> {
        self.send_json(Method::POST, "/epics", epic).await
    }

    async fn delete_epic(&self, id: EntityId) -> Result<()> {
        self.delete(&format!("/epics/{id}")).await
    }

    async fn search_stories(&self) -> Result<Vec<Story>> {
        let body = serde_json::json!({ "archived": false });
        self.send_json(Method::POST, "/stories/search", &body).await
    }

    async fn list_project_stories(&self, project_id: EntityId) -> Result<Vec<Story>> {
        self.get_json(&format!("/projects/{project_id}/stories"))
            .await
    }

    async fn create_story(&self, story: &CreateStory) -> Result<Story> {
        self.send_json(Method::POST, "/stories", story).await
    }

    async fn delete_story(&self, id: EntityId) -> Result<()> {
        self.delete(&format!("/stories/{id}")).await
    }

    async fn create_story_link(&self, link: &CreateStoryLink) -> Result<StoryLink> {
        self.send_json(Method::POST, "/story-links", link).await
    }

    async fn list_labels(&self) -> Result<Vec<Label>> {
        self.get_json("/labels").await
    }

    async fn archive_label(&self, id: EntityId) -> Result<()> {
        let body = serde_json::json!({ "archived": true });
        let _: Label = self
            .send_json(Method::PUT, &format!("/labels/{id}"), &body)
            .await?;
        Ok(())
    }

    async fn delete_label(&self, id: EntityId) -> Result<()> {
        self.delete(&format!("/labels/{id}")).await
    }

    async fn list_files(&self) -> Result<Vec<File>> {
        self.get_json("/files").await
    }

    async fn upload_file(&self, filename: &str, bytes: Vec<u8>) -> Result<File> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self
            .request(Method::POST, "/files")
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Upload of {filename} failed"))?;
        let resp = ensure_success(resp, "Clubhouse").await?;
        let mut uploaded: Vec<File> = resp.json().await.context("Failed to parse upload response")?;
        if uploaded.is_empty() {
            anyhow::bail!("Clubhouse returned no file for upload of {filename}");
        }
        Ok(uploaded.swap_remove(0))
    }

    async fn update_file(&self, id: EntityId, update: &UpdateFile) -> Result<File> {
        self.send_json(Method::PUT, &format!("/files/{id}"), update)
            .await
    }

    async fn delete_file(&self, id: EntityId) -> Result<()> {
        self.delete(&format!("/files/{id}")).await
    }

    async fn list_members(&self) -> Result<Vec<Member>> {
        self.get_json("/members").await
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>> {
        self.get_json("/workflows").await
    }
}
