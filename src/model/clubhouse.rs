use serde::{Deserialize, Serialize};

pub type EntityId = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateProject {
    pub name: String,
    pub abbreviation: String,
    pub external_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpicState {
    #[serde(rename = "to do")]
    ToDo,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epic {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateEpic {
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    pub external_id: String,
    pub owner_ids: Vec<String>,
    pub state: EpicState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryType {
    Feature,
    Bug,
    Chore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkVerb {
    #[serde(rename = "blocks")]
    Blocks,
    #[serde(rename = "duplicates")]
    Duplicates,
    #[serde(rename = "relates to")]
    RelatesTo,
}

impl LinkVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkVerb::Blocks => "blocks",
            LinkVerb::Duplicates => "duplicates",
            LinkVerb::RelatesTo => "relates to",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryLink {
    pub id: EntityId,
    pub verb: LinkVerb,
    pub subject_id: EntityId,
    pub object_id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateStoryLink {
    pub verb: LinkVerb,
    pub subject_id: EntityId,
    pub object_id: EntityId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub story_links: Vec<StoryLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateComment {
    pub author_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub text: String,
    pub external_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateStory {
    pub name: String,
    pub project_id: EntityId,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    pub workflow_state_id: EntityId,
    pub external_id: String,
    pub story_type: StoryType,
    pub epic_id: Option<EntityId>,
    pub requested_by_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub owner_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub follower_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<i64>,
    pub labels: Vec<LabelRef>,
    pub file_ids: Vec<EntityId>,
    pub comments: Vec<CreateComment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateFile {
    pub external_id: String,
    pub name: String,
    pub updated_at: String,
    pub uploader_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub mention_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub profile: Profile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: EntityId,
    pub states: Vec<WorkflowState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Invite {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateUser {
    pub name: String,
    pub username: String,
    pub password: String,
    pub password_confirm: String,
    pub product_updates: bool,
}
