use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraProject {
    pub id: String,
    /// e.g. `CI`
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueType {
    Epic,
    Story,
    Bug,
    Task,
    #[serde(rename = "Sub-task")]
    Subtask,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueTypeField {
    pub name: IssueType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusField {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRef {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: JiraUser,
    #[serde(default)]
    pub body: String,
    pub created: String,
    pub updated: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub author: JiraUser,
    pub created: String,
    /// Download URL of the attachment body.
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    Blocks,
    Cloners,
    Duplicate,
    Relates,
    Other,
}

impl LinkType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Blocks" => LinkType::Blocks,
            "Cloners" => LinkType::Cloners,
            "Duplicate" => LinkType::Duplicate,
            "Relates" => LinkType::Relates,
            _ => LinkType::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTypeField {
    pub name: String,
}

/// One endpoint's view of a link. Jira stores the same link on both issues,
/// each copy naming only the *other* side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLink {
    pub id: String,
    #[serde(rename = "type")]
    pub link_type: LinkTypeField,
    #[serde(default)]
    pub inward_issue: Option<IssueRef>,
    #[serde(default)]
    pub outward_issue: Option<IssueRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub name: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub issuetype: IssueTypeField,
    pub project: ProjectRef,
    pub status: StatusField,
    pub created: String,
    pub updated: String,
    pub creator: JiraUser,
    #[serde(default)]
    pub assignee: Option<JiraUser>,
    #[serde(default)]
    pub comment: CommentPage,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub issuelinks: Vec<IssueLink>,
    #[serde(default)]
    pub parent: Option<IssueRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attachment: Vec<Attachment>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fix_versions: Vec<Release>,
    #[serde(default)]
    pub watchers: Option<Vec<JiraUser>>,
    /// `customfield_*` values and everything else Jira returned.
    #[serde(flatten)]
    pub custom: HashMap<String, Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    /// e.g. `CI-221`
    pub key: String,
    pub fields: IssueFields,
}

impl Issue {
    pub fn custom_str(&self, field: &str) -> Option<&str> {
        self.fields.custom.get(field).and_then(Value::as_str)
    }

    pub fn custom_f64(&self, field: &str) -> Option<f64> {
        self.fields.custom.get(field).and_then(Value::as_f64)
    }

    pub fn custom_list(&self, field: &str) -> &[Value] {
        match self.fields.custom.get(field) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    pub fn is_epic(&self) -> bool {
        self.fields.issuetype.name == IssueType::Epic
    }
}

/// A source issue split by type tag: epics and regular issues take different
/// mapping paths.
#[derive(Debug, Clone)]
pub enum SourceIssue {
    Epic(Issue),
    Regular(Issue),
}

impl From<Issue> for SourceIssue {
    fn from(issue: Issue) -> Self {
        if issue.is_epic() {
            SourceIssue::Epic(issue)
        } else {
            SourceIssue::Regular(issue)
        }
    }
}

impl SourceIssue {
    pub fn issue(&self) -> &Issue {
        match self {
            SourceIssue::Epic(issue) | SourceIssue::Regular(issue) => issue,
        }
    }

    pub fn key(&self) -> &str {
        &self.issue().key
    }

    pub fn as_epic(&self) -> Option<&Issue> {
        match self {
            SourceIssue::Epic(issue) => Some(issue),
            SourceIssue::Regular(_) => None,
        }
    }

    pub fn as_regular(&self) -> Option<&Issue> {
        match self {
            SourceIssue::Regular(issue) => Some(issue),
            SourceIssue::Epic(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub total: usize,
    #[serde(default)]
    pub issues: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct WatchersResponse {
    #[serde(default)]
    pub watchers: Vec<Value>,
}
