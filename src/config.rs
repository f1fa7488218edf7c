use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::model::clubhouse::EpicState;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub jira: JiraConfig,
    pub clubhouse: ClubhouseConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraConfig {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    pub host: String,
    pub user: String,
    pub password: String,
    #[serde(flatten)]
    pub fields: CustomFields,
    #[serde(default)]
    pub retrieve_watchers: bool,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl JiraConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.host)
    }
}

/// Ids of the Jira custom fields the migration reads.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomFields {
    #[serde(default = "default_estimate_field")]
    pub estimate_field: String,
    /// List of semi-structured sprint strings, one per sprint the issue was part of.
    #[serde(default = "default_sprint_field")]
    pub sprint_field: String,
    /// Epic key (e.g. `PLAT-76`) a regular issue belongs to.
    #[serde(default = "default_epic_ref_field")]
    pub epic_ref_field: String,
    #[serde(default = "default_epic_title_field")]
    pub epic_title_field: String,
}

impl Default for CustomFields {
    fn default() -> Self {
        Self {
            estimate_field: default_estimate_field(),
            sprint_field: default_sprint_field(),
            epic_ref_field: default_epic_ref_field(),
            epic_title_field: default_epic_title_field(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClubhouseConfig {
    pub api_token: String,
    pub org: String,
    /// Appended to a Jira user key to derive the Clubhouse mention name.
    pub user_suffix: String,
    #[serde(default)]
    pub initial_password: String,
    /// Copied from a logged-in browser session; only the invite flow needs it.
    #[serde(default)]
    pub session_cookie: String,
    #[serde(default)]
    pub organization_id: String,
    pub invite_email_template: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    #[serde(default = "default_status_mapping")]
    pub status: HashMap<String, String>,
    #[serde(default = "default_epic_status_mapping")]
    pub epic_status: HashMap<String, EpicState>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            status: default_status_mapping(),
            epic_status: default_epic_status_mapping(),
        }
    }
}

fn default_protocol() -> String {
    "https".into()
}

fn default_page_size() -> u32 {
    1000
}

fn default_estimate_field() -> String {
    "customfield_10105".into()
}

fn default_sprint_field() -> String {
    "customfield_10103".into()
}

fn default_epic_ref_field() -> String {
    "customfield_10006".into()
}

fn default_epic_title_field() -> String {
    "customfield_10003".into()
}

fn default_status_mapping() -> HashMap<String, String> {
    [
        ("To Do", "Unscheduled"),
        ("In Progress", "In Development"),
        ("In Review", "Ready for Review"),
        ("Under Review", "Ready for Review"),
        ("Done", "Completed"),
        ("Live", "Completed"),
    ]
    .into_iter()
    .map(|(jira, ch)| (jira.to_string(), ch.to_string()))
    .collect()
}

fn default_epic_status_mapping() -> HashMap<String, EpicState> {
    [
        ("To Do", EpicState::ToDo),
        ("In Progress", EpicState::InProgress),
        ("In Review", EpicState::InProgress),
        ("Under Review", EpicState::InProgress),
        ("Done", EpicState::Done),
        ("Live", EpicState::Done),
    ]
    .into_iter()
    .map(|(jira, state)| (jira.to_string(), state))
    .collect()
}

fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".jira2ch")
}

pub fn config_path() -> PathBuf {
    match std::env::var_os("JIRA2CH_CONFIG") {
        Some(path) => PathBuf::from(path),
        None => home_dir().join("config.toml"),
    }
}

impl AppConfig {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| home_dir().join("data"))
    }
}

pub fn load_config() -> Result<AppConfig> {
    let path = config_path();
    if !path.exists() {
        bail!(
            "No config found at {}. Create it with [jira] and [clubhouse] credentials.",
            path.display()
        );
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    Ok(toml::from_str(contents)?)
}

#[cfg(test)]
pub fn test_config() -> AppConfig {
    AppConfig {
        jira: JiraConfig {
            protocol: "https".into(),
            host: "acme.atlassian.net".into(),
            user: "bot@acme.com".into(),
            password: "secret".into(),
            fields: CustomFields::default(),
            retrieve_watchers: false,
            page_size: 1000,
        },
        clubhouse: ClubhouseConfig {
            api_token: "token".into(),
            org: "acme".into(),
            user_suffix: "-acme".into(),
            initial_password: "changeme".into(),
            session_cookie: String::new(),
            organization_id: String::new(),
            invite_email_template: None,
        },
        mapping: MappingConfig::default(),
        data_dir: None,
    }
}
