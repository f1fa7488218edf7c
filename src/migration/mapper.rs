use tracing::warn;

use super::context::MigrationContext;
use super::sprint::parse_sprint_value;
use crate::config::{AppConfig, CustomFields};
use crate::error::MappingError;
use crate::model::clubhouse::{
    CreateComment, CreateEpic, CreateProject, CreateStory, EntityId, EpicState, LabelRef,
    StoryType,
};
use crate::model::jira::{Issue, IssueType, JiraProject, JiraUser};
use crate::util::text::rewrite_mentions;
use crate::util::time::normalize_timestamp;

/// Label attached to every imported story.
pub const IMPORT_LABEL: &str = "JIRA";

/// A mapped story plus the label names it marks for archival.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedStory {
    pub story: CreateStory,
    pub archive: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    pub labels: Vec<LabelRef>,
    pub archive: Vec<String>,
}

impl LabelSet {
    fn add(&mut self, name: String, archive: bool) {
        if archive && !self.archive.contains(&name) {
            self.archive.push(name.clone());
        }
        if !self.labels.iter().any(|l| l.name == name) {
            self.labels.push(LabelRef { name });
        }
    }
}

pub fn clubhouse_username(user: &JiraUser, suffix: &str) -> String {
    format!("{}{}", user.key, suffix)
}

pub fn map_project(project: &JiraProject) -> CreateProject {
    CreateProject {
        name: project.name.clone(),
        abbreviation: project.key.clone(),
        external_id: project.key.clone(),
    }
}

pub fn story_type(issue_type: IssueType) -> StoryType {
    match issue_type {
        IssueType::Bug => StoryType::Bug,
        IssueType::Task => StoryType::Chore,
        IssueType::Story | IssueType::Subtask | IssueType::Epic | IssueType::Other => {
            StoryType::Feature
        }
    }
}

/// Labels for a regular issue: the import label, one per sprint (closed
/// sprints are marked for archival) and one for the first release (always
/// marked).
pub fn synthesize_labels(issue: &Issue, fields: &CustomFields) -> Result<LabelSet, MappingError> {
    let mut set = LabelSet::default();
    set.add(IMPORT_LABEL.to_string(), false);

    for raw in issue.custom_list(&fields.sprint_field) {
        let sprint = parse_sprint_value(raw)?;
        set.add(sprint.label(), sprint.closed);
    }

    if let Some(release) = issue.fields.fix_versions.first() {
        let name = match &release.release_date {
            Some(date) => format!("Release-{}-{}", date, release.name),
            None => format!("Release-{}", release.name),
        };
        set.add(name, true);
    }

    Ok(set)
}

pub struct Mapper<'a> {
    config: &'a AppConfig,
    ctx: &'a MigrationContext,
}

impl<'a> Mapper<'a> {
    pub fn new(config: &'a AppConfig, ctx: &'a MigrationContext) -> Self {
        Self { config, ctx }
    }

    fn suffix(&self) -> &str {
        &self.config.clubhouse.user_suffix
    }

    fn text(&self, raw: Option<&str>) -> String {
        rewrite_mentions(raw.unwrap_or_default(), self.suffix())
    }

    fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.config.jira.base_url(), key)
    }

    pub fn status_id(&self, status: &str) -> Result<EntityId, MappingError> {
        self.ctx
            .state_ids
            .get(status)
            .copied()
            .ok_or_else(|| MappingError::UnmappedStatus(status.to_string()))
    }

    pub fn epic_state(&self, status: &str) -> Result<EpicState, MappingError> {
        self.config
            .mapping
            .epic_status
            .get(status)
            .copied()
            .ok_or_else(|| MappingError::UnmappedEpicStatus(status.to_string()))
    }

    pub fn member_id(&self, user: &JiraUser) -> Result<String, MappingError> {
        let username = clubhouse_username(user, self.suffix());
        self.ctx
            .members
            .iter()
            .find(|m| m.profile.mention_name == username)
            .map(|m| m.id.clone())
            .ok_or_else(|| MappingError::UnknownMember {
                username,
                jira_user: user.name.clone(),
                available: self.ctx.mention_names(),
            })
    }

    pub fn epic_id(&self, issue: &Issue) -> Option<EntityId> {
        let key = issue.custom_str(&self.config.jira.fields.epic_ref_field)?;
        self.ctx.epics.get(key).map(|epic| epic.id)
    }

    pub fn project_id(&self, issue: &Issue) -> Result<EntityId, MappingError> {
        let key = &issue.fields.project.key;
        self.ctx
            .projects
            .get(key)
            .map(|p| p.id)
            .ok_or_else(|| MappingError::UnknownProject(key.clone()))
    }

    pub fn file_ids(&self, issue: &Issue) -> Result<Vec<EntityId>, MappingError> {
        issue
            .fields
            .attachment
            .iter()
            .map(|attachment| {
                self.ctx
                    .files
                    .get(&attachment.id)
                    .map(|f| f.id)
                    .ok_or_else(|| MappingError::MissingFile {
                        attachment: attachment.id.clone(),
                        filename: attachment.filename.clone(),
                    })
            })
            .collect()
    }

    pub fn comments(&self, issue: &Issue) -> Result<Vec<CreateComment>, MappingError> {
        issue
            .fields
            .comment
            .comments
            .iter()
            .map(|comment| {
                Ok(CreateComment {
                    author_id: self.member_id(&comment.author)?,
                    created_at: normalize_timestamp(&comment.created),
                    updated_at: normalize_timestamp(&comment.updated),
                    text: self.text(Some(&comment.body)),
                    external_id: comment.id.clone(),
                })
            })
            .collect()
    }

    /// Watchers that have a Clubhouse account. The rest are only logged.
    pub fn followers(&self, issue: &Issue) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for watcher in issue.fields.watchers.iter().flatten() {
            match self.member_id(watcher) {
                Ok(id) if !ids.contains(&id) => ids.push(id),
                Ok(_) => {}
                Err(e) => warn!(issue = %issue.key, watcher = %watcher.key, "skipping follower: {e}"),
            }
        }
        ids
    }

    pub fn map_epic(&self, issue: &Issue) -> Result<CreateEpic, MappingError> {
        let fields = &issue.fields;
        let name = issue
            .custom_str(&self.config.jira.fields.epic_title_field)
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(fields.summary.as_str())
            .to_string();

        let mut owner_ids = Vec::new();
        for user in fields.assignee.iter().chain(std::iter::once(&fields.creator)) {
            let id = self.member_id(user)?;
            if !owner_ids.contains(&id) {
                owner_ids.push(id);
            }
        }

        Ok(CreateEpic {
            name,
            description: format!(
                "{}\n{}\n\nOriginal Jira Epic: {}",
                fields.summary,
                self.text(fields.description.as_deref()),
                self.browse_url(&issue.key)
            ),
            created_at: normalize_timestamp(&fields.created),
            updated_at: normalize_timestamp(&fields.updated),
            external_id: issue.key.clone(),
            owner_ids,
            state: self.epic_state(&fields.status.name)?,
        })
    }

    pub fn map_story(&self, issue: &Issue) -> Result<MappedStory, MappingError> {
        let fields = &issue.fields;
        let labels = synthesize_labels(issue, &self.config.jira.fields)?;

        let story = CreateStory {
            name: format!("{} {}", issue.key, fields.summary),
            project_id: self.project_id(issue)?,
            description: format!(
                "{}\n\nOriginal Jira Issue: [{}]({})",
                self.text(fields.description.as_deref()),
                issue.key,
                self.browse_url(&issue.key)
            ),
            created_at: normalize_timestamp(&fields.created),
            updated_at: normalize_timestamp(&fields.updated),
            workflow_state_id: self.status_id(&fields.status.name)?,
            external_id: issue.key.clone(),
            story_type: story_type(fields.issuetype.name),
            epic_id: self.epic_id(issue),
            requested_by_id: self.member_id(&fields.creator)?,
            owner_ids: match &fields.assignee {
                Some(assignee) => vec![self.member_id(assignee)?],
                None => Vec::new(),
            },
            follower_ids: self.followers(issue),
            estimate: issue
                .custom_f64(&self.config.jira.fields.estimate_field)
                .map(|points| points.round() as i64),
            labels: labels.labels,
            file_ids: self.file_ids(issue)?,
            comments: self.comments(issue)?,
        };

        Ok(MappedStory {
            story,
            archive: labels.archive,
        })
    }
}
