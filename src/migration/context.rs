use std::collections::{BTreeSet, HashMap, HashSet};

use super::links::DedupeKey;
use super::{Stage, Table};
use crate::error::MigrationError;
use crate::model::clubhouse::{EntityId, Epic, File, Member, Project, Story};
use crate::model::jira::{JiraProject, JiraUser, SourceIssue};

/// Lookup tables threaded through the stages of one run. Destination tables
/// are keyed by `external_id` (the Jira key, or the Jira attachment id for
/// files) and grow as stages create entities.
#[derive(Debug, Default)]
pub struct MigrationContext {
    pub source_projects: Vec<JiraProject>,
    pub source_users: Vec<JiraUser>,
    pub issues: Vec<SourceIssue>,
    pub projects: HashMap<String, Project>,
    pub epics: HashMap<String, Epic>,
    pub stories: HashMap<String, Story>,
    pub files: HashMap<String, File>,
    pub members: Vec<Member>,
    /// Jira status name → Clubhouse workflow state id.
    pub state_ids: HashMap<String, EntityId>,
    pub link_keys: HashSet<DedupeKey>,
    pub labels_to_archive: BTreeSet<String>,
    loaded: HashSet<Table>,
}

impl MigrationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_loaded(&mut self, table: Table) {
        self.loaded.insert(table);
    }

    pub fn is_loaded(&self, table: Table) -> bool {
        self.loaded.contains(&table)
    }

    pub fn require(&self, stage: Stage) -> Result<(), MigrationError> {
        match stage.requires().iter().find(|t| !self.is_loaded(**t)) {
            Some(table) => Err(MigrationError::Precondition {
                stage,
                table: *table,
            }),
            None => Ok(()),
        }
    }

    pub fn mention_names(&self) -> Vec<String> {
        self.members
            .iter()
            .map(|m| m.profile.mention_name.clone())
            .collect()
    }
}

pub fn key_by_external_id<T>(
    items: Vec<T>,
    external_id: impl Fn(&T) -> Option<&String>,
) -> HashMap<String, T> {
    items
        .into_iter()
        .filter_map(|item| external_id(&item).cloned().map(|key| (key, item)))
        .collect()
}
