use thiserror::Error;

use crate::migration::{Stage, Table};

/// A source value with no counterpart in the configured mapping tables or in
/// the destination. Fatal to the item being mapped, never defaulted.
#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("could not find valid mapping for status: {0}")]
    UnmappedStatus(String),

    #[error("could not find valid mapping for epic status: {0}")]
    UnmappedEpicStatus(String),

    #[error(
        "no clubhouse member `{username}` for jira user `{jira_user}`; available members: {}",
        available.join(", ")
    )]
    UnknownMember {
        username: String,
        jira_user: String,
        available: Vec<String>,
    },

    #[error("project {0} has not been migrated")]
    UnknownProject(String),

    #[error("attachment {attachment} ({filename}) has not been uploaded")]
    MissingFile { attachment: String, filename: String },

    #[error("could not extract sprint {field} from sprint info: {raw}")]
    MalformedSprint { field: &'static str, raw: String },

    #[error("workflow has no state named `{0}`")]
    UnknownWorkflowState(String),
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("stage {stage} requires {table} to be loaded first")]
    Precondition { stage: Stage, table: Table },

    #[error("{stage}: {failed} item(s) failed; fix the cause and re-run the stage")]
    StageIncomplete { stage: Stage, failed: usize },

    #[error("{api} API error ({status}): {body}")]
    Api {
        api: &'static str,
        status: u16,
        body: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_member_lists_handles() {
        let err = MappingError::UnknownMember {
            username: "bob-acme".into(),
            jira_user: "bob".into(),
            available: vec!["alice-acme".into(), "carol-acme".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("bob-acme"));
        assert!(msg.contains("alice-acme, carol-acme"));
    }

    #[test]
    fn incomplete_stage_names_stage() {
        let err = MigrationError::StageIncomplete {
            stage: Stage::MigrateIssues,
            failed: 3,
        };
        assert_eq!(
            err.to_string(),
            "migrate-issues: 3 item(s) failed; fix the cause and re-run the stage"
        );
    }
}
