pub mod context;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod links;
pub mod mapper;
pub mod purge;
pub mod sprint;
mod stages;

use std::fmt;

use anyhow::Result;
use tracing::info;

pub use context::MigrationContext;

use crate::config::AppConfig;
use crate::providers::{Destination, Source};
use crate::store::LocalStore;

/// Stories and epics are created ten at a time; every other write stage runs
/// one item at a time in source order.
pub const STORY_CONCURRENCY: usize = 10;
pub const EPIC_CONCURRENCY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    LoadState,
    MigrateUsers,
    MigrateProjects,
    MigrateFiles,
    MigrateEpics,
    MigrateIssues,
    MigrateLinks,
    ArchiveLabels,
    BacklinkSource,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::LoadState => "load-state",
            Stage::MigrateUsers => "migrate-users",
            Stage::MigrateProjects => "migrate-projects",
            Stage::MigrateFiles => "migrate-files",
            Stage::MigrateEpics => "migrate-epics",
            Stage::MigrateIssues => "migrate-issues",
            Stage::MigrateLinks => "migrate-links",
            Stage::ArchiveLabels => "archive-labels",
            Stage::BacklinkSource => "backlink-source",
        }
    }

    /// Lookup tables that must be populated before the stage may run.
    pub fn requires(&self) -> &'static [Table] {
        use Table::*;
        match self {
            Stage::LoadState => &[],
            Stage::MigrateUsers => &[SourceUsers, Members],
            Stage::MigrateProjects => &[SourceProjects, Projects],
            Stage::MigrateFiles => &[SourceIssues, Files, Members],
            Stage::MigrateEpics => &[SourceIssues, Epics, Members],
            Stage::MigrateIssues => &[
                SourceIssues,
                Projects,
                Epics,
                Stories,
                Files,
                Members,
                Workflow,
            ],
            Stage::MigrateLinks => &[SourceIssues, Stories],
            Stage::ArchiveLabels => &[LabelMarks],
            Stage::BacklinkSource => &[SourceIssues, Stories, Epics],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    SourceProjects,
    SourceUsers,
    SourceIssues,
    Projects,
    Epics,
    Stories,
    Files,
    Members,
    Workflow,
    /// Label names marked for archival by `migrate-issues`.
    LabelMarks,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Table::SourceProjects => "local jira projects",
            Table::SourceUsers => "local jira users",
            Table::SourceIssues => "local jira issues",
            Table::Projects => "clubhouse projects",
            Table::Epics => "clubhouse epics",
            Table::Stories => "clubhouse stories",
            Table::Files => "clubhouse files",
            Table::Members => "clubhouse members",
            Table::Workflow => "clubhouse workflow states",
            Table::LabelMarks => "labels marked for archival",
        })
    }
}

pub struct Migration<'a> {
    pub config: &'a AppConfig,
    pub destination: &'a dyn Destination,
    pub source: &'a dyn Source,
}

impl<'a> Migration<'a> {
    pub fn new(
        config: &'a AppConfig,
        destination: &'a dyn Destination,
        source: &'a dyn Source,
    ) -> Self {
        Self {
            config,
            destination,
            source,
        }
    }

    /// load-state → projects → files → epics → issues → links → archive-labels
    pub async fn migrate_data(&self, ctx: &mut MigrationContext, store: &LocalStore) -> Result<()> {
        self.load_state(ctx, store).await?;
        self.migrate_projects(ctx).await?;
        self.migrate_files(ctx).await?;
        self.migrate_epics(ctx).await?;
        self.migrate_issues(ctx).await?;
        self.migrate_links(ctx).await?;
        self.archive_labels(ctx).await?;
        info!("data migration completed");
        Ok(())
    }

    /// load-state → backlink-source
    pub async fn update_jira_issues(
        &self,
        ctx: &mut MigrationContext,
        store: &LocalStore,
    ) -> Result<()> {
        self.load_state(ctx, store).await?;
        self.backlink_source(ctx).await?;
        Ok(())
    }
}
