use anyhow::Result;
use tracing::info;

use crate::config::{self, AppConfig};
use crate::extract;
use crate::migration::purge::Purger;
use crate::migration::{Migration, MigrationContext};
use crate::providers::clubhouse::ClubhouseProvider;
use crate::providers::jira::JiraProvider;
use crate::providers::session::SessionProvider;
use crate::store::LocalStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    DownloadJira,
    MigrateUsers,
    PurgeClubhouse,
    MigrateData,
    UpdateJiraIssues,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::DownloadJira,
        Step::MigrateUsers,
        Step::PurgeClubhouse,
        Step::MigrateData,
        Step::UpdateJiraIssues,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::DownloadJira => "downloadJira",
            Step::MigrateUsers => "migrateUsers",
            Step::PurgeClubhouse => "purgeClubhouse",
            Step::MigrateData => "migrateData",
            Step::UpdateJiraIssues => "updateJiraIssues",
        }
    }

    fn help(&self) -> &'static str {
        match self {
            Step::DownloadJira => "Downloads all data from jira into the local data directory",
            Step::MigrateUsers => "Creates clubhouse users for each user in the downloaded users.json",
            Step::PurgeClubhouse => "Deletes all clubhouse data, except for users",
            Step::MigrateData => "Migrates all projects, files, epics, issues and links, except for users",
            Step::UpdateJiraIssues => {
                "Updates every jira issue with a link to its clubhouse counterpart. \
                 Run this only after all other steps completed successfully."
            }
        }
    }
}

/// The step named by the first positional argument. Anything else yields
/// `None` and the caller prints help.
pub fn parse_step(args: &[String]) -> Option<Step> {
    let name = args.first()?;
    Step::ALL.into_iter().find(|step| step.name() == name.as_str())
}

pub async fn run_step(step: Step) -> Result<()> {
    let config = config::load_config()?;
    let store = LocalStore::new(config.data_dir());
    info!(step = step.name(), data_dir = %store.dir().display(), "starting");

    match step {
        Step::DownloadJira => {
            let jira = JiraProvider::new(&config.jira);
            extract::download_all(&jira, &store, &config.jira).await?;
        }
        Step::MigrateUsers => {
            let (clubhouse, jira) = clients(&config);
            let session = SessionProvider::new(&config.clubhouse);
            let migration = Migration::new(&config, &clubhouse, &jira);
            let mut ctx = MigrationContext::new();
            migration.load_users_state(&mut ctx, &store).await?;
            migration.migrate_users(&mut ctx, &session).await?;
        }
        Step::PurgeClubhouse => {
            let clubhouse = ClubhouseProvider::new(config.clubhouse.api_token.clone());
            Purger::new(&clubhouse).purge_all().await?;
        }
        Step::MigrateData => {
            let (clubhouse, jira) = clients(&config);
            let migration = Migration::new(&config, &clubhouse, &jira);
            migration
                .migrate_data(&mut MigrationContext::new(), &store)
                .await?;
        }
        Step::UpdateJiraIssues => {
            let (clubhouse, jira) = clients(&config);
            let migration = Migration::new(&config, &clubhouse, &jira);
            migration
                .update_jira_issues(&mut MigrationContext::new(), &store)
                .await?;
        }
    }
    Ok(())
}

fn clients(config: &AppConfig) -> (ClubhouseProvider, JiraProvider) {
    (
        ClubhouseProvider::new(config.clubhouse.api_token.clone()),
        JiraProvider::new(&config.jira),
    )
}

pub fn print_help() {
    println!("jira2ch: migrate a Jira instance to Clubhouse\n");
    println!("USAGE:");
    println!("  jira2ch <step>\n");
    println!("STEPS:");
    for step in Step::ALL {
        println!("  {:<17} {}", step.name(), step.help());
    }
    println!();
    println!("CONFIG:");
    println!(
        "  {} (override with JIRA2CH_CONFIG)",
        config::config_path().display()
    );
}
