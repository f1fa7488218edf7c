use std::collections::HashMap;

use anyhow::{bail, Result};
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use super::context::key_by_external_id;
use super::links::{existing_link_keys, reconcile};
use super::mapper::{clubhouse_username, map_project, synthesize_labels, Mapper, MappedStory};
use super::{Migration, MigrationContext, Stage, Table, EPIC_CONCURRENCY, STORY_CONCURRENCY};
use crate::error::{MappingError, MigrationError};
use crate::model::clubhouse::{CreateEpic, CreateStoryLink, CreateUser, EntityId, File, UpdateFile};
use crate::model::jira::{Attachment, Issue, JiraUser, SourceIssue};
use crate::providers::Invitations;
use crate::store::LocalStore;
use crate::util::time::normalize_timestamp;

/// Per-stage outcome counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Tally {
    /// Log the counters and turn failed items into a stage error.
    pub(crate) fn finish(self, stage: Stage) -> Result<Self, MigrationError> {
        info!(
            %stage,
            done = self.done,
            skipped = self.skipped,
            failed = self.failed,
            "stage finished"
        );
        if self.failed > 0 {
            return Err(MigrationError::StageIncomplete {
                stage,
                failed: self.failed,
            });
        }
        Ok(self)
    }
}

impl Migration<'_> {
    /// Populate every lookup table from the destination's listing endpoints
    /// and the local extract.
    pub async fn load_state(&self, ctx: &mut MigrationContext, store: &LocalStore) -> Result<()> {
        ctx.require(Stage::LoadState)?;
        info!("fetch existing clubhouse projects");
        let projects = self.destination.list_projects().await?;
        ctx.projects = key_by_external_id(projects, |p| p.external_id.as_ref());
        ctx.mark_loaded(Table::Projects);

        info!("fetch existing clubhouse files");
        let files = self.destination.list_files().await?;
        ctx.files = key_by_external_id(files, |f| f.external_id.as_ref());
        ctx.mark_loaded(Table::Files);

        info!("fetch existing clubhouse members");
        ctx.members = self.destination.list_members().await?;
        ctx.mark_loaded(Table::Members);

        info!("fetch existing clubhouse workflow mapping");
        ctx.state_ids = self.resolve_workflow_states().await?;
        ctx.mark_loaded(Table::Workflow);

        info!("fetch existing clubhouse stories");
        let stories = self.destination.search_stories().await?;
        ctx.stories = key_by_external_id(stories, |s| s.external_id.as_ref());
        ctx.mark_loaded(Table::Stories);
        info!("fetched {} existing clubhouse stories", ctx.stories.len());

        info!("fetch existing clubhouse epics");
        let epics = self.destination.list_epics().await?;
        ctx.epics = key_by_external_id(epics, |e| e.external_id.as_ref());
        ctx.mark_loaded(Table::Epics);

        info!("load jira projects from {}", store.dir().display());
        ctx.source_projects = store.load_projects()?;
        ctx.mark_loaded(Table::SourceProjects);

        info!("load jira users from {}", store.dir().display());
        ctx.source_users = store.load_users()?;
        ctx.mark_loaded(Table::SourceUsers);

        info!("load jira issues from {}", store.dir().display());
        ctx.issues = store
            .load_issues()?
            .into_iter()
            .map(SourceIssue::from)
            .collect();
        ctx.mark_loaded(Table::SourceIssues);

        Ok(())
    }

    /// The subset of `load_state` that user invitation needs.
    pub async fn load_users_state(
        &self,
        ctx: &mut MigrationContext,
        store: &LocalStore,
    ) -> Result<()> {
        info!("fetch existing clubhouse members");
        ctx.members = self.destination.list_members().await?;
        ctx.mark_loaded(Table::Members);

        ctx.source_users = store.load_users()?;
        ctx.mark_loaded(Table::SourceUsers);
        Ok(())
    }

    async fn resolve_workflow_states(&self) -> Result<HashMap<String, EntityId>> {
        let workflows = self.destination.list_workflows().await?;
        let Some(workflow) = workflows.first() else {
            bail!("clubhouse returned no workflows");
        };

        let mut state_ids = HashMap::new();
        for (jira_status, state_name) in &self.config.mapping.status {
            let state = workflow
                .states
                .iter()
                .find(|s| &s.name == state_name)
                .ok_or_else(|| MappingError::UnknownWorkflowState(state_name.clone()))?;
            state_ids.insert(jira_status.clone(), state.id);
        }
        Ok(state_ids)
    }

    fn invite_email(&self, user: &JiraUser) -> Option<String> {
        match &self.config.clubhouse.invite_email_template {
            Some(template) => Some(
                template
                    .replace("{key}", &user.key)
                    .replace("{org}", &self.config.clubhouse.org),
            ),
            None => user.email_address.clone(),
        }
    }

    pub async fn migrate_users(
        &self,
        ctx: &mut MigrationContext,
        invitations: &dyn Invitations,
    ) -> Result<Tally> {
        ctx.require(Stage::MigrateUsers)?;
        let mut tally = Tally::default();
        let suffix = &self.config.clubhouse.user_suffix;
        let existing = ctx.mention_names();

        let mut pending: Vec<(&JiraUser, String)> = Vec::new();
        for user in &ctx.source_users {
            let username = clubhouse_username(user, suffix);
            if existing.contains(&username) {
                info!("skipping user: {username}");
                tally.skipped += 1;
                continue;
            }
            match self.invite_email(user) {
                Some(email) => pending.push((user, email)),
                None => {
                    error!(user = %user.key, "no email address for user and no invite_email_template configured");
                    tally.failed += 1;
                }
            }
        }

        if pending.is_empty() {
            return Ok(tally.finish(Stage::MigrateUsers)?);
        }

        info!("inviting {} users", pending.len());
        let emails: Vec<String> = pending.iter().map(|(_, email)| email.clone()).collect();
        let invites = invitations.invite(&emails).await?;
        if invites.len() != pending.len() {
            warn!(
                "requested {} invites but clubhouse returned {}",
                pending.len(),
                invites.len()
            );
            tally.failed += pending.len().saturating_sub(invites.len());
        }

        for (invite, (user, _)) in invites.iter().zip(&pending) {
            let username = clubhouse_username(user, suffix);
            info!("creating user {username}");
            let password = self.config.clubhouse.initial_password.clone();
            let payload = CreateUser {
                name: user.display_name.clone(),
                username: username.clone(),
                password: password.clone(),
                password_confirm: password,
                product_updates: false,
            };
            match invitations.create_user(&invite.id, &payload).await {
                Ok(()) => tally.done += 1,
                Err(e) => {
                    error!(user = %username, invite = %invite.id, "failed to create user: {e:#}");
                    tally.failed += 1;
                }
            }
        }

        Ok(tally.finish(Stage::MigrateUsers)?)
    }

    pub async fn migrate_projects(&self, ctx: &mut MigrationContext) -> Result<Tally> {
        ctx.require(Stage::MigrateProjects)?;
        info!("creating projects if not yet exist");
        let mut tally = Tally::default();

        for project in &ctx.source_projects {
            if ctx.projects.contains_key(&project.key) {
                info!("skipping project: {}", project.key);
                tally.skipped += 1;
                continue;
            }
            info!("creating project: {}", project.key);
            let payload = map_project(project);
            match self.destination.create_project(&payload).await {
                Ok(created) => {
                    ctx.projects.insert(project.key.clone(), created);
                    tally.done += 1;
                }
                Err(e) => {
                    error!(project = %project.key, payload = ?payload, "failed to create project: {e:#}");
                    tally.failed += 1;
                }
            }
        }

        Ok(tally.finish(Stage::MigrateProjects)?)
    }

    pub async fn migrate_files(&self, ctx: &mut MigrationContext) -> Result<Tally> {
        ctx.require(Stage::MigrateFiles)?;
        info!("migrating files");
        let mut tally = Tally::default();

        let mut to_upload: Vec<Attachment> = Vec::new();
        for attachment in ctx.issues.iter().flat_map(|i| &i.issue().fields.attachment) {
            if ctx.files.contains_key(&attachment.id) {
                tally.skipped += 1;
            } else if !to_upload.iter().any(|a| a.id == attachment.id) {
                to_upload.push(attachment.clone());
            }
        }
        info!("{} files to upload.", to_upload.len());

        let total = to_upload.len();
        for attachment in to_upload {
            let uploader_id = match Mapper::new(self.config, ctx).member_id(&attachment.author) {
                Ok(id) => id,
                Err(e) => {
                    error!(attachment = %attachment.id, filename = %attachment.filename, "cannot resolve uploader: {e}");
                    tally.failed += 1;
                    continue;
                }
            };
            match self.upload(&attachment, uploader_id).await {
                Ok(file) => {
                    info!("upload of file: {} completed.", attachment.filename);
                    ctx.files.insert(attachment.id.clone(), file);
                    tally.done += 1;
                    info!("file upload progress: {} / {} files.", tally.done, total);
                }
                Err(e) => {
                    error!(attachment = %attachment.id, filename = %attachment.filename, "file upload failed: {e:#}");
                    tally.failed += 1;
                }
            }
        }

        Ok(tally.finish(Stage::MigrateFiles)?)
    }

    async fn upload(
        &self,
        attachment: &Attachment,
        uploader_id: String,
    ) -> Result<File> {
        info!("downloading file {}", attachment.filename);
        let bytes = self.source.download_attachment(&attachment.content).await?;
        info!("uploading file {}", attachment.filename);
        let uploaded = self
            .destination
            .upload_file(&attachment.filename, bytes)
            .await?;
        let update = UpdateFile {
            external_id: attachment.id.clone(),
            name: attachment.filename.clone(),
            updated_at: normalize_timestamp(&attachment.created),
            uploader_id,
        };
        self.destination.update_file(uploaded.id, &update).await
    }

    pub async fn migrate_epics(&self, ctx: &mut MigrationContext) -> Result<Tally> {
        ctx.require(Stage::MigrateEpics)?;
        let mut tally = Tally::default();

        let mut payloads: Vec<CreateEpic> = Vec::new();
        {
            let mapper = Mapper::new(self.config, ctx);
            for issue in ctx.issues.iter().filter_map(SourceIssue::as_epic) {
                if ctx.epics.contains_key(&issue.key) {
                    info!("skipping epic: {}", issue.key);
                    tally.skipped += 1;
                    continue;
                }
                match mapper.map_epic(issue) {
                    Ok(epic) => payloads.push(epic),
                    Err(e) => {
                        error!(epic = %issue.key, "cannot map epic: {e}");
                        tally.failed += 1;
                    }
                }
            }
        }

        let destination = self.destination;
        let mut results = stream::iter(payloads)
            .map(|payload| async move {
                info!("creating epic: {}", payload.name);
                let result = destination.create_epic(&payload).await;
                (payload, result)
            })
            .buffer_unordered(EPIC_CONCURRENCY);

        while let Some((payload, result)) = results.next().await {
            match result {
                Ok(epic) => {
                    ctx.epics.insert(payload.external_id, epic);
                    tally.done += 1;
                }
                Err(e) => {
                    error!(epic = %payload.external_id, payload = ?payload, "failed to create epic: {e:#}");
                    tally.failed += 1;
                }
            }
        }

        Ok(tally.finish(Stage::MigrateEpics)?)
    }

    pub async fn migrate_issues(&self, ctx: &mut MigrationContext) -> Result<Tally> {
        ctx.require(Stage::MigrateIssues)?;
        let mut tally = Tally::default();

        let mut payloads: Vec<MappedStory> = Vec::new();
        let mut marks: Vec<String> = Vec::new();
        {
            let mapper = Mapper::new(self.config, ctx);
            for issue in ctx.issues.iter().filter_map(SourceIssue::as_regular) {
                if ctx.stories.contains_key(&issue.key) {
                    info!("skipping story: {}", issue.key);
                    tally.skipped += 1;
                    // A re-run must still archive the labels of stories created earlier.
                    match synthesize_labels(issue, &self.config.jira.fields) {
                        Ok(labels) => marks.extend(labels.archive),
                        Err(e) => warn!(issue = %issue.key, "cannot derive labels: {e}"),
                    }
                    continue;
                }
                match mapper.map_story(issue) {
                    Ok(mapped) => payloads.push(mapped),
                    Err(e) => {
                        error!(issue = %issue.key, "cannot map issue: {e}");
                        tally.failed += 1;
                    }
                }
            }
        }
        ctx.labels_to_archive.extend(marks);

        let destination = self.destination;
        let mut results = stream::iter(payloads)
            .map(|mapped| async move {
                info!("creating story: {}", mapped.story.name);
                let result = destination.create_story(&mapped.story).await;
                (mapped, result)
            })
            .buffer_unordered(STORY_CONCURRENCY);

        while let Some((mapped, result)) = results.next().await {
            match result {
                Ok(story) => {
                    ctx.labels_to_archive.extend(mapped.archive);
                    ctx.stories.insert(mapped.story.external_id, story);
                    tally.done += 1;
                }
                Err(e) => {
                    error!(
                        issue = %mapped.story.external_id,
                        payload = ?mapped.story,
                        "failed to create story: {e:#}"
                    );
                    tally.failed += 1;
                }
            }
        }

        ctx.mark_loaded(Table::LabelMarks);
        Ok(tally.finish(Stage::MigrateIssues)?)
    }

    pub async fn migrate_links(&self, ctx: &mut MigrationContext) -> Result<Tally> {
        ctx.require(Stage::MigrateLinks)?;
        info!("creating missing story links");
        let mut tally = Tally::default();

        ctx.link_keys.extend(existing_link_keys(&ctx.stories));
        let requests = reconcile(
            ctx.issues.iter().filter_map(SourceIssue::as_regular),
            &mut ctx.link_keys,
        );

        for request in requests {
            let verb = request.verb();
            info!(
                "creating story link: {} {} {}",
                request.inward_key,
                verb.as_str(),
                request.outward_key
            );
            let subject = ctx.stories.get(&request.inward_key).map(|s| s.id);
            let object = ctx.stories.get(&request.outward_key).map(|s| s.id);
            let (Some(subject_id), Some(object_id)) = (subject, object) else {
                if subject.is_none() {
                    warn!(
                        "missing subject in story link: {} {:?} {}",
                        request.inward_key, request.link_type, request.outward_key
                    );
                }
                if object.is_none() {
                    warn!(
                        "missing object in story link: {} {:?} {}",
                        request.inward_key, request.link_type, request.outward_key
                    );
                }
                tally.skipped += 1;
                continue;
            };

            let payload = CreateStoryLink {
                verb,
                subject_id,
                object_id,
            };
            match self.destination.create_story_link(&payload).await {
                Ok(link) => {
                    if let Some(story) = ctx.stories.get_mut(&request.inward_key) {
                        story.story_links.push(link);
                    }
                    tally.done += 1;
                }
                Err(e) => {
                    error!(link = ?request, payload = ?payload, "failed to create story link: {e:#}");
                    tally.failed += 1;
                }
            }
        }

        info!("completed migration of issue links");
        Ok(tally.finish(Stage::MigrateLinks)?)
    }

    pub async fn archive_labels(&self, ctx: &mut MigrationContext) -> Result<Tally> {
        ctx.require(Stage::ArchiveLabels)?;
        info!("archiving labels of old sprints etc.");
        let mut tally = Tally::default();
        let existing = self.destination.list_labels().await?;

        for name in &ctx.labels_to_archive {
            let Some(label) = existing.iter().find(|l| &l.name == name) else {
                warn!("label {name} does not exist on clubhouse; nothing to archive");
                tally.skipped += 1;
                continue;
            };
            if label.archived {
                tally.skipped += 1;
                continue;
            }
            info!("archiving label: {name}");
            match self.destination.archive_label(label.id).await {
                Ok(()) => tally.done += 1,
                Err(e) => {
                    error!(label = %name, id = label.id, "failed to archive label: {e:#}");
                    tally.failed += 1;
                }
            }
        }

        info!("completed archiving of old labels");
        Ok(tally.finish(Stage::ArchiveLabels)?)
    }

    /// Prefix every migrated Jira issue's description with a link to its
    /// Clubhouse counterpart. Stories first, then epics.
    pub async fn backlink_source(&self, ctx: &mut MigrationContext) -> Result<Tally> {
        ctx.require(Stage::BacklinkSource)?;
        info!("updating jira issues and epics with clubhouse link...");
        let mut tally = Tally::default();

        let issues: HashMap<&str, &Issue> = ctx
            .issues
            .iter()
            .map(|i| (i.key(), i.issue()))
            .collect();

        let mut stories: Vec<(&str, EntityId)> =
            ctx.stories.iter().map(|(k, s)| (k.as_str(), s.id)).collect();
        stories.sort();
        let mut epics: Vec<(&str, EntityId)> =
            ctx.epics.iter().map(|(k, e)| (k.as_str(), e.id)).collect();
        epics.sort();

        let targets = stories
            .into_iter()
            .map(|(key, id)| ("story", key, id))
            .chain(epics.into_iter().map(|(key, id)| ("epic", key, id)));

        for (kind, key, id) in targets {
            let Some(issue) = issues.get(key) else {
                error!("could not find jira issue with key: {key}. skipping clubhouse {kind}: {id}");
                tally.skipped += 1;
                continue;
            };
            let marker = format!(
                "moved to clubhouse: https://app.clubhouse.io/{}/{}/{}",
                self.config.clubhouse.org, kind, id
            );
            let description = issue.fields.description.as_deref().unwrap_or_default();
            if description.starts_with(&marker) {
                tally.skipped += 1;
                continue;
            }
            info!("updating jira {kind}: {key} with link to clubhouse {kind}: {id}");
            let updated = format!("{marker}\n\n{description}");
            match self.source.update_description(key, &updated).await {
                Ok(()) => tally.done += 1,
                Err(e) => {
                    error!(issue = %key, "failed to update jira issue: {e:#}");
                    tally.failed += 1;
                }
            }
        }

        Ok(tally.finish(Stage::BacklinkSource)?)
    }
}
