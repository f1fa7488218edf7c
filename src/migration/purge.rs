use anyhow::Result;
use futures::future::try_join_all;
use futures::stream::{self, TryStreamExt};
use tracing::info;

use super::STORY_CONCURRENCY;
use crate::providers::Destination;

/// Empties a Clubhouse workspace. Members are never touched.
pub struct Purger<'a> {
    destination: &'a dyn Destination,
}

impl<'a> Purger<'a> {
    pub fn new(destination: &'a dyn Destination) -> Self {
        Self { destination }
    }

    /// Stories go first so that epics, projects, labels and files are no
    /// longer referenced when they are deleted.
    pub async fn purge_all(&self) -> Result<()> {
        self.delete_stories().await?;
        self.delete_epics().await?;
        self.delete_projects().await?;
        self.delete_labels().await?;
        self.delete_files().await?;
        info!("clubhouse purge completed");
        Ok(())
    }

    pub async fn delete_stories(&self) -> Result<()> {
        let projects = self.destination.list_projects().await?;
        let per_project = try_join_all(
            projects
                .iter()
                .map(|project| self.destination.list_project_stories(project.id)),
        )
        .await?;
        let stories: Vec<_> = per_project.into_iter().flatten().collect();

        let destination = self.destination;
        stream::iter(stories.into_iter().map(Ok::<_, anyhow::Error>))
            .try_for_each_concurrent(STORY_CONCURRENCY, |story| async move {
                info!("deleting story: {}", story.name);
                destination.delete_story(story.id).await
            })
            .await
    }

    pub async fn delete_epics(&self) -> Result<()> {
        for epic in self.destination.list_epics().await? {
            info!("deleting epic: {}", epic.name);
            self.destination.delete_epic(epic.id).await?;
        }
        Ok(())
    }

    pub async fn delete_projects(&self) -> Result<()> {
        for project in self.destination.list_projects().await? {
            info!("deleting project: {}", project.name);
            self.destination.delete_project(project.id).await?;
        }
        Ok(())
    }

    pub async fn delete_labels(&self) -> Result<()> {
        for label in self.destination.list_labels().await? {
            info!("deleting label: {}", label.name);
            self.destination.delete_label(label.id).await?;
        }
        Ok(())
    }

    pub async fn delete_files(&self) -> Result<()> {
        for file in self.destination.list_files().await? {
            info!("deleting file: {}", file.name);
            self.destination.delete_file(file.id).await?;
        }
        Ok(())
    }
}
