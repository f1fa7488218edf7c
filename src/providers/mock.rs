use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::{Destination, Invitations, Source};
use crate::model::clubhouse::{
    CreateEpic, CreateProject, CreateStory, CreateStoryLink, CreateUser, EntityId, Epic, File,
    Invite, Label, Member, Profile, Project, Story, StoryLink, UpdateFile, Workflow, WorkflowState,
};
use crate::model::jira::SearchPage;

#[derive(Default)]
pub struct DestinationState {
    next_id: EntityId,
    pub projects: Vec<Project>,
    pub epics: Vec<(Epic, CreateEpic)>,
    pub stories: Vec<(Story, CreateStory)>,
    pub links: Vec<StoryLink>,
    pub labels: Vec<Label>,
    pub files: Vec<File>,
    pub members: Vec<Member>,
    pub workflows: Vec<Workflow>,
}

impl DestinationState {
    fn next_id(&mut self) -> EntityId {
        self.next_id += 1;
        self.next_id
    }

    fn story_with_links(&self, story: &Story) -> Story {
        let mut story = story.clone();
        story.story_links = self
            .links
            .iter()
            .filter(|l| l.subject_id == story.id || l.object_id == story.id)
            .cloned()
            .collect();
        story
    }

    pub fn entity_count(&self) -> usize {
        self.projects.len()
            + self.epics.len()
            + self.stories.len()
            + self.links.len()
            + self.labels.len()
            + self.files.len()
    }
}

pub struct MockDestination {
    pub state: Mutex<DestinationState>,
    /// Story creation fails for these external ids.
    pub failing_stories: Mutex<HashSet<String>>,
}

impl MockDestination {
    pub fn new(mention_names: &[&str]) -> Self {
        let mut state = DestinationState::default();
        for (i, name) in mention_names.iter().enumerate() {
            state.members.push(Member {
                id: format!("member-{i}"),
                profile: Profile {
                    mention_name: name.to_string(),
                    name: None,
                },
            });
        }
        state.workflows.push(Workflow {
            id: 1,
            states: [
                (500, "Unscheduled"),
                (501, "In Development"),
                (502, "Ready for Review"),
                (503, "Completed"),
            ]
            .into_iter()
            .map(|(id, name)| WorkflowState {
                id,
                name: name.to_string(),
            })
            .collect(),
        });
        state.next_id = 1000;
        Self {
            state: Mutex::new(state),
            failing_stories: Mutex::new(HashSet::new()),
        }
    }

    pub fn member_id(&self, mention_name: &str) -> String {
        self.state
            .lock()
            .unwrap()
            .members
            .iter()
            .find(|m| m.profile.mention_name == mention_name)
            .map(|m| m.id.clone())
            .unwrap()
    }

    pub fn story_id(&self, external_id: &str) -> EntityId {
        self.state
            .lock()
            .unwrap()
            .stories
            .iter()
            .find(|(s, _)| s.external_id.as_deref() == Some(external_id))
            .map(|(s, _)| s.id)
            .unwrap()
    }
}

#[async_trait]
impl Destination for MockDestination {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.state.lock().unwrap().projects.clone())
    }

    async fn create_project(&self, project: &CreateProject) -> Result<Project> {
        let mut state = self.state.lock().unwrap();
        let created = Project {
            id: state.next_id(),
            name: project.name.clone(),
            external_id: Some(project.external_id.clone()),
        };
        state.projects.push(created.clone());
        Ok(created)
    }

    async fn delete_project(&self, id: EntityId) -> Result<()> {
        self.state.lock().unwrap().projects.retain(|p| p.id != id);
        Ok(())
    }

    async fn list_epics(&self) -> Result<Vec<Epic>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .epics
            .iter()
            .map(|(e, _)| e.clone())
            .collect())
    }

    async fn create_epic(&self, epic: &CreateEpic) -> Result<Epic> {
        let mut state = self.state.lock().unwrap();
        let created = Epic {
            id: state.next_id(),
            name: epic.name.clone(),
            external_id: Some(epic.external_id.clone()),
        };
        state.epics.push((created.clone(), epic.clone()));
        Ok(created)
    }

    async fn delete_epic(&self, id: EntityId) -> Result<()> {
        self.state.lock().unwrap().epics.retain(|(e, _)| e.id != id);
        Ok(())
    }

    async fn search_stories(&self) -> Result<Vec<Story>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .stories
            .iter()
            .map(|(s, _)| state.story_with_links(s))
            .collect())
    }

    async fn list_project_stories(&self, project_id: EntityId) -> Result<Vec<Story>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .stories
            .iter()
            .filter(|(_, payload)| payload.project_id == project_id)
            .map(|(s, _)| state.story_with_links(s))
            .collect())
    }

    async fn create_story(&self, story: &CreateStory) -> Result<Story> {
        if self
            .failing_stories
            .lock()
            .unwrap()
            .contains(&story.external_id)
        {
            anyhow::bail!("Clubhouse API error (422): rejected {}", story.external_id);
        }
        let mut state = self.state.lock().unwrap();
        for label in &story.labels {
            if !state.labels.iter().any(|l| l.name == label.name) {
                let id = state.next_id();
                state.labels.push(Label {
                    id,
                    name: label.name.clone(),
                    archived: false,
                });
            }
        }
        let created = Story {
            id: state.next_id(),
            name: story.name.clone(),
            external_id: Some(story.external_id.clone()),
            story_links: Vec::new(),
        };
        state.stories.push((created.clone(), story.clone()));
        Ok(created)
    }

    async fn delete_story(&self, id: EntityId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.stories.retain(|(s, _)| s.id != id);
        state.links.retain(|l| l.subject_id != id && l.object_id != id);
        Ok(())
    }

    async fn create_story_link(&self, link: &CreateStoryLink) -> Result<StoryLink> {
        let mut state = self.state.lock().unwrap();
        let duplicate = state.links.iter().any(|l| {
            (l.subject_id == link.subject_id && l.object_id == link.object_id)
                || (l.subject_id == link.object_id && l.object_id == link.subject_id)
        });
        if duplicate {
            anyhow::bail!("Clubhouse API error (400): link already exists");
        }
        let created = StoryLink {
            id: state.next_id(),
            verb: link.verb,
            subject_id: link.subject_id,
            object_id: link.object_id,
        };
        state.links.push(created.clone());
        Ok(created)
    }

    async fn list_labels(&self) -> Result<Vec<Label>> {
        Ok(self.state.lock().unwrap().labels.clone())
    }

    async fn archive_label(&self, id: EntityId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.labels.iter_mut().find(|l| l.id == id) {
            Some(label) => {
                label.archived = true;
                Ok(())
            }
            None => anyhow::bail!("Clubhouse API error (404): label {id}"),
        }
    }

    async fn delete_label(&self, id: EntityId) -> Result<()> {
        self.state.lock().unwrap().labels.retain(|l| l.id != id);
        Ok(())
    }

    async fn list_files(&self) -> Result<Vec<File>> {
        Ok(self.state.lock().unwrap().files.clone())
    }

    async fn upload_file(&self, filename: &str, _bytes: Vec<u8>) -> Result<File> {
        let mut state = self.state.lock().unwrap();
        let created = File {
            id: state.next_id(),
            name: filename.to_string(),
            external_id: None,
        };
        state.files.push(created.clone());
        Ok(created)
    }

    async fn update_file(&self, id: EntityId, update: &UpdateFile) -> Result<File> {
        let mut state = self.state.lock().unwrap();
        match state.files.iter_mut().find(|f| f.id == id) {
            Some(file) => {
                file.external_id = Some(update.external_id.clone());
                file.name = update.name.clone();
                Ok(file.clone())
            }
            None => anyhow::bail!("Clubhouse API error (404): file {id}"),
        }
    }

    async fn delete_file(&self, id: EntityId) -> Result<()> {
        self.state.lock().unwrap().files.retain(|f| f.id != id);
        Ok(())
    }

    async fn list_members(&self) -> Result<Vec<Member>> {
        Ok(self.state.lock().unwrap().members.clone())
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>> {
        Ok(self.state.lock().unwrap().workflows.clone())
    }
}

#[derive(Default)]
pub struct MockSource {
    pub projects: Vec<Value>,
    pub users: Vec<Value>,
    pub issues: Vec<Value>,
    pub watchers: HashMap<String, Vec<Value>>,
    pub attachments: HashMap<String, Vec<u8>>,
    pub updated: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Source for MockSource {
    async fn list_projects(&self) -> Result<Vec<Value>> {
        Ok(self.projects.clone())
    }

    async fn search_users(&self) -> Result<Vec<Value>> {
        Ok(self.users.clone())
    }

    async fn search_issues(&self, start_at: usize, max_results: u32) -> Result<SearchPage> {
        let issues = self
            .issues
            .iter()
            .skip(start_at)
            .take(max_results as usize)
            .cloned()
            .collect();
        Ok(SearchPage {
            total: self.issues.len(),
            issues,
        })
    }

    async fn list_watchers(&self, issue_key: &str) -> Result<Vec<Value>> {
        Ok(self.watchers.get(issue_key).cloned().unwrap_or_default())
    }

    async fn download_attachment(&self, content_url: &str) -> Result<Vec<u8>> {
        match self.attachments.get(content_url) {
            Some(bytes) => Ok(bytes.clone()),
            None => anyhow::bail!("Jira API error (404): {content_url}"),
        }
    }

    async fn update_description(&self, issue_key: &str, description: &str) -> Result<()> {
        self.updated
            .lock()
            .unwrap()
            .push((issue_key.to_string(), description.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockInvitations {
    pub invited: Mutex<Vec<String>>,
    pub created: Mutex<Vec<(String, CreateUser)>>,
}

#[async_trait]
impl Invitations for MockInvitations {
    async fn invite(&self, emails: &[String]) -> Result<Vec<Invite>> {
        let mut invited = self.invited.lock().unwrap();
        let start = invited.len();
        invited.extend(emails.iter().cloned());
        Ok((start..start + emails.len())
            .map(|i| Invite {
                id: format!("invite-{i}"),
            })
            .collect())
    }

    async fn create_user(&self, invite_id: &str, user: &CreateUser) -> Result<()> {
        self.created
            .lock()
            .unwrap()
            .push((invite_id.to_string(), user.clone()));
        Ok(())
    }
}
