use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::model::jira::{Issue, JiraProject, JiraUser};

const PROJECTS: &str = "projects.json";
const USERS: &str = "users.json";
const ISSUES: &str = "issues.json";

/// The local Jira extract: three pretty-printed JSON files, rewritten on
/// every download.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        if !path.exists() {
            bail!("{} not found. Run `downloadJira` first.", path.display());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save_projects(&self, projects: &[Value]) -> Result<()> {
        self.write(PROJECTS, projects)
    }

    pub fn save_users(&self, users: &[Value]) -> Result<()> {
        self.write(USERS, users)
    }

    pub fn save_issues(&self, issues: &[Value]) -> Result<()> {
        self.write(ISSUES, issues)
    }

    pub fn load_projects(&self) -> Result<Vec<JiraProject>> {
        self.read(PROJECTS)
    }

    pub fn load_users(&self) -> Result<Vec<JiraUser>> {
        self.read(USERS)
    }

    pub fn load_issues(&self) -> Result<Vec<Issue>> {
        self.read(ISSUES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::fixtures::{user, IssueBuilder};
    use serde_json::json;

    #[test]
    fn round_trips_extract() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("data"));

        store
            .save_projects(&[json!({ "id": "1", "key": "CI", "name": "Core", "lead": {} })])
            .unwrap();
        store.save_users(&[user("alice")]).unwrap();
        store
            .save_issues(&[IssueBuilder::story("CI-1").json()])
            .unwrap();

        assert_eq!(store.load_projects().unwrap()[0].key, "CI");
        assert_eq!(store.load_users().unwrap()[0].display_name, "ALICE");
        assert_eq!(store.load_issues().unwrap()[0].key, "CI-1");

        let raw = std::fs::read_to_string(store.dir().join("projects.json")).unwrap();
        assert!(raw.contains("\n  "), "extract is pretty-printed");
    }

    #[test]
    fn save_overwrites_previous_download() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.save_users(&[user("alice"), user("bob")]).unwrap();
        store.save_users(&[user("carol")]).unwrap();
        let users = store.load_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].key, "carol");
    }

    #[test]
    fn missing_extract_points_at_download_step() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalStore::new(dir.path()).load_issues().unwrap_err();
        assert!(err.to_string().contains("downloadJira"));
    }
}
