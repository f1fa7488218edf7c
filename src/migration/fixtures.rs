use serde_json::{json, Value};

use crate::model::jira::Issue;

pub fn user(key: &str) -> Value {
    json!({
        "key": key,
        "name": key,
        "displayName": key.to_uppercase(),
        "emailAddress": format!("{key}@acme.com"),
    })
}

pub struct IssueBuilder {
    value: Value,
}

impl IssueBuilder {
    pub fn new(key: &str, issue_type: &str) -> Self {
        let project = key.split('-').next().unwrap_or(key);
        Self {
            value: json!({
                "id": format!("id-{key}"),
                "key": key,
                "fields": {
                    "summary": format!("summary of {key}"),
                    "description": null,
                    "issuetype": { "name": issue_type },
                    "project": { "key": project },
                    "status": { "name": "To Do" },
                    "created": "2017-09-01T10:15:30.000+0200",
                    "updated": "2017-09-02T10:15:30.000+0200",
                    "creator": user("alice"),
                    "assignee": null,
                    "comment": { "comments": [] },
                    "issuelinks": [],
                    "attachment": [],
                    "fixVersions": [],
                }
            }),
        }
    }

    pub fn story(key: &str) -> Self {
        Self::new(key, "Story")
    }

    pub fn epic(key: &str) -> Self {
        Self::new(key, "Epic")
    }

    fn fields(&mut self) -> &mut Value {
        &mut self.value["fields"]
    }

    fn push(&mut self, field: &str, item: Value) {
        if let Some(items) = self.fields()[field].as_array_mut() {
            items.push(item);
        }
    }

    pub fn status(mut self, status: &str) -> Self {
        self.fields()["status"] = json!({ "name": status });
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.fields()["description"] = json!(text);
        self
    }

    pub fn assignee(mut self, key: &str) -> Self {
        self.fields()["assignee"] = user(key);
        self
    }

    pub fn creator(mut self, key: &str) -> Self {
        self.fields()["creator"] = user(key);
        self
    }

    pub fn links_to(mut self, id: &str, link_type: &str, other: &str) -> Self {
        self.push(
            "issuelinks",
            json!({ "id": id, "type": { "name": link_type }, "outwardIssue": { "key": other } }),
        );
        self
    }

    pub fn linked_from(mut self, id: &str, link_type: &str, other: &str) -> Self {
        self.push(
            "issuelinks",
            json!({ "id": id, "type": { "name": link_type }, "inwardIssue": { "key": other } }),
        );
        self
    }

    pub fn parent(mut self, key: &str) -> Self {
        self.fields()["parent"] = json!({ "key": key });
        self
    }

    pub fn attachment(mut self, id: &str, filename: &str) -> Self {
        self.push(
            "attachment",
            json!({
                "id": id,
                "filename": filename,
                "author": user("alice"),
                "created": "2017-09-01T11:00:00.000+0200",
                "content": format!("https://acme.atlassian.net/secure/attachment/{id}/{filename}"),
            }),
        );
        self
    }

    pub fn comment(mut self, id: &str, author: &str, body: &str) -> Self {
        if let Some(comments) = self.fields()["comment"]["comments"].as_array_mut() {
            comments.push(json!({
                "id": id,
                "author": user(author),
                "body": body,
                "created": "2017-09-03T09:00:00.000+0000",
                "updated": "2017-09-03T09:30:00.000+0000",
            }));
        }
        self
    }

    pub fn fix_version(mut self, name: &str, release_date: Option<&str>) -> Self {
        self.push("fixVersions", json!({ "name": name, "releaseDate": release_date }));
        self
    }

    pub fn custom(mut self, field: &str, value: Value) -> Self {
        self.fields()[field] = value;
        self
    }

    pub fn watchers(mut self, keys: &[&str]) -> Self {
        self.fields()["watchers"] = Value::Array(keys.iter().map(|k| user(k)).collect());
        self
    }

    pub fn json(self) -> Value {
        self.value
    }

    pub fn build(self) -> Issue {
        serde_json::from_value(self.value).unwrap()
    }
}
