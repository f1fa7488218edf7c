use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{ensure_success, Invitations};
use crate::config::ClubhouseConfig;
use crate::model::clubhouse::{CreateUser, Invite};

const BETA_BASE: &str = "https://api.clubhouse.io/api/beta";

/// Talks to the web app endpoints with a browser session cookie instead of an
/// API token.
pub struct SessionProvider {
    organization_id: String,
    cookie: String,
    client: reqwest::Client,
}

impl SessionProvider {
    pub fn new(config: &ClubhouseConfig) -> Self {
        Self {
            organization_id: config.organization_id.clone(),
            cookie: config.session_cookie.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn post(&self, path: &str, cookie: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{BETA_BASE}{path}"))
            .header("Clubhouse-Organization", &self.organization_id)
            .header("Content-Type", "application/json; charset=UTF-8")
            .header("Cookie", cookie)
    }
}

#[async_trait]
impl Invitations for SessionProvider {
    async fn invite(&self, emails: &[String]) -> Result<Vec<Invite>> {
        let body = serde_json::json!({ "emails": emails.join(",") });
        let resp = self
            .post("/invites", &self.cookie)
            .json(&body)
            .send()
            .await
            .context("Clubhouse invite request failed")?;
        let resp = ensure_success(resp, "Clubhouse").await?;
        resp.json().await.context("Failed to parse invites")
    }

    async fn create_user(&self, invite_id: &str, user: &CreateUser) -> Result<()> {
        // Accepting an invite must not carry the inviting admin's session.
        let resp = self
            .post(&format!("/invites/{invite_id}/create-user"), "")
            .json(user)
            .send()
            .await
            .with_context(|| format!("Creating user {} failed", user.username))?;
        ensure_success(resp, "Clubhouse").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn session_headers() {
        let mut config = test_config().clubhouse;
        config.organization_id = "org-1".into();
        config.session_cookie = "clubhouse-session=abc".into();
        let provider = SessionProvider::new(&config);

        let invite = provider.post("/invites", &provider.cookie).build().unwrap();
        assert_eq!(invite.url().as_str(), "https://api.clubhouse.io/api/beta/invites");
        assert_eq!(invite.headers()["Clubhouse-Organization"], "org-1");
        assert_eq!(invite.headers()["Cookie"], "clubhouse-session=abc");

        let accept = provider
            .post("/invites/i-1/create-user", "")
            .build()
            .unwrap();
        assert_eq!(accept.headers()["Cookie"], "");
    }
}
