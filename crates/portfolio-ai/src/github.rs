//! GitHub public repository listing.

use async_trait::async_trait;

use crate::client::{RepoInfo, RepoSource};
use crate::error::AiError;

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "portfolio-app";
// The mercy preview media type includes `topics` in repo listings.
const ACCEPT: &str = "application/vnd.github.mercy-preview+json";

#[derive(Clone, Debug)]
pub struct GithubClient {
    client: reqwest::Client,
    base_url: String,
}

impl GithubClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: API_BASE.to_string(),
        }
    }

    fn repos_url(&self, username: &str) -> String {
        format!(
            "{}/users/{}/repos?per_page=100&sort=updated",
            self.base_url, username
        )
    }
}

/// Drop private repositories.
pub fn public_only(repos: Vec<RepoInfo>) -> Vec<RepoInfo> {
    repos.into_iter().filter(|r| !r.private).collect()
}

#[async_trait]
impl RepoSource for GithubClient {
    async fn public_repos(&self, username: &str) -> Result<Vec<RepoInfo>, AiError> {
        if username.is_empty() {
            return Err(AiError::NotConfigured("github.username"));
        }

        let resp = self
            .client
            .get(self.repos_url(username))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send()
            .await?;

        match resp.status().as_u16() {
            200 => {}
            404 => return Err(AiError::GithubUserNotFound),
            other => return Err(AiError::GithubStatus(other)),
        }

        let repos: Vec<RepoInfo> = resp.json().await?;
        Ok(public_only(repos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repos_url() {
        let gh = GithubClient::new(reqwest::Client::new());
        assert_eq!(
            gh.repos_url("octocat"),
            "https://api.github.com/users/octocat/repos?per_page=100&sort=updated"
        );
    }

    #[test]
    fn test_repo_parsing_and_private_filter() {
        let json = r#"[
            {"name":"site","full_name":"me/site","description":null,"html_url":"https://github.com/me/site","topics":["rust","web"],"private":false},
            {"name":"secret","full_name":"me/secret","description":"x","html_url":"https://github.com/me/secret","private":true}
        ]"#;
        let repos: Vec<RepoInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].description, None);
        assert!(repos[1].topics.is_empty());

        let public = public_only(repos);
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].name, "site");
        assert_eq!(public[0].topics, vec!["rust", "web"]);
    }

    #[tokio::test]
    async fn test_empty_username_is_config_error() {
        let gh = GithubClient::new(reqwest::Client::new());
        let err = gh.public_repos("").await.unwrap_err();
        assert!(matches!(err, AiError::NotConfigured("github.username")));
    }
}
