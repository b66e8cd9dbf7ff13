#![allow(async_fn_in_trait)]

use anyhow::Context;
use anyhow::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::instrument;

use super::github_curl::GithubCurlClient;
use crate::config::Config;
use crate::error::Error;

// -----------------------------------------------------------------------------
// RepositoryOps trait

/// Operations on the hosted GitOps repository.
///
/// Every mutating call changes remote state and none of them are idempotent.
#[cfg_attr(test, automock)]
pub trait RepositoryOps {
    /// Branch new work starts from and pull requests target.
    fn default_branch(&self) -> String;

    /// Read a file at `git_ref`. Fails with `NotFound` if it does not exist.
    async fn read_file(&self, path: &str, git_ref: &str) -> Result<RepositoryFile>;

    /// List the services (subdirectories) of `path` at `git_ref`.
    async fn list_directory(&self, path: &str, git_ref: &str) -> Result<Vec<Service>>;

    /// Create branch `name` pointing at the tip of `from_ref`. Fails with
    /// `Conflict` if the branch already exists.
    async fn create_branch(&self, name: &str, from_ref: &str) -> Result<()>;

    /// Commit new `content` for `path` on `branch`. `sha` is the blob sha the
    /// edit was based on; a stale sha fails with `Conflict`.
    async fn update_file(
        &self,
        path: &str,
        message: &str,
        content: &str,
        sha: &str,
        branch: &str,
    ) -> Result<()>;

    /// Open a pull request merging `head` into `base`.
    async fn create_pull_request(
        &self,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest>;
}

// -----------------------------------------------------------------------------
// Types

/// A file read from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryFile {
    pub path: String,
    /// Blob sha, required to update the file.
    pub sha: String,
    pub content: String,
}

/// A deployable service, one directory under `envs/{env}/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
}

/// Client to interact with GitHub API.
pub struct GithubClient {
    owner: String,
    repo: String,
    default_branch: String,
    http_client: GithubCurlClient,
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct ContentFile {
    path: String,
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestResponse {
    number: u64,
    html_url: String,
}

#[derive(Debug, Serialize)]
struct CreateRef<'a> {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateContents<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Debug, Serialize)]
struct CreatePullRequest<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

// -----------------------------------------------------------------------------
// GithubClient impl

impl GithubClient {
    /// Resolve the configured repository, failing with `Auth` or `NotFound`
    /// if the token is rejected or the repository is unknown.
    #[instrument(skip_all, fields(repository = %config.repository))]
    pub async fn resolve(config: &Config) -> Result<Self> {
        let (owner, repo) = split_repository(&config.repository)?;
        let http_client = GithubCurlClient::new(config.github_token.clone());

        let url = format!("https://api.github.com/repos/{}/{}", owner, repo);
        let response = http_client
            .get(&url)
            .await
            .with_context(|| format!("Failed to retrieve repository {}", config.repository))?;
        let info: RepositoryResponse = serde_json::from_str(&response)?;
        debug!(default_branch = %info.default_branch, "resolved repository");

        Ok(Self {
            owner,
            repo,
            default_branch: info.default_branch,
            http_client,
        })
    }

    fn api_url(&self, suffix: &str) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/{}",
            self.owner, self.repo, suffix
        )
    }

    /// Get the commit sha a branch points at
    #[instrument(skip_all)]
    async fn branch_tip(&self, branch: &str) -> Result<String> {
        let url = self.api_url(&format!("git/ref/heads/{}", branch));
        let response = self.http_client.get(&url).await?;
        let git_ref: GitRef = serde_json::from_str(&response)?;
        Ok(git_ref.object.sha)
    }
}

impl RepositoryOps for GithubClient {
    fn default_branch(&self) -> String {
        self.default_branch.clone()
    }

    #[instrument(skip_all, fields(path = %path, git_ref = %git_ref))]
    async fn read_file(&self, path: &str, git_ref: &str) -> Result<RepositoryFile> {
        let url = self.api_url(&format!("contents/{}?ref={}", path, git_ref));
        let response = self.http_client.get(&url).await?;
        let file: ContentFile = serde_json::from_str(&response)
            .map_err(|_| Error::NotFound(format!("{} is not a file", path)))?;

        let content = decode_content(&file.content, &file.encoding)?;
        Ok(RepositoryFile {
            path: file.path,
            sha: file.sha,
            content,
        })
    }

    #[instrument(skip_all, fields(path = %path, git_ref = %git_ref))]
    async fn list_directory(&self, path: &str, git_ref: &str) -> Result<Vec<Service>> {
        let url = self.api_url(&format!("contents/{}?ref={}", path, git_ref));
        let response = self.http_client.get(&url).await?;
        let entries: Vec<ContentEntry> = serde_json::from_str(&response)
            .map_err(|_| Error::NotFound(format!("{} is not a directory", path)))?;

        Ok(services_from_entries(entries))
    }

    #[instrument(skip_all, fields(name = %name, from_ref = %from_ref))]
    async fn create_branch(&self, name: &str, from_ref: &str) -> Result<()> {
        let sha = self.branch_tip(from_ref).await?;

        let request_body = CreateRef {
            ref_name: format!("refs/heads/{}", name),
            sha: &sha,
        };
        let json_data = serde_json::to_string(&request_body)?;
        self.http_client
            .post(&self.api_url("git/refs"), &json_data)
            .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(path = %path, branch = %branch))]
    async fn update_file(
        &self,
        path: &str,
        message: &str,
        content: &str,
        sha: &str,
        branch: &str,
    ) -> Result<()> {
        let request_body = UpdateContents {
            message,
            content: BASE64.encode(content),
            sha,
            branch,
        };
        let json_data = serde_json::to_string(&request_body)?;
        self.http_client
            .put(&self.api_url(&format!("contents/{}", path)), &json_data)
            .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(base = %base, head = %head))]
    async fn create_pull_request(
        &self,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let request_body = CreatePullRequest {
            title,
            body,
            head,
            base,
        };
        let json_data = serde_json::to_string(&request_body)?;
        let response = self
            .http_client
            .post(&self.api_url("pulls"), &json_data)
            .await?;
        let pr: PullRequestResponse = serde_json::from_str(&response)?;
        Ok(PullRequest {
            number: pr.number,
            html_url: pr.html_url,
        })
    }
}

// -----------------------------------------------------------------------------
// Helpers

/// Split `owner/repo` into its parts
fn split_repository(name: &str) -> Result<(String, String), Error> {
    match name.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(Error::NotFound(format!(
            "'{}' is not an owner/repo name",
            name
        ))),
    }
}

/// Decode file content as returned by the contents API
fn decode_content(content: &str, encoding: &str) -> Result<String> {
    if encoding != "base64" {
        return Ok(content.to_string());
    }

    // GitHub wraps the base64 payload at 60 columns
    let compact: String = content.split_whitespace().collect();
    let bytes = BASE64
        .decode(compact)
        .context("Failed to decode file content")?;
    String::from_utf8(bytes).context("File content is not valid UTF-8")
}

fn services_from_entries(entries: Vec<ContentEntry>) -> Vec<Service> {
    entries
        .into_iter()
        .filter(|entry| entry.kind == "dir")
        .map(|entry| Service::new(entry.name))
        .collect()
}
