use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::Error;

const GITHUB_JSON: &str = "application/vnd.github+json";

/// HTTP client using curl for making GitHub API requests
pub struct GithubCurlClient {
    token: String,
}

#[derive(Debug, Deserialize)]
struct GitHubError {
    message: String,
    #[serde(default)]
    errors: Vec<GitHubErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl GithubCurlClient {
    pub fn new(token: String) -> Self {
        Self { token }
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<String> {
        self.request("GET", url, None).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, json_data: &str) -> Result<String> {
        self.request("POST", url, Some(json_data)).await
    }

    /// Make a PUT request
    pub async fn put(&self, url: &str, json_data: &str) -> Result<String> {
        self.request("PUT", url, Some(json_data)).await
    }

    async fn request(&self, method: &str, url: &str, json_data: Option<&str>) -> Result<String> {
        let auth = format!("Authorization: Bearer {}", self.token);
        let accept = format!("Accept: {}", GITHUB_JSON);

        let mut args = vec![
            "-s",
            "-w",
            "\n%{http_code}",
            "-X",
            method,
            "-H",
            auth.as_str(),
            "-H",
            accept.as_str(),
            "-H",
            "X-GitHub-Api-Version: 2022-11-28",
            "-H",
            "User-Agent: gitops-pause",
        ];
        if let Some(data) = json_data {
            args.extend(["-H", "Content-Type: application/json", "-d", data]);
        }
        args.push(url);

        let output = Command::new("curl")
            .args(&args)
            .output()
            .await
            .context("Failed to execute curl command")?;

        if !output.status.success() {
            bail!(
                "curl command failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        parse_response(output.stdout)
    }
}

/// Parse curl response with status code appended
fn parse_response(stdout: Vec<u8>) -> Result<String> {
    let output_str = String::from_utf8(stdout)?;
    let (response, status) = output_str.rsplit_once('\n').unwrap_or(("", output_str.as_str()));
    let status_code = status.trim().parse::<u16>().unwrap_or(0);

    if status_code >= 400 {
        return Err(Error::from_status(status_code, error_message(response)).into());
    }
    if status_code == 0 {
        bail!("GitHub API returned no status code: {}", response);
    }

    Ok(response.to_string())
}

/// Extract the human readable message from a GitHub error body.
fn error_message(response: &str) -> String {
    match serde_json::from_str::<GitHubError>(response) {
        Ok(error) => {
            let details: Vec<_> = error
                .errors
                .into_iter()
                .filter_map(|detail| detail.message)
                .collect();
            if details.is_empty() {
                error.message
            } else {
                format!("{} ({})", error.message, details.join("; "))
            }
        }
        Err(_) => response.trim().to_string(),
    }
}
