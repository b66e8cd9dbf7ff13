use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::error::Error;

/// GitOps repository holding the `envs/` tree.
pub const UPSTREAM_REPOSITORY: &str = "antonputra/k8s";

/// Environment variable holding the GitHub token.
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

// Environment names become path segments and branch names.
static ENVIRONMENT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid regex"));

#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: String,
    /// `owner/repo` of the GitOps repository.
    pub repository: String,
}

impl Config {
    /// Load config from the process environment
    pub fn from_env() -> Result<Self> {
        let github_token = std::env::var(GITHUB_TOKEN_VAR).unwrap_or_default();
        Self::with_token(github_token)
    }

    fn with_token(github_token: String) -> Result<Self> {
        let github_token = github_token.trim().to_string();
        if github_token.is_empty() {
            return Err(Error::Auth(format!("{GITHUB_TOKEN_VAR} is not set")).into());
        }

        Ok(Self {
            github_token,
            repository: UPSTREAM_REPOSITORY.to_string(),
        })
    }

    /// Create a new config with explicit values (useful for tests)
    pub fn new(github_token: String, repository: String) -> Self {
        Self {
            github_token,
            repository,
        }
    }

    /// Default config for tests
    pub fn default_for_tests() -> Self {
        Self {
            github_token: "test-token".to_string(),
            repository: "test/gitops".to_string(),
        }
    }
}

/// Check that `env` is usable as a path segment and in a branch name.
pub fn validate_environment(env: &str) -> Result<(), Error> {
    if ENVIRONMENT_NAME.is_match(env) {
        Ok(())
    } else {
        Err(Error::InvalidEnvironment(env.to_string()))
    }
}
