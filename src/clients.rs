//! Clients for the hosted source-control API.
//!
//! - [`github`]: the [`github::RepositoryOps`] capability set and its GitHub
//!   implementation (branches, file contents, pull requests)
//! - [`github_curl`]: Curl-based HTTP client for making GitHub API requests
//!
//! Commands only depend on the trait so tests can substitute a double that
//! never touches the network.

pub mod github;
pub mod github_curl;
