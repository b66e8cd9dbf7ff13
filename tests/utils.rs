#![allow(dead_code)]

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::BTreeMap;

use anyhow::Result;
use gitops_pause::clients::github::PullRequest;
use gitops_pause::clients::github::RepositoryFile;
use gitops_pause::clients::github::RepositoryOps;
use gitops_pause::clients::github::Service;
use gitops_pause::error::Error;

/// A file stored on a branch.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub sha: String,
    pub content: String,
}

/// A commit recorded by [`InMemoryRepository::update_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommit {
    pub branch: String,
    pub path: String,
    pub message: String,
}

/// A pull request recorded by [`InMemoryRepository::create_pull_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPullRequest {
    pub base: String,
    pub head: String,
    pub title: String,
    pub body: String,
}

/// Repository held in memory, with the conflict rules of the hosted API:
/// existing branches, stale shas, duplicate or empty pull requests.
pub struct InMemoryRepository {
    default_branch: String,
    branches: RefCell<BTreeMap<String, BTreeMap<String, StoredFile>>>,
    pub commits: RefCell<Vec<RecordedCommit>>,
    pub pull_requests: RefCell<Vec<RecordedPullRequest>>,
    next_sha: Cell<u64>,
    /// Paths whose base branch moves right before they are updated.
    moved_paths: RefCell<Vec<String>>,
}

impl InMemoryRepository {
    pub fn new(default_branch: &str) -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(default_branch.to_string(), BTreeMap::new());
        Self {
            default_branch: default_branch.to_string(),
            branches: RefCell::new(branches),
            commits: RefCell::new(Vec::new()),
            pull_requests: RefCell::new(Vec::new()),
            next_sha: Cell::new(1),
            moved_paths: RefCell::new(Vec::new()),
        }
    }

    /// Add a file to the default branch.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        let sha = self.new_sha();
        self.branches
            .borrow_mut()
            .get_mut(&self.default_branch)
            .expect("default branch exists")
            .insert(
                path.to_string(),
                StoredFile {
                    sha,
                    content: content.to_string(),
                },
            );
        self
    }

    /// Simulate a concurrent edit: the file changes on the target branch
    /// between reading and updating it.
    pub fn with_concurrent_edit(self, path: &str) -> Self {
        self.moved_paths.borrow_mut().push(path.to_string());
        self
    }

    pub fn has_branch(&self, branch: &str) -> bool {
        self.branches.borrow().contains_key(branch)
    }

    pub fn file(&self, branch: &str, path: &str) -> Option<String> {
        self.branches
            .borrow()
            .get(branch)
            .and_then(|files| files.get(path))
            .map(|file| file.content.clone())
    }

    fn new_sha(&self) -> String {
        let n = self.next_sha.get();
        self.next_sha.set(n + 1);
        format!("{:040x}", n)
    }
}

impl RepositoryOps for InMemoryRepository {
    fn default_branch(&self) -> String {
        self.default_branch.clone()
    }

    async fn read_file(&self, path: &str, git_ref: &str) -> Result<RepositoryFile> {
        let branches = self.branches.borrow();
        let files = branches
            .get(git_ref)
            .ok_or_else(|| Error::NotFound(format!("No commit found for the ref {}", git_ref)))?;
        let file = files
            .get(path)
            .ok_or_else(|| Error::NotFound("Not Found".to_string()))?;
        Ok(RepositoryFile {
            path: path.to_string(),
            sha: file.sha.clone(),
            content: file.content.clone(),
        })
    }

    async fn list_directory(&self, path: &str, git_ref: &str) -> Result<Vec<Service>> {
        let branches = self.branches.borrow();
        let files = branches
            .get(git_ref)
            .ok_or_else(|| Error::NotFound(format!("No commit found for the ref {}", git_ref)))?;

        let prefix = format!("{}/", path);
        let entries: Vec<&str> = files
            .keys()
            .filter_map(|p| p.strip_prefix(&prefix))
            .collect();
        if entries.is_empty() {
            return Err(Error::NotFound("Not Found".to_string()).into());
        }

        let mut services: Vec<Service> = Vec::new();
        for entry in entries {
            if let Some((dir, _)) = entry.split_once('/') {
                if services.last().map(|s| s.name.as_str()) != Some(dir) {
                    services.push(Service::new(dir));
                }
            }
        }
        Ok(services)
    }

    async fn create_branch(&self, name: &str, from_ref: &str) -> Result<()> {
        let mut branches = self.branches.borrow_mut();
        if branches.contains_key(name) {
            return Err(Error::Conflict("Reference already exists".to_string()).into());
        }
        let files = branches
            .get(from_ref)
            .cloned()
            .ok_or_else(|| Error::NotFound("Not Found".to_string()))?;
        branches.insert(name.to_string(), files);
        Ok(())
    }

    async fn update_file(
        &self,
        path: &str,
        message: &str,
        content: &str,
        sha: &str,
        branch: &str,
    ) -> Result<()> {
        if self.moved_paths.borrow().iter().any(|p| p == path) {
            let moved = self.new_sha();
            if let Some(file) = self
                .branches
                .borrow_mut()
                .get_mut(branch)
                .and_then(|files| files.get_mut(path))
            {
                file.sha = moved;
            }
        }

        let new_sha = self.new_sha();
        let mut branches = self.branches.borrow_mut();
        let files = branches
            .get_mut(branch)
            .ok_or_else(|| Error::NotFound(format!("Branch {} not found", branch)))?;
        let file = files
            .get_mut(path)
            .ok_or_else(|| Error::NotFound("Not Found".to_string()))?;
        if file.sha != sha {
            return Err(Error::Conflict(format!("{} does not match {}", path, sha)).into());
        }

        file.sha = new_sha;
        file.content = content.to_string();
        self.commits.borrow_mut().push(RecordedCommit {
            branch: branch.to_string(),
            path: path.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    async fn create_pull_request(
        &self,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        if !self.has_branch(head) {
            return Err(Error::Conflict(format!("head {} is invalid", head)).into());
        }
        if self
            .pull_requests
            .borrow()
            .iter()
            .any(|pr| pr.base == base && pr.head == head)
        {
            return Err(Error::Conflict(format!(
                "A pull request already exists for {}",
                head
            ))
            .into());
        }
        if !self.commits.borrow().iter().any(|c| c.branch == head) {
            return Err(Error::Conflict(format!("No commits between {} and {}", base, head)).into());
        }

        let mut pull_requests = self.pull_requests.borrow_mut();
        pull_requests.push(RecordedPullRequest {
            base: base.to_string(),
            head: head.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        let number = pull_requests.len() as u64;
        Ok(PullRequest {
            number,
            html_url: format!("https://github.com/test/gitops/pull/{}", number),
        })
    }
}

/// An ArgoCD application manifest for `service` with the given extra
/// annotations.
pub fn application(service: &str, annotations: &[(&str, &str)]) -> String {
    let mut doc = format!(
        "apiVersion: argoproj.io/v1alpha1
kind: Application
metadata:
  name: {service}
  namespace: argocd
  annotations:
    argocd-image-updater.argoproj.io/image-list: app=example/{service}
"
    );
    for (key, value) in annotations {
        doc.push_str(&format!("    {}: '{}'\n", key, value));
    }
    doc.push_str(&format!(
        "spec:
  project: default
  source:
    repoURL: https://github.com/test/gitops.git
    path: envs/staging/{service}
"
    ));
    doc
}
