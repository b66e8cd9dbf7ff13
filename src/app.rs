use chrono::NaiveDate;

use crate::action::Action;
use crate::clients::github::RepositoryOps;
use crate::clients::github::Service;
use crate::config::Config;

/// Date format used in branch names
pub const BRANCH_DATE_FORMAT: &str = "%Y-%m-%d";

pub struct App<R> {
    pub config: Config,
    pub repo: R,
}

impl<R: RepositoryOps> App<R> {
    pub fn new(config: Config, repo: R) -> Self {
        Self { config, repo }
    }
}

/// Name of the branch carrying the edits, e.g. `pause-staging-2024-01-01`.
///
/// The source environment never takes part in the name.
pub fn branch_name(action: Action, target_env: &str, date: NaiveDate) -> String {
    format!(
        "{}-{}-{}",
        action,
        target_env,
        date.format(BRANCH_DATE_FORMAT)
    )
}

pub fn commit_message(service: &str, env: &str) -> String {
    format!("Modify {} in {}.", service, env)
}

pub fn pull_request_title(action: Action, env: &str) -> String {
    format!("{} the {} environment.", action.title(), env)
}

/// Pull request description listing every modified service
pub fn pull_request_body(action: Action, env: &str, services: &[Service]) -> String {
    if services.is_empty() {
        return format!("No services found in `{}`.\n", env);
    }

    let mut body = format!("Services to {} in `{}`:\n\n", action, env);
    for service in services {
        body.push_str(&format!("- `{}`\n", service.name));
    }
    body
}
