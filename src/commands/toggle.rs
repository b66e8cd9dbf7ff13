use anyhow::Context;
use anyhow::Result;
use chrono::NaiveDate;
use colored::Colorize;
use tracing::error;
use tracing::info;

use crate::App;
use crate::action::Action;
use crate::app::branch_name;
use crate::app::commit_message;
use crate::app::pull_request_body;
use crate::app::pull_request_title;
use crate::clients::github::RepositoryOps;
use crate::clients::github::Service;
use crate::config::validate_environment;
use crate::error::Error;
use crate::manifest::annotation_key;
use crate::manifest::environment_dir;
use crate::manifest::manifest_path;
use crate::manifest::toggle_annotation;

impl<R: RepositoryOps> App<R> {
    /// Pause or resume image updates for every service of an environment.
    ///
    /// 1. Create the branch `{action}-{env}-{date}` from the default branch.
    /// 2. List the services under `envs/{env}`.
    /// 3. Toggle the ignore-tags annotation of each service on that branch.
    /// 4. Open one pull request against the default branch.
    ///
    /// The first failure aborts the run. Edits already committed and the
    /// branch are left in place.
    pub async fn cmd_run(
        &self,
        target_env: &str,
        action: Action,
        today: NaiveDate,
        stdout: &mut impl std::io::Write,
    ) -> Result<()> {
        validate_environment(target_env)?;
        if action.annotation_present().is_none() {
            error!(%action, "Action is not supported");
            return Err(Error::UnsupportedAction(action.to_string()).into());
        }

        let branch = branch_name(action, target_env, today);
        let base = self.repo.default_branch();
        info!(repository = %self.config.repository, %branch, %base, "starting {}", action);

        self.repo
            .create_branch(&branch, &base)
            .await
            .inspect_err(|e| error!(%branch, "Failed to create branch: {:#}", e))
            .with_context(|| format!("Failed to create branch {}", branch))?;
        info!(%branch, "created branch");
        writeln!(stdout, "Created branch {}", branch.cyan())?;

        let dir = environment_dir(target_env);
        let services = self
            .repo
            .list_directory(&dir, &base)
            .await
            .inspect_err(|e| error!(%dir, "Failed to list services: {:#}", e))
            .with_context(|| format!("Failed to list services in {}", dir))?;

        self.cmd_toggle(target_env, action, &services, &branch, stdout)
            .await
    }

    /// Toggle the annotation for each service on `branch`, then open the pull
    /// request. Each service is read and written exactly once.
    pub async fn cmd_toggle(
        &self,
        env: &str,
        action: Action,
        services: &[Service],
        branch: &str,
        stdout: &mut impl std::io::Write,
    ) -> Result<()> {
        let present = action
            .annotation_present()
            .ok_or_else(|| Error::UnsupportedAction(action.to_string()))?;
        let base = self.repo.default_branch();

        for service in services {
            let path = self
                .modify_application(env, &service.name, branch, &base, present)
                .await?;
            writeln!(stdout, "Updated {}", path)?;
        }

        let title = pull_request_title(action, env);
        let body = pull_request_body(action, env, services);
        let pr = self
            .repo
            .create_pull_request(&base, branch, &title, &body)
            .await
            .inspect_err(|e| error!(%branch, "Failed to create pull request: {:#}", e))
            .with_context(|| format!("Failed to create pull request for {}", branch))?;
        info!(number = pr.number, %branch, "created pull request \"{}\"", title);
        writeln!(stdout, "{} {}", "Created PR:".green(), pr.html_url)?;

        Ok(())
    }

    /// Read a service's manifest from `base`, toggle its annotation and commit
    /// the result to `branch`. Returns the manifest path.
    async fn modify_application(
        &self,
        env: &str,
        service: &str,
        branch: &str,
        base: &str,
        present: bool,
    ) -> Result<String> {
        let path = manifest_path(env, service);
        let key = annotation_key(service);

        let file = self
            .repo
            .read_file(&path, base)
            .await
            .inspect_err(|e| error!(%path, "Failed to read file: {:#}", e))
            .with_context(|| format!("Failed to read {}", path))?;

        let content = toggle_annotation(&file.content, &key, present)
            .inspect_err(|e| error!(%path, "Failed to edit manifest: {:#}", e))
            .with_context(|| format!("Failed to edit {}", path))?;

        self.repo
            .update_file(
                &file.path,
                &commit_message(service, env),
                &content,
                &file.sha,
                branch,
            )
            .await
            .inspect_err(|e| error!(path = %file.path, "Failed to update file: {:#}", e))
            .with_context(|| format!("Failed to update {}", file.path))?;
        info!(path = %file.path, %branch, "updated file");

        Ok(file.path)
    }
}
