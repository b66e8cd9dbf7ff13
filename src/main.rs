use anyhow::Result;
use clap::Parser;
use gitops_pause::App;
use gitops_pause::Config;
use gitops_pause::action::Action;
use gitops_pause::clients::github::GithubClient;
use gitops_pause::logging::setup_logging;
use tracing::debug;

#[derive(Parser)]
#[command(name = "gitops-pause")]
#[command(about = "Pause or resume image updates for an environment via a GitOps pull request", long_about = None)]
pub struct Cli {
    /// Source environment (accepted for compatibility, not used)
    #[arg(long)]
    pub source_env: Option<String>,

    /// Environment whose services are modified
    #[arg(long)]
    pub target_env: String,

    /// Action to perform (pause, resume, push)
    #[arg(long, value_parser = str::parse::<Action>)]
    pub action: Action,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    if let Some(source_env) = &cli.source_env {
        debug!(%source_env, "ignoring source environment");
    }

    let config = Config::from_env()?;
    let repo = GithubClient::resolve(&config).await?;
    let app = App::new(config, repo);

    let today = chrono::Local::now().date_naive();
    app.cmd_run(&cli.target_env, cli.action, today, &mut std::io::stdout())
        .await?;

    Ok(())
}
