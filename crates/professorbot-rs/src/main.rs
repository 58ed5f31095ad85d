//! Terminal entry point for ProfessorBot.

use anyhow::Context;
use clap::Parser;
use log::info;
use professorbot_rs::config::TopicCatalog;
use professorbot_rs::tui::{self, TuiConfig};
use professorbot_rs::{Cli, build_driver, init_logging, topic_listing, transcript_dir};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    info!(
        "starting professorbot (config_layers={}, topic_set={}, model_set={}, list_topics={})",
        cli.config.len(),
        cli.topic.is_some(),
        cli.model.is_some(),
        cli.list_topics
    );
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let config = cli.load_config(&cwd)?;

    if cli.list_topics {
        let catalog = TopicCatalog::load(&config.topics, &cwd).context("failed to load topics")?;
        print!("{}", topic_listing(&catalog));
        return Ok(());
    }

    let driver = build_driver(&config, &cwd, cli.model.as_deref())?;
    let tui_config = TuiConfig {
        transcript_dir: transcript_dir(&config, &cwd),
        user_name: None,
    };
    tui::run(driver, tui_config).await
}
