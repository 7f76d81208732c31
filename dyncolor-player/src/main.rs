use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use dyncolor_player::{App, AppConfig};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "warn,dyncolor_core=info,dyncolor_player=info";

/// Load an image from a URL and theme the terminal from its colors
#[derive(Parser, Debug)]
#[command(name = "dyncolor")]
#[command(version, about)]
struct Cli {
    /// Path to a TOML or JSON config file. Without it the config comes
    /// from DYNCOLOR_CONFIG_PATH, DYNCOLOR_CONFIG_JSON or ./dyncolor.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the load deadline in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Derive a dark scheme
    #[arg(long)]
    dark: bool,

    /// Print one JSON report per URL instead of drawing
    #[arg(long, requires = "urls")]
    json: bool,

    /// URLs to load without prompting
    urls: Vec<String>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config)?
        .with_deadline_ms(cli.deadline_ms)
        .with_dark(cli.dark)
        .with_json(cli.json);
    config.loader.validate()?;
    info!(
        source = ?config.source,
        deadline_ms = config.loader.deadline_ms,
        "configuration loaded"
    );

    let mut app = App::from_config(&config)?;
    let mut stdout = io::stdout();

    if cli.urls.is_empty() {
        app.run_interactive(&mut stdout).await?;
    } else {
        app.run_batch(&cli.urls, config.json, &mut stdout).await?;
    }

    app.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn config_path_env_is_left_to_the_loader() {
        let command = Cli::command();
        let config = command
            .get_arguments()
            .find(|arg| arg.get_id() == "config")
            .unwrap();
        assert!(config.get_env().is_none());
    }

    #[test]
    fn cli_parses_batch_flags() {
        let cli = Cli::try_parse_from([
            "dyncolor",
            "--json",
            "--deadline-ms",
            "250",
            "https://a/x.png",
        ])
        .unwrap();
        assert!(cli.config.is_none());
        assert!(cli.json);
        assert_eq!(cli.deadline_ms, Some(250));
        assert_eq!(cli.urls, vec!["https://a/x.png".to_string()]);
    }
}
