use clap::Parser;
use mcstage::cli::{CacheCommands, Cli, Commands, PluginCommands};
use mcstage::commands;
use mcstage::config::ServerDir;
use mcstage::ui;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli).await {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let dir = ServerDir::new(cli.dir);

    match cli.command {
        Commands::Install { concurrency } => commands::install::install(&dir, concurrency).await,
        Commands::Init {
            minecraft_version,
            project,
        } => commands::init::init(&dir, minecraft_version, project),
        Commands::Plugin { command } => match command {
            PluginCommands::Install {
                spec,
                url,
                concurrency,
            } => commands::plugin::install(&dir, &spec, url, concurrency).await,
            PluginCommands::Remove { name } => commands::plugin::remove(&dir, &name),
            PluginCommands::List => commands::plugin::list(&dir),
            PluginCommands::Search { query } => commands::plugin::search(&query).await,
        },
        Commands::Cache { command } => match command {
            CacheCommands::Flush { namespace } => commands::cache::flush(&dir, namespace),
        },
        Commands::Version => {
            ui::plain(&format!("mcstage {}", env!("CARGO_PKG_VERSION")));
            Ok(())
        }
    }
}
