// CLI module for handling command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mcstage")]
#[command(about = "Declarative Minecraft server provisioning")]
#[command(version)]
pub struct Cli {
    /// Server directory containing mcstage.toml
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the server jar and all configured plugins
    #[command(alias = "i")]
    Install {
        /// Maximum number of plugins installed at once
        #[arg(long, default_value_t = crate::constants::DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
    /// Write a starter mcstage.toml
    Init {
        #[arg(long, default_value = crate::constants::DEFAULT_MC_VERSION)]
        minecraft_version: String,
        #[arg(long, default_value = crate::constants::DEFAULT_SERVER_PROJECT)]
        project: String,
    },
    /// Manage plugins
    Plugin {
        #[command(subcommand)]
        command: PluginCommands,
    },
    /// Manage the local cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Print the version
    Version,
}

#[derive(Subcommand)]
pub enum PluginCommands {
    /// Add a plugin (source:name[@version]) and install it
    #[command(alias = "add")]
    Install {
        spec: String,
        /// Download URL for custom plugins
        #[arg(long)]
        url: Option<String>,
        #[arg(long, default_value_t = crate::constants::DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
    /// Remove a plugin and its jar
    #[command(alias = "rm")]
    Remove { name: String },
    /// List configured plugins
    #[command(alias = "ls")]
    List,
    /// Search Modrinth and Hangar
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Drop cached entries, for one namespace or all of them
    Flush { namespace: Option<String> },
}
