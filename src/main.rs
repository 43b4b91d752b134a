use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

/// BlockLaunch - resolve, fetch and launch game versions from their manifests
#[derive(Parser)]
#[command(name = "blocklaunch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Launcher root (defaults to BLOCKLAUNCH_HOME, then the user data directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the version catalog by category
    Versions {
        /// Only this category (e.g. "release", "old-beta")
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Download everything a version needs
    Install {
        /// Version id (e.g., 1.20.4)
        version: String,
    },

    /// Print the launch command for an installed version
    Command {
        version: String,

        #[arg(short, long, default_value = "Player")]
        username: String,

        /// Memory ceiling in GB
        #[arg(short, long, default_value_t = 2)]
        memory: u32,
    },

    /// Install a version if needed and start it
    Launch {
        version: String,

        #[arg(short, long, default_value = "Player")]
        username: String,

        /// Memory ceiling in GB
        #[arg(short, long, default_value_t = 2)]
        memory: u32,

        /// Frame rate cap written to options.txt
        #[arg(long, default_value_t = 60)]
        fps: u32,
    },

    /// Manage local Java runtimes
    Java {
        #[command(subcommand)]
        action: JavaAction,
    },
}

#[derive(Subcommand)]
enum JavaAction {
    /// Download a runtime from Adoptium
    Install {
        /// Java feature release (e.g., 17, 21)
        #[arg(short, long, default_value_t = blocklaunch::core::java::DEFAULT_JAVA_MAJOR)]
        major: u32,
    },
}

#[tokio::main]
async fn main() {
    blocklaunch::init_tracing();
    let cli = Cli::parse();
    let root = blocklaunch::core::state::resolve_root(cli.root);

    let result = match cli.command {
        Commands::Versions { category } => commands::versions(root, category).await,
        Commands::Install { version } => commands::install(root, version).await,
        Commands::Command {
            version,
            username,
            memory,
        } => commands::command(root, version, username, memory).await,
        Commands::Launch {
            version,
            username,
            memory,
            fps,
        } => commands::launch(root, version, username, memory, fps).await,
        Commands::Java { action } => match action {
            JavaAction::Install { major } => commands::java_install(root, major).await,
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
