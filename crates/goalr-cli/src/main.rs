use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "goalr", version, about = "Goalr step tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record and inspect daily step counts
    Steps {
        #[command(subcommand)]
        action: commands::steps::StepsAction,
    },
    /// History and weekly summaries
    Progress {
        #[command(subcommand)]
        action: commands::progress::ProgressAction,
    },
    /// Print the current goal streak
    Streak,
    /// User profile and daily goal
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    // Logs go to stderr so JSON on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Steps { action } => commands::steps::run(action),
        Commands::Progress { action } => commands::progress::run(action),
        Commands::Streak => commands::progress::streak(),
        Commands::Profile { action } => commands::profile::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
