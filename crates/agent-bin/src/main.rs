//! polkit-agent - PolicyKit authentication agent for the caller's login session.

mod app;

use std::path::PathBuf;
use std::process::ExitCode;

use agent_config_and_utils::{init_logging, Config, Paths};
use clap::{Parser, Subcommand};
use tracing::{error, info};

/// polkit-agent command-line interface.
#[derive(Parser)]
#[command(name = "polkit-agent")]
#[command(about = "PolicyKit authentication agent with an external password prompt")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long, global = true, env = "POLKIT_AGENT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Config file. Defaults to $XDG_CONFIG_HOME/polkit-agent/config.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log file. Defaults to <tmp>/polkit-agent.log
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Mirror log output to stderr
    #[arg(long, global = true)]
    foreground_stderr: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Register as the authentication agent and serve until signalled
    Run,
    /// Print the login session the agent would register for
    ResolveSession,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, paths) = match load_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_path = match init_logging(&config, &paths, cli.foreground_stderr) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!(log_file = %log_path.display(), version = env!("CARGO_PKG_VERSION"), "polkit-agent starting");

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => app::run_agent(&config, &log_path).await,
        Commands::ResolveSession => app::print_session(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.code(), error = %e, "polkit-agent exiting");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> agent_config_and_utils::CoreResult<(Config, Paths)> {
    let paths = Paths::new()?;
    let mut config = match &cli.config {
        Some(path) => Config::load_explicit(path)?,
        None => Config::load(&paths)?,
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(log_file) = &cli.log_file {
        config.log_file = Some(log_file.clone());
    }
    Ok((config, paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["polkit-agent"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.foreground_stderr);
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "polkit-agent",
            "resolve-session",
            "--log-level",
            "debug",
            "--log-file",
            "/tmp/agent.log",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::ResolveSession)));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/agent.log")));
    }
}
