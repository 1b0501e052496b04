use std::path::{Path, PathBuf};

use character_locomotion::LocomotionConfig;
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};
use log::LevelFilter;

mod replay;

const EXIT_SUCCESS: i32 = 0;
const EXIT_CONFIG: i32 = 10;
const EXIT_SCRIPT: i32 = 11;

#[derive(Parser)]
#[command(name = "tools", version, about = "Character locomotion tools CLI")]
struct Cli {
    /// Log debug output (state transitions, input edges).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replays a scripted input timeline against a headless physics world.
    Replay {
        #[arg(long, value_name = "PATH")]
        script: PathBuf,
    },
    /// Prints the effective key bindings.
    Bindings {
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let exit_code = match cli.command {
        Commands::Replay { script } => run_replay(&script),
        Commands::Bindings { config } => run_bindings(config.as_deref()),
    };
    std::process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let env = Env::default().default_filter_or(level.to_string());
    if let Err(err) = Builder::from_env(env).try_init() {
        eprintln!("logging not initialized: {err}");
    }
}

fn run_replay(path: &Path) -> i32 {
    let script = match replay::ReplayScript::from_path(path) {
        Ok(script) => script,
        Err(err) => {
            eprintln!("{}", err);
            return EXIT_SCRIPT;
        }
    };
    let report = match replay::run(&script) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("replay failed: {}", err);
            return EXIT_CONFIG;
        }
    };

    for transition in &report.transitions {
        println!(
            "{:>6} {} -> {}",
            transition.frame,
            transition.from.name(),
            transition.to.name()
        );
    }
    let position = report.final_position;
    println!(
        "final state {} at ({:.3}, {:.3}, {:.3}) after {} physics steps",
        report.final_state.name(),
        position.x,
        position.y,
        position.z,
        report.physics_steps
    );
    EXIT_SUCCESS
}

fn run_bindings(path: Option<&Path>) -> i32 {
    let config = match path {
        Some(path) => match LocomotionConfig::from_path(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{}", err);
                return EXIT_CONFIG;
            }
        },
        None => LocomotionConfig::default(),
    };

    for (action, state) in config.action_table().actions() {
        let codes: Vec<_> = state.codes.iter().map(|code| code.name()).collect();
        println!("{:<10} {}", action.name(), codes.join(", "));
    }
    EXIT_SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_logging_init_does_not_panic() {
        init_logging(false);
        init_logging(true);
    }

    #[test]
    fn parses_replay_and_bindings() {
        let cli = Cli::parse_from(["tools", "--verbose", "replay", "--script", "walk.toml"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Replay { script } if script == Path::new("walk.toml")
        ));
        let cli = Cli::parse_from(["tools", "bindings"]);
        assert!(matches!(cli.command, Commands::Bindings { config: None }));
    }
}
