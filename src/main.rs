// ABOUTME: Entry point for the coreauto CLI application.
// ABOUTME: Parses arguments, wires logging and Ctrl-C handling, and dispatches commands.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::DeployArgs;
use coreauto::bootstrap::{EXIT_FAILED, EXIT_INTERRUPTED};
use coreauto::config::{self, Config};
use coreauto::error::Result;
use coreauto::output::{Output, OutputMode};
use coreauto::prompt::{AcceptDefaults, ConsolePrompt, Prompt};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let task = tokio::spawn(run(cli));

    let code = tokio::select! {
        joined = task => match joined {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {e}");
                EXIT_FAILED
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted.");
            EXIT_INTERRUPTED
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> i32 {
    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);
    output.start_timer();

    let prompt: Box<dyn Prompt> = if cli.yes {
        Box::new(AcceptDefaults)
    } else {
        Box::new(ConsolePrompt::stdin())
    };

    match dispatch(cli, prompt.as_ref(), &output).await {
        Ok(code) => code,
        Err(e) => {
            output.error(&e.to_string());
            EXIT_FAILED
        }
    }
}

async fn dispatch(cli: Cli, prompt: &dyn Prompt, output: &Output) -> Result<i32> {
    let cwd = env::current_dir()?;

    if let Commands::Init {
        client,
        account,
        force,
    } = &cli.command
    {
        let path = config::init_config(&cwd, client.as_deref(), account.as_deref(), *force)?;
        output.success(&format!("Created {}", path.display()));
        return Ok(0);
    }

    let mut config = Config::resolve(&cwd)?;
    if let Some(profile) = cli.profile {
        config.aws_profile = Some(profile);
    }

    match cli.command {
        Commands::Init { .. } => Ok(0),
        Commands::Bootstrap { client, account } => {
            if client.is_some() {
                config.client = client;
            }
            if account.is_some() {
                config.automation_account = account;
            }
            commands::bootstrap(&config, prompt, output).await
        }
        Commands::Deploy {
            stack_name,
            template,
            region,
            parameters,
            tags,
        } => {
            let args = DeployArgs {
                stack_name,
                template,
                region,
                parameters,
                tags,
            };
            commands::deploy(&config, args, prompt, output).await
        }
        Commands::Validate { template, region } => {
            commands::validate(&config, &template, region, output).await
        }
        Commands::Status { stack_name, region } => {
            commands::status(&config, &stack_name, region, output).await
        }
    }
}
