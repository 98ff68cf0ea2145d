// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "coreauto")]
#[command(about = "Bootstrap and deploy the Core Automation platform with CloudFormation")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Answer every confirmation with its default
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// AWS profile to use (AWS_PROFILE in the environment takes precedence;
    /// bootstrap warns when the two differ)
    #[arg(long, global = true)]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new coreauto.yml configuration file
    Init {
        /// Client slug (lowercase short name of the organization)
        #[arg(long)]
        client: Option<String>,

        /// Automation account id
        #[arg(long)]
        account: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Bootstrap the Core Automation platform into the automation account
    Bootstrap {
        /// Client slug; overrides CLIENT
        #[arg(short, long)]
        client: Option<String>,

        /// Automation account id; overrides AUTOMATION_ACCOUNT
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Create or update a single CloudFormation stack
    Deploy {
        /// Stack name
        #[arg(short, long)]
        stack_name: String,

        /// Path to the template file
        #[arg(short = 'f', long)]
        template: PathBuf,

        /// Target region (defaults to the configured region)
        #[arg(short, long)]
        region: Option<String>,

        /// Stack parameter as KEY=VALUE (repeatable)
        #[arg(short = 'p', long = "parameter", value_parser = parse_key_val)]
        parameters: Vec<(String, String)>,

        /// Stack tag as KEY=VALUE (repeatable)
        #[arg(short = 't', long = "tag", value_parser = parse_key_val)]
        tags: Vec<(String, String)>,
    },

    /// Validate a template with CloudFormation
    Validate {
        /// Path to the template file
        #[arg(short = 'f', long)]
        template: PathBuf,

        /// Region to validate in (defaults to the configured region)
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Show a stack's status
    Status {
        /// Stack name
        #[arg(short, long)]
        stack_name: String,

        /// Region (defaults to the configured region)
        #[arg(short, long)]
        region: Option<String>,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}
