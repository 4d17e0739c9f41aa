//! Command-line argument parsing

use crate::config::ClientConfig;
use crate::output::OutputFormat;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pkgpush")]
#[command(about = "Push, list, check and delete packages in a remote artifact registry")]
#[command(version)]
pub struct Args {
    /// API key (overrides PKGPUSH_API_KEY)
    #[arg(long = "api-key", global = true)]
    pub api_key: Option<String>,

    /// API host (overrides PKGPUSH_API_HOST)
    #[arg(long = "api-host", global = true)]
    pub api_host: Option<String>,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Only print command results and errors
    #[arg(long = "quiet", short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Push (upload) a package to a repository
    #[command(subcommand)]
    Push(PushCommand),

    /// List resources in a repository
    #[command(subcommand)]
    List(ListCommand),

    /// Show the synchronisation status of a package
    Status {
        /// OWNER/REPO/PACKAGE
        package: String,
    },

    /// Delete a package from a repository
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),
}

#[derive(Debug, Subcommand)]
pub enum PushCommand {
    /// Push a raw (generic binary) package
    Raw(PushRawArgs),
}

#[derive(Debug, ClapArgs)]
pub struct PushRawArgs {
    /// OWNER/REPO
    pub repository: String,

    /// Path to the package file
    pub file: PathBuf,

    /// Return right after upload instead of waiting for synchronisation
    #[arg(long = "no-wait-for-sync")]
    pub no_wait_for_sync: bool,

    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Status polling overrides for commands that wait on the registry
#[derive(Debug, ClapArgs)]
pub struct WaitArgs {
    /// Seconds between status checks while waiting
    #[arg(long = "wait-interval")]
    pub wait_interval: Option<u64>,

    /// Maximum number of status checks while waiting
    #[arg(long = "wait-attempts")]
    pub wait_attempts: Option<u32>,
}

impl WaitArgs {
    fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(interval) = self.wait_interval {
            config.poll.interval_secs = interval;
        }
        if let Some(attempts) = self.wait_attempts {
            config.poll.max_attempts = attempts;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ListCommand {
    /// List packages in a repository
    #[command(visible_alias = "packages")]
    Pkgs(ListPkgsArgs),
}

#[derive(Debug, ClapArgs)]
pub struct ListPkgsArgs {
    /// OWNER/REPO
    pub repository: String,

    /// Sort by name or date; prefix with '-' for descending
    #[arg(long = "sort", allow_hyphen_values = true)]
    pub sort: Option<String>,

    /// Output format
    #[arg(long = "output-format", short = 'F', value_enum, default_value_t = OutputFormat::Pretty)]
    pub output_format: OutputFormat,

    /// Packages requested per page
    #[arg(long = "page-size", default_value = "100")]
    pub page_size: u32,
}

#[derive(Debug, ClapArgs)]
pub struct DeleteArgs {
    /// OWNER/REPO/PACKAGE
    pub package: String,

    /// Assume yes; do not ask for confirmation
    #[arg(long = "yes", short = 'y')]
    pub yes: bool,

    /// Wait until the registry reports the package as gone
    #[arg(long = "wait")]
    pub wait: bool,

    #[command(flatten)]
    pub wait_args: WaitArgs,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Layer command-line overrides on top of an environment-derived config
    pub fn apply_to(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(api_key) = &self.api_key {
            config.api_key = Some(api_key.clone());
        }
        if let Some(api_host) = &self.api_host {
            config.api_host = api_host.clone();
        }
        if self.verbose {
            config.verbose = true;
        }
        match &self.command {
            Command::Push(PushCommand::Raw(push)) => push.wait.apply_to(&mut config),
            Command::Delete(delete) => delete.wait_args.apply_to(&mut config),
            _ => {}
        }
        config
    }

    /// Whether stdout must carry nothing but the command result
    pub fn wants_quiet_logs(&self) -> bool {
        match &self.command {
            Command::List(ListCommand::Pkgs(list)) => {
                self.quiet || list.output_format.is_machine_readable()
            }
            _ => self.quiet,
        }
    }
}
