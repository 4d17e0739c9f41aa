//! Command execution against a registry transport

use crate::cli::args::{Command, DeleteArgs, ListCommand, ListPkgsArgs, PushCommand, PushRawArgs};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::listing::{PackageLister, SortKey};
use crate::logging::Logger;
use crate::output::{self, OutputFormat};
use crate::registry::{Package, PackageRef, RegistryTransport, RepositoryRef};
use crate::sync::{Clock, PollReport, PollTarget, SyncPoller, TokioClock};
use crate::upload::Uploader;
use std::path::Path;
use std::sync::Arc;

/// What a command wants printed on stdout and whether it succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub success: bool,
}

impl CommandOutput {
    fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            success: true,
        }
    }

    fn failed(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            success: false,
        }
    }
}

pub struct Runner<'a> {
    transport: &'a dyn RegistryTransport,
    config: ClientConfig,
    output: Logger,
    clock: Arc<dyn Clock>,
}

impl<'a> Runner<'a> {
    pub fn new(transport: &'a dyn RegistryTransport, config: ClientConfig, output: Logger) -> Self {
        Self {
            transport,
            config,
            output,
            clock: Arc::new(TokioClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one command. Confirmation for `delete` must already be settled.
    pub async fn execute(&self, command: &Command) -> Result<CommandOutput> {
        match command {
            Command::Push(PushCommand::Raw(args)) => self.run_push_raw(args).await,
            Command::List(ListCommand::Pkgs(args)) => self.run_list_packages(args).await,
            Command::Status { package } => Ok(self.status(&package.parse::<PackageRef>()?).await),
            Command::Delete(args) => self.run_delete(args).await,
        }
    }

    async fn run_push_raw(&self, args: &PushRawArgs) -> Result<CommandOutput> {
        let repository: RepositoryRef = args.repository.parse()?;
        let package = self
            .push_raw(&repository, &args.file, !args.no_wait_for_sync)
            .await?;
        Ok(CommandOutput::ok(format!(
            "{}/{} ({})",
            repository, package.slug, package.filename
        )))
    }

    async fn run_list_packages(&self, args: &ListPkgsArgs) -> Result<CommandOutput> {
        let repository: RepositoryRef = args.repository.parse()?;
        let sort = args.sort.as_deref().map(str::parse::<SortKey>).transpose()?;
        let rendered = self
            .list_packages(&repository, sort, args.page_size, args.output_format)
            .await?;
        Ok(CommandOutput::ok(rendered))
    }

    async fn run_delete(&self, args: &DeleteArgs) -> Result<CommandOutput> {
        let package: PackageRef = args.package.parse()?;
        self.delete(&package, args.wait).await?;
        Ok(CommandOutput::ok(format!("Deleted {}", package)))
    }

    fn poller(&self) -> SyncPoller<'a> {
        SyncPoller::new(self.transport, self.config.poll, self.output.clone())
            .with_clock(self.clock.clone())
    }

    /// Upload a raw package, optionally waiting until it is fully synchronised
    pub async fn push_raw(&self, repository: &RepositoryRef, file: &Path, wait: bool) -> Result<Package> {
        self.output.section(&format!("Pushing {} to {}", file.display(), repository));
        let uploader = Uploader::new(self.transport, &self.config, self.output.clone());
        let package = uploader.push_raw(repository, file).await?;

        if wait {
            let package_ref = repository.package(package.slug.clone())?;
            self.output.step(&format!(
                "Waiting for {} to synchronise (every {}s, up to {} checks)",
                package_ref, self.config.poll.interval_secs, self.config.poll.max_attempts
            ));
            let report = self.poller().wait(&package_ref, PollTarget::Synchronized).await?;
            self.log_poll_report(&report);
        } else {
            self.output.info(&format!(
                "{}/{} is queryable but may not be synchronised yet",
                repository, package.slug
            ));
        }

        Ok(package)
    }

    pub async fn list_packages(
        &self,
        repository: &RepositoryRef,
        sort: Option<SortKey>,
        page_size: u32,
        format: OutputFormat,
    ) -> Result<String> {
        let packages = PackageLister::new(self.transport, self.output.clone())
            .with_page_size(page_size)
            .list(repository, sort)
            .await?;
        output::render_packages(&packages, format)
    }

    /// Status text; a missing package is reported, not raised
    pub async fn status(&self, package: &PackageRef) -> CommandOutput {
        match self.transport.package_status(package).await {
            Ok(report) => CommandOutput::ok(output::render_status(package, &report)),
            Err(e) => CommandOutput::failed(output::render_status_error(package, &e)),
        }
    }

    pub async fn delete(&self, package: &PackageRef, wait: bool) -> Result<()> {
        self.output.step(&format!("Deleting {}", package));
        self.transport.delete_package(package).await?;
        self.output.success(&format!("Deleted {}", package));

        if wait {
            let report = self.poller().wait(package, PollTarget::Absent).await?;
            self.log_poll_report(&report);
        }
        Ok(())
    }

    fn log_poll_report(&self, report: &PollReport) {
        self.output.success(&format!(
            "{:?} after {} check(s) in {}",
            report.outcome,
            report.attempts,
            self.output.format_duration(report.elapsed)
        ));
    }
}
