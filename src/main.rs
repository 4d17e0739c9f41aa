use pkgpush::cli::args::{Args, Command};
use pkgpush::cli::Runner;
use pkgpush::config::ClientConfig;
use pkgpush::logging::Logger;
use pkgpush::registry::RegistryClient;
use pkgpush::{RegistryError, Result};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse_args();
    let config = args.apply_to(ClientConfig::from_env());

    let output = if args.wants_quiet_logs() {
        Logger::new_quiet()
    } else {
        Logger::new(config.verbose)
    };

    match run(&args, config, &output).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            output.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args, config: ClientConfig, output: &Logger) -> Result<bool> {
    if let Command::Delete(delete) = &args.command {
        if !delete.yes && !confirm(&format!("Are you sure you want to delete {}?", delete.package))? {
            output.warning("Deletion cancelled");
            return Ok(false);
        }
    }

    config.validate()?;
    let client = RegistryClient::from_config(&config)?;
    let runner = Runner::new(&client, config, output.clone());

    let result = runner.execute(&args.command).await?;
    if !result.stdout.is_empty() {
        println!("{}", result.stdout);
    }
    output.detail(&format!(
        "Finished in {}",
        output.format_duration(output.elapsed())
    ));
    Ok(result.success)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(RegistryError::Io)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
