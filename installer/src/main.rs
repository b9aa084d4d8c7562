//! OpenSSL acquisition CLI entrypoint.
//!
//! Parses options, installs the logger, and runs the acquisition pipeline
//! against the real network and the host's build tools.

use camino::Utf8Path;
use clap::Parser;
use log::info;
use openssl_acquire::artefact::download::UreqClient;
use openssl_acquire::cli::Cli;
use openssl_acquire::config::AcquireConfig;
use openssl_acquire::context::AcquireContext;
use openssl_acquire::error::Result;
use openssl_acquire::executor::SystemCommandExecutor;
use openssl_acquire::pipeline::acquire;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Install the `tracing` subscriber; `log` records are forwarded to it.
///
/// The level comes from `-v`/`-q` unless `RUST_LOG` is set.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().as_str().to_ascii_lowercase()));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = AcquireConfig::from_cli(cli)?;
    // Configure needs absolute prefixes, and builds run from the source dir.
    let ctx = AcquireContext::for_host(
        cli.openssl_version.clone(),
        absolute(&cli.vendor_dir)?,
        absolute(&cli.patches_dir)?,
        absolute(&cli.package_dir)?,
    );
    let outcome = acquire(&ctx, &config, &UreqClient, &SystemCommandExecutor)?;
    info!("{outcome}");
    Ok(())
}

fn absolute(path: &Utf8Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl_acquire::error::AcquireError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = AcquireError::MissingPrerequisite {
            tool: "perl".to_owned(),
            reason: "could not be started".to_owned(),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("missing prerequisite perl"));
    }

    #[test]
    fn absolute_resolves_relative_paths() {
        let path = absolute(Utf8Path::new("vendor/openssl")).expect("absolute");
        assert!(path.is_absolute());
        assert!(path.ends_with("vendor/openssl"));
    }
}
