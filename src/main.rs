use clap::Parser;
use clap::error::ErrorKind;
use md2wechat::cli::{Cli, run};
use md2wechat::{Config, Response};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let outcome = match Config::from_env() {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(data) => print_response(&Response::ok(data)),
        Err(e) => {
            tracing::error!(error = %e, code = e.code(), "command failed");
            let _ = print_response(&Response::failure(&e));
            ExitCode::FAILURE
        }
    }
}

fn print_response<T: serde::Serialize>(response: &Response<T>) -> ExitCode {
    match md2wechat::types::write_json(std::io::stdout().lock(), response) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("JSON encode error: {e}");
            ExitCode::FAILURE
        }
    }
}
