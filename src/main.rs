use color_eyre::Result;
use sessionlink::cli::{parse_args, run_cli_command, CliCommand};
use sessionlink::config::SessionConfig;
use sessionlink::session::Session;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Logs go to stderr so responses on stdout stay pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = parse_args(std::env::args());
    let config = match command {
        CliCommand::Version | CliCommand::Help => SessionConfig::default(),
        _ => SessionConfig::from_env()?,
    };
    run_cli_command(command, Session::builder(config), &mut std::io::stdout()).await
}
