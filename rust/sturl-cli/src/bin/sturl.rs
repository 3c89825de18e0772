use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sturl_cli::cli::SturlCli;
use sturl_cli::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let args = SturlCli::parse();

    let default_filter = if args.debug {
        "sturl_cli=debug,sturl_auth=debug"
    } else {
        "sturl_cli=info,sturl_auth=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    sturl_cli::run(args, config).await
}
