use clap::Parser;
use std::process::ExitCode;
use tracing::{error, warn};

use rustyhttp::config::{CliArgs, ServerConfig};
use rustyhttp::handler::DemoHandler;
use rustyhttp::logging;
use rustyhttp::net::server::Server;

#[async_std::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();
    let log = logging::build(&cli.log_level);
    let _guard = tracing::dispatcher::set_default(&log);

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(err) => {
            warn!(%err, "falling back to default config");
            cli.apply(ServerConfig::default())
        }
    };

    let handler = DemoHandler::new(config.server_name.clone());
    let server = match Server::bind(config, handler, log.clone()).await {
        Ok(server) => server,
        Err(err) => {
            error!(%err, "failed to listen");
            return ExitCode::FAILURE;
        }
    };

    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "server stopped");
            ExitCode::FAILURE
        }
    }
}
