use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use roster::{Config, Server, UserStore, logging, users};

#[tokio::main]
async fn main() {
    let config = Config::parse();
    logging::init(&config);

    if let Err(e) = run(config).await {
        error!(error = %e, "failed to serve");
    }

    info!("all systems offline");
}

async fn run(config: Config) -> Result<(), roster::Error> {
    let store = Arc::new(UserStore::new());
    let app = users::routes(store).max_body_bytes(config.max_body_bytes);

    Server::bind(config.addr).serve(app).await
}
