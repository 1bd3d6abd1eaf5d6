use anyhow::Context;
use ziptext_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize the application (database, storage, routes)
    let (_state, router) = ziptext_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    ziptext_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
