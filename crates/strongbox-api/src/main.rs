//! Strongbox backend entrypoint

use strongbox_api::{start_server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("strongbox=debug".parse()?)
                .add_directive("daylock=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    tracing::info!("Starting Strongbox backend");

    let state = AppState::new();
    start_server(state).await?;
    Ok(())
}
