//! VX client main entry point

use vx_client::config::create_shared_config;
use vx_client::{App, AppError};

fn main() -> Result<(), AppError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vx_client=debug,vx_renderer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting VX client");

    let config = create_shared_config();
    let mut app = App::new(config)?;
    app.run()?;
    Ok(())
}
