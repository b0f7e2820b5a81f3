use propdesk_backend::{serve, AppState, StubConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
  let _ = dotenvy::dotenv();
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("propdesk_backend=debug,info")))
    .init();

  let config = StubConfig::from_env();
  let listener = TcpListener::bind(config.bind).await?;
  info!("stub backend listening on {}", listener.local_addr()?);

  serve(listener, AppState::seeded(config)).await
}
