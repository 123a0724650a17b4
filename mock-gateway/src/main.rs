use std::net::{Ipv4Addr, SocketAddrV4};

use mock_gateway::Credentials;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let defaults = Credentials::default();
    let credentials = Credentials {
        username: std::env::var("MOCK_GATEWAY_USERNAME").unwrap_or(defaults.username),
        token: std::env::var("MOCK_GATEWAY_TOKEN").unwrap_or(defaults.token),
    };

    let app = mock_gateway::app_with_credentials(credentials).layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = TcpListener::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)).await?;
    tracing::info!("sandbox gateway listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
