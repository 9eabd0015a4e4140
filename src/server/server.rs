use anyhow::Result;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::routes::make_routes;
use super::state::ServerState;

pub async fn run_server(state: ServerState) -> Result<()> {
    let port = state.config.port;
    let app = make_routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
