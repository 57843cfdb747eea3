use std::sync::Arc;

use reqwest::Client;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::backstage::{BackstageCatalogClient, BackstageIdentityClient};
use crate::infra::servicenow::ServiceNowClient;
use crate::server;

pub async fn run(config: AppConfig) -> AppResult<()> {
    let backstage = config.backstage()?.clone();
    if backstage.token.is_none() {
        tracing::warn!(
            "backstage.token not configured; every /incidents request will be rejected"
        );
    }

    info!(
        instance_url = %config.servicenow.instance_url,
        auth = config.servicenow.auth.describe(),
        "Creating router for ServiceNow"
    );

    let http = Client::new();
    let ctx = AppContext::new(
        Arc::new(ServiceNowClient::new(http.clone(), config.servicenow.clone())),
        Arc::new(BackstageIdentityClient::new(
            http.clone(),
            backstage.base_url.clone(),
        )),
        Arc::new(BackstageCatalogClient::new(http, backstage.base_url)),
        backstage.token,
    );

    let addr = config.server.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, server::router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
