use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};

mod api;
mod auth;
mod config;
mod docs;
mod error;
mod model;
mod models;
mod remote;
mod routes;
mod utils;
mod view;

use config::Config;
use remote::{AttendanceApi, HttpAttendanceApi};
use view::SessionStore;

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        addr = %config.server_addr,
        attendance_api = %config.attendance_api_url,
        removal_policy = %config.removal_policy,
        "Server starting..."
    );

    let api: Arc<dyn AttendanceApi> = Arc::new(HttpAttendanceApi::new(
        &config.attendance_api_url,
        config.remote_timeout,
    )?);
    let sessions = SessionStore::new(api.clone(), config.removal_policy, config.session_idle_ttl);

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);
    let sessions = Data::new(sessions);
    let api = Data::new(api);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(sessions.clone())
            .app_data(api.clone())
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, &config_data))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
