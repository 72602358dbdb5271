use std::sync::Arc;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{App, HttpServer};
use anyhow::Context;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use attendance_tracker::clock::{Clock, SystemClock};
use attendance_tracker::config::{Config, StoreBackend};
use attendance_tracker::db::init_db;
use attendance_tracker::docs::ApiDoc;
use attendance_tracker::routes;
use attendance_tracker::service::Services;
use attendance_tracker::store::{MemoryStore, MySqlStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let level: tracing::Level = config
        .log_level
        .parse()
        .with_context(|| format!("invalid LOG_LEVEL {:?}", config.log_level))?;

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!("Server starting...");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let services = match &config.store {
        StoreBackend::Memory => {
            warn!("DATABASE_URL=memory, records are lost on restart");
            Services::new(Arc::new(MemoryStore::new()), clock, &config)
        }
        StoreBackend::MySql(url) => {
            let pool = init_db(url, config.db_max_connections).await?;
            let store = MySqlStore::new(pool);
            store.migrate().await.context("Failed to run migrations")?;
            Services::new(Arc::new(store), clock, &config)
        }
    };

    let accounts = services.accounts.clone();
    actix_web::rt::spawn(async move {
        accounts.warmup().await;
    });

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .configure(|cfg| routes::configure(cfg, config.clone(), services.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
