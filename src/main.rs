use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nestmatch::config::{LoggingSettings, Settings};
use nestmatch::core::Matcher;
use nestmatch::routes::{self, AppState};
use nestmatch::services::{InMemoryProfileStore, PostgresProfileStore, ProfileService, ProfileStore};

fn init_tracing(logging: &LoggingSettings) {
    // RUST_LOG wins, then LOG_LEVEL, then the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
        EnvFilter::new(level)
    });
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&settings.logging);
    info!("Starting nestmatch matching service...");

    let store: Arc<dyn ProfileStore> = if settings.database.is_configured() {
        match PostgresProfileStore::from_settings(&settings.database).await {
            Ok(store) => {
                info!(
                    "PostgreSQL store initialized (max: {} connections)",
                    settings.database.max_connections
                );
                Arc::new(store)
            }
            Err(e) => {
                error!("Failed to connect to PostgreSQL: {}", e);
                return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
            }
        }
    } else {
        info!("No database configured, using the in-memory store");
        Arc::new(InMemoryProfileStore::new())
    };

    let matcher = Matcher::new(settings.matching.max_limit);
    let default_limit = settings.matching.default_limit.clamp(1, matcher.max_limit());
    info!(
        "Matcher initialized (default limit: {}, max limit: {})",
        default_limit,
        matcher.max_limit()
    );

    // Build application state
    let app_state = AppState {
        service: Arc::new(ProfileService::new(store, matcher)),
        default_limit,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
