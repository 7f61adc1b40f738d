use std::net::SocketAddr;
use std::path::Path;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedline_server::state::AppState;
use feedline_server::{api, config, db, import};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedline_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings
    let settings = config::Settings::new().expect("Failed to load settings");

    // Initialize database
    let db = db::Database::new(&settings.database.path).expect("Failed to create database");
    db.initialize()
        .expect("Failed to initialize database schema");
    tracing::info!("Database initialized successfully");

    // Import the dataset if one is present. Import failure is logged but
    // never prevents the server from starting.
    match import::import_csv(&db, Path::new(&settings.import.csv_path)) {
        Ok(summary) => {
            if summary.posts_inserted > 0 || summary.authors_inserted > 0 {
                tracing::info!(
                    "Import finished: {} authors, {} posts ({} rows skipped, {} missing authors, {} invalid ids)",
                    summary.authors_inserted,
                    summary.posts_inserted,
                    summary.skipped_rows,
                    summary.missing_author,
                    summary.invalid_id
                );
            }
        }
        Err(e) => tracing::error!("CSV import failed: {e:#}"),
    }

    // Create application state
    let state = AppState::new(db, settings.pagination.per_page);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(api::posts::health_check))
        .route("/posts", get(api::posts::get_posts))
        .route("/posts", post(api::posts::create_post))
        .route("/posts/stats", get(api::posts::get_stats))
        .route("/posts/:id", put(api::posts::update_post))
        .route("/posts/:id", delete(api::posts::delete_post))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .expect("Failed to parse server address");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}
