use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use mingle_api::auth::{self, AppState, AppStateInner};
use mingle_api::middleware::require_auth;
use mingle_api::relations::RelationDecoration;
use mingle_api::storage::Storage;
use mingle_api::{counters, follows, messages, publications, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mingle=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("MINGLE_JWT_SECRET").unwrap_or_else(|_| {
        warn!("MINGLE_JWT_SECRET unset, using the dev secret");
        "dev-secret-change-me".into()
    });
    let db_path = std::env::var("MINGLE_DB_PATH").unwrap_or_else(|_| "mingle.db".into());
    let host = std::env::var("MINGLE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("MINGLE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let upload_dir: PathBuf = std::env::var("MINGLE_UPLOAD_DIR")
        .unwrap_or_else(|_| "./uploads/publications".into())
        .into();
    let decoration = std::env::var("MINGLE_RELATION_DECORATION")
        .ok()
        .and_then(|v| RelationDecoration::parse(&v))
        .unwrap_or(RelationDecoration::Caller);

    // Init database and image storage
    let db = mingle_db::Database::open(&PathBuf::from(&db_path))?;
    let storage = Storage::new(upload_dir).await?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        storage,
        decoration,
    });

    // Routes
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/get-image-pub/{image_file}", get(publications::get_image))
        .route("/health", get(health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        // users
        .route("/user/{id}", get(users::get_user))
        .route("/users", get(users::list))
        .route("/users/{page}", get(users::list_page))
        .route("/counters", get(counters::mine))
        .route("/counters/{id}", get(counters::for_user))
        // follows
        .route("/follow", post(follows::create))
        .route("/follow/{id}", delete(follows::remove))
        .route("/following", get(follows::following))
        .route("/following/{id}", get(follows::following_of))
        .route("/following/{id}/{page}", get(follows::following_of_page))
        .route("/followed", get(follows::followers))
        .route("/followed/{id}", get(follows::followers_of))
        .route("/followed/{id}/{page}", get(follows::followers_of_page))
        .route("/get-my-follows", get(follows::my_follows))
        .route("/get-my-follows/{followed}", get(follows::my_follows_reverse))
        // publications
        .route("/publication", post(publications::create))
        .route("/publication/{id}", get(publications::get_by_id))
        .route("/publication/{id}", delete(publications::remove))
        .route("/publications", get(publications::feed))
        .route("/publications/{page}", get(publications::feed_at))
        .route("/publications-user/{user}", get(publications::by_author))
        .route(
            "/publications-user/{user}/{page}",
            get(publications::by_author_at),
        )
        .route("/upload-img-pub/{id}", post(publications::upload_image))
        // messages
        .route("/message", post(messages::send))
        .route("/my-messages", get(messages::inbox))
        .route("/my-messages/{page}", get(messages::inbox_at))
        .route("/messages", get(messages::outbox))
        .route("/messages/{page}", get(messages::outbox_at))
        .route("/unviewed-messages", get(messages::unviewed))
        .route("/set-viewed-messages", get(messages::set_viewed))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // image uploads
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Mingle server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
