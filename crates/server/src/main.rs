//! Yatube-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::DefaultBodyLimit};
use fred::interfaces::ClientLike;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yatube_api::AppState;
use yatube_common::config::{CacheBackendKind, LogFormat};
use yatube_common::{
    AppError, Config, LocalStorage, MemoryPageCache, RedisPageCache, SharedPageCache,
    StorageBackend,
};
use yatube_core::{
    CommentService, FeedCache, FollowService, PostService, UserService,
};
use yatube_db::repositories::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "yatube=debug,tower_http=debug".into());

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json())
            .with(filter)
            .init(),
    }
}

/// Build the page cache selected in the configuration.
async fn page_cache(config: &Config) -> Result<SharedPageCache, AppError> {
    match config.cache.backend {
        CacheBackendKind::Memory => {
            info!("Using in-memory page cache");
            Ok(Arc::new(MemoryPageCache::new()))
        }
        CacheBackendKind::Redis => {
            let redis = config
                .redis
                .as_ref()
                .ok_or_else(|| AppError::Config("cache.backend is redis but [redis] is missing".to_string()))?;

            info!("Connecting to Redis...");
            let fred_config = fred::types::config::Config::from_url(&redis.url)
                .map_err(|e| AppError::Config(format!("Invalid Redis URL: {e}")))?;
            let client = fred::clients::Client::new(fred_config, None, None, None);
            client.connect();
            client
                .wait_for_connect()
                .await
                .map_err(|e| AppError::Cache(e.to_string()))?;
            info!("Using Redis page cache");

            Ok(Arc::new(RedisPageCache::new(Arc::new(client), redis.prefix.clone())))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    init_tracing(config.logging.format);
    info!("Starting yatube-rs server...");

    // Connect to database
    let db = yatube_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    yatube_db::migrate(&db).await?;
    info!("Migrations completed");

    let cache = page_cache(&config).await?;
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.storage.media_root.clone(),
        config.storage.media_url.clone(),
    ));

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));

    // Initialize services
    let post_service = PostService::new(
        post_repo.clone(),
        user_repo.clone(),
        group_repo,
        comment_repo.clone(),
        follow_repo.clone(),
        storage,
    );
    let state = AppState {
        user_service: UserService::new(user_repo.clone()),
        post_service,
        comment_service: CommentService::new(comment_repo, post_repo),
        follow_service: FollowService::new(follow_repo, user_repo),
        feed_cache: FeedCache::new(cache, Duration::from_secs(config.cache.index_ttl_secs)),
        auth: config.auth.clone(),
    };

    // Build router
    let media_url = format!("/{}", config.storage.media_url.trim_matches('/'));
    let max_upload = config.storage.max_upload_bytes;
    let app = Router::new()
        .nest_service(&media_url, ServeDir::new(&config.storage.media_root))
        .merge(yatube_api::app(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(DefaultBodyLimit::disable())
                .map_response(|res: axum::response::Response<_>| res.map(axum::body::Body::new))
                .layer(RequestBodyLimitLayer::new(max_upload)),
        );

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
