use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use video_platform_service::{
    db::{create_pool, run_migrations},
    error::configure_error_rendering,
    handlers,
    media::CloudinaryUploader,
    metrics,
    middleware::{BearerAuth, MetricsMiddleware},
    AppState, Config,
};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

/// Video Platform Service
///
/// REST backend for videos, comments, likes, tweets and channel subscriptions.
///
/// # Routes
///
/// - `/api/v1/videos/*` - Listing, publishing, detail, updates and the publish toggle
/// - `/api/v1/comments/*` - Comments under videos
/// - `/api/v1/tweets/*` - Tweets per user
/// - `/api/v1/likes/*` - Like toggles and liked videos
/// - `/api/v1/subscriptions/*` - Subscription toggle and listings
/// - `/api/v1/health`, `/api/v1/health/ready`, `/api/v1/health/live`, `/metrics`
#[actix_web::main]
async fn main() -> io::Result<()> {
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    configure_error_rendering(&config.app.env);

    tracing::info!("Starting video-platform-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let db_pool = match create_pool(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    if config.database.run_migrations {
        if let Err(e) = run_migrations(&db_pool).await {
            tracing::error!("Database migrations failed: {:#}", e);
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to run migrations: {e}"),
            ));
        }
    }

    let uploader = CloudinaryUploader::new(config.media.clone()).map_err(|e| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to build media uploader: {e}"),
        )
    })?;
    if config.media.cloud_name.is_empty() {
        tracing::warn!("Object storage not configured; video publishing will fail");
    }

    let state = web::Data::new(AppState::new(db_pool, Arc::new(uploader), &config));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let server_config = config.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in server_config.cors.allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route("/api/v1/health", web::get().to(handlers::health_summary))
            .route("/api/v1/health/ready", web::get().to(handlers::readiness_check))
            .route("/api/v1/health/live", web::get().to(handlers::liveness_check))
            .service(
                web::scope("/api/v1")
                    .wrap(BearerAuth::new(&server_config.auth.jwt_secret))
                    .wrap(MetricsMiddleware)
                    .configure(handlers::configure),
            )
    })
    .workers(config.app.workers)
    .bind(&bind_address)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");
    server_handle.stop(true).await;

    match server_task.await {
        Ok(result) => result,
        Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
    }
}
