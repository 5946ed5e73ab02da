use actix_web::{dev::Service, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trending_service::clients::{FollowGraph, HttpFollowGraph};
use trending_service::handlers::{
    get_feed, get_settings, get_trending, get_trending_analytics, publish_fanout, record_event,
    reset_settings, update_settings, AppState,
};
use trending_service::jobs::trending_cycle::{start_trending_cycle, CycleContext};
use trending_service::{Config, SettingsCache, TrendingCache};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting trending-service v{}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.env);

    let pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    let cache = if config.redis.enabled {
        match TrendingCache::connect(Some(&config.redis.url)).await {
            Ok(cache) => {
                info!("Redis cache and cycle lease enabled");
                cache
            }
            Err(e) => {
                tracing::warn!("Redis unavailable, degrading to local lease: {}", e);
                TrendingCache::disabled()
            }
        }
    } else {
        info!("Redis disabled by configuration, using process-local lease");
        TrendingCache::disabled()
    };

    let graph: Arc<dyn FollowGraph> = match HttpFollowGraph::new(&config.graph) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to build follow-graph client: {}", e);
            eprintln!("ERROR: Failed to build follow-graph client: {}", e);
            std::process::exit(1);
        }
    };

    let settings = Arc::new(SettingsCache::default());

    let state = AppState {
        pool: pool.clone(),
        cache: cache.clone(),
        settings: settings.clone(),
        graph: graph.clone(),
        engine: config.engine.clone(),
    };

    // Single-flight scorer+selector batch job
    let cycle_ctx = CycleContext {
        pool,
        cache,
        settings,
        graph,
        engine: config.engine.clone(),
    };
    tokio::spawn(async move {
        start_trending_cycle(cycle_ctx).await;
    });
    info!("Trending cycle background job started");

    let state = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/health", web::get().to(|| async { "OK" }))
            .route(
                "/metrics",
                web::get().to(trending_service::metrics::serve_metrics),
            )
            .wrap_fn(|req, srv| {
                let method = req.method().to_string();
                let path = req
                    .match_pattern()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| req.path().to_string());
                let start = Instant::now();

                let fut = srv.call(req);
                async move {
                    match fut.await {
                        Ok(res) => {
                            trending_service::metrics::observe_http_request(
                                &method,
                                &path,
                                res.status().as_u16(),
                                start.elapsed(),
                            );
                            Ok(res)
                        }
                        Err(err) => {
                            trending_service::metrics::observe_http_request(
                                &method,
                                &path,
                                500,
                                start.elapsed(),
                            );
                            Err(err)
                        }
                    }
                }
            })
            .service(
                web::scope("/api/v1")
                    .service(record_event)
                    .service(publish_fanout)
                    .service(get_feed)
                    .service(get_trending)
                    .service(get_settings)
                    .service(update_settings)
                    .service(reset_settings)
                    .service(get_trending_analytics),
            )
    })
    .bind(format!("0.0.0.0:{}", config.app.port))?
    .run()
    .await
}
