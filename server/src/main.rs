#![allow(dead_code)]

mod auth;
mod db_core;
mod email;
mod error;
mod model;
mod prompt;
mod request_tracing;
mod routes;
mod server_config;
mod state;

use std::{env, net::SocketAddr, sync::Arc};

use axum::{extract::FromRef, Router};
use mimalloc::MiMalloc;
use routes::AppRouter;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tokio::signal;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub type HttpClient = reqwest::Client;
pub type S3Client = aws_sdk_s3::Client;

/// Per-request dependencies, constructed once in main and injected into
/// every handler through axum state. No handler performs lazy global
/// initialization of its own.
#[derive(Clone, FromRef)]
struct ServerState {
    http_client: HttpClient,
    conn: Arc<DatabaseConnection>,
    s3_client: S3Client,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL is not set in .env file");
    let mut db_options = ConnectOptions::new(db_url);
    db_options.sqlx_logging(false);

    let conn = Database::connect(db_options)
        .await
        .expect("Database connection failed");

    let http_client = reqwest::ClientBuilder::new().use_rustls_tls().build()?;

    let aws_config = aws_config::load_from_env().await;
    let s3_client = aws_sdk_s3::Client::new(&aws_config);

    let state = ServerState {
        http_client,
        conn: Arc::new(conn),
        s3_client,
    };

    let router = AppRouter::create(state.clone());

    let mut scheduler = JobScheduler::new()
        .await
        .expect("Failed to create scheduler");

    {
        let http_client = state.http_client.clone();
        let conn = state.conn.clone();
        scheduler
            .add(Job::new_async(
                server_config::cfg.feedback.scan_schedule.as_str(),
                move |uuid, mut l| {
                    let http_client = http_client.clone();
                    let conn = conn.clone();
                    Box::pin(async move {
                        tracing::info!("Running feedback scan job {}", uuid);
                        match state::feedback_loop::run_feedback_scan(&http_client, &conn).await {
                            Ok(summary) => {
                                tracing::info!("Feedback scan job {} done: {:?}", uuid, summary);
                            }
                            Err(e) => {
                                tracing::error!("Feedback scan job {} failed: {:?}", uuid, e);
                            }
                        }

                        let next_tick = l.next_tick_for_job(uuid).await;
                        if let Ok(Some(ts)) = next_tick {
                            tracing::info!("Next feedback scan is at {:?}", ts)
                        }
                    })
                },
            )?)
            .await?;
    }

    scheduler.set_shutdown_handler(Box::new(move || {
        Box::pin(async move {
            tracing::info!("Shutting down scheduler");
        })
    }));

    match scheduler.start().await {
        Ok(_) => tracing::info!("Scheduler started"),
        Err(e) => tracing::error!("Failed to start scheduler: {:?}", e),
    }

    run_server(router, scheduler).await
}

/// Console logging always; additionally a JSON-lines debug log file when
/// DEBUG_LOG_FILE points somewhere writable.
fn init_tracing() {
    let debug_log_layer = env::var("DEBUG_LOG_FILE").ok().map(|path| {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .unwrap_or_else(|e| panic!("Failed to open debug log file {}: {}", path, e));

        tracing_subscriber::fmt::Layer::default()
            .json()
            .with_ansi(false)
            .with_writer(Arc::new(file))
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::Layer::default().with_ansi(false))
        .with(debug_log_layer)
        .init();
}

async fn run_server(router: Router, scheduler: JobScheduler) -> anyhow::Result<()> {
    let port = env::var("PORT").unwrap_or("5006".to_string());
    tracing::info!("AutoCRM server running on http://0.0.0.0:{}", port);
    println!("{}", *server_config::cfg);

    let addr = SocketAddr::from(([0, 0, 0, 0], port.parse::<u16>()?));
    tracing::debug!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(scheduler))
    .await?;

    Ok(())
}

async fn shutdown_signal(mut scheduler: JobScheduler) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            scheduler.shutdown().await.ok();
            tracing::info!("Cleanups done, shutting down");
        },
        _ = terminate => {
            scheduler.shutdown().await.ok();
            tracing::info!("Cleanups done, shutting down");
        },
    }
}
