use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use makerspace_admin::api::axum::{AppState, router};
use makerspace_admin::{EnvSecretSource, InMemorySubmissionRepository, SiteConfig};

#[derive(Debug, Parser)]
#[command(name = "makerspace-admin", version, about = "Makerspace admin and submissions API")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Postgres connection string for stored submissions
    #[cfg(feature = "sqlx_postgres")]
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Keep submissions in process memory (lost on restart)
    #[arg(long)]
    memory_store: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = SiteConfig::from_env();
    let mut state = connect_database(&args, AppState::new(Arc::new(EnvSecretSource), config)).await?;

    if state.submissions.is_none() && args.memory_store {
        state = state.with_submissions(Arc::new(InMemorySubmissionRepository::new()));
        log::warn!(target: "makerspace_admin", "msg=\"using in-memory submission store\"");
    }

    if state.submissions.is_none() {
        log::warn!(
            target: "makerspace_admin",
            "msg=\"no datastore configured, submissions will answer 503\""
        );
    }

    if !state.secrets.load().is_configured() {
        log::warn!(
            target: "makerspace_admin",
            "msg=\"admin authentication not configured, admin routes will answer 503\""
        );
    }

    let sweepers = state.limiters.spawn_sweepers();

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    log::info!(target: "makerspace_admin", "msg=\"listening\", addr=\"{}\"", args.bind);

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    for sweeper in sweepers {
        sweeper.shutdown();
    }
    log::info!(target: "makerspace_admin", "msg=\"shut down\"");

    Ok(())
}

#[cfg(feature = "sqlx_postgres")]
async fn connect_database(
    args: &Args,
    state: AppState,
) -> Result<AppState, makerspace_admin::SiteError> {
    match args.database_url.as_deref() {
        Some(url) => {
            let repo = makerspace_admin::postgres::connect(url).await?;
            Ok(state.with_submissions(Arc::new(repo)))
        }
        None => Ok(state),
    }
}

#[cfg(not(feature = "sqlx_postgres"))]
async fn connect_database(
    _args: &Args,
    state: AppState,
) -> Result<AppState, makerspace_admin::SiteError> {
    Ok(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!(target: "makerspace_admin", "msg=\"signal handler failed\", error=\"{e}\"");
    }
}
