use anyhow::Context;
use clap::Parser;
use omsctl::{
    Application, Config,
    api::models::users::CurrentUser,
    auth::session::create_session_token,
    db::handlers::Users,
    telemetry,
};
use sqlx::PgPool;

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

/// Sign a bearer token for an existing user and print it
async fn issue_token(config: &Config, username: &str) -> anyhow::Result<()> {
    let database_url = config.database_url().context("No database URL configured")?;
    let pool = PgPool::connect(database_url).await?;

    let mut conn = pool.acquire().await?;
    let user = Users::new(&mut conn)
        .get_by_username(username)
        .await?
        .with_context(|| format!("User '{username}' does not exist"))?;

    let token = create_session_token(&CurrentUser::from(user), config)?;
    println!("{token}");

    pool.close().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before anything else that might open a TLS connection
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let args = omsctl::config::Args::parse();
    let config = Config::load(&args)?;

    // If --validate flag is set, exit successfully after config validation
    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    if let Some(username) = args.issue_token.as_deref() {
        return issue_token(&config, username).await;
    }

    telemetry::init_telemetry(config.enable_otel_export)?;
    tracing::debug!("{:?}", args);

    Application::new(config).await?.serve(shutdown_signal()).await
}
