use std::{process, sync::Arc};

use replbuild::{
    application::{
        error::AppError,
        preview::PreviewSessions,
        repls::ReplService,
        repos::ReplsRepo,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        memory::InMemoryRepositories,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Seed(_) => run_seed(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repls_repo = init_repositories(&settings).await?;
    let repls = Arc::new(ReplService::new(repls_repo.clone()));

    let seeded = repls
        .seed_defaults()
        .await
        .map_err(|err| AppError::unexpected(format!("failed to seed sample repls: {err}")))?;
    if seeded > 0 {
        info!(target = "replbuild::serve", seeded, "Store was empty, added samples");
    }

    let previews = Arc::new(PreviewSessions::new(
        repls_repo,
        settings.preview.session_config(),
    ));

    let sweep_interval = settings.preview.sweep_interval;
    let sweeper = {
        let previews = previews.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            interval.tick().await;
            loop {
                interval.tick().await;
                let closed = previews.sweep_idle().await;
                if closed > 0 {
                    info!(
                        target = "replbuild::preview::sweeper",
                        closed, "Closed idle preview sessions"
                    );
                }
            }
        })
    };

    let result = serve_http(&settings, HttpState::new(repls, previews)).await;

    sweeper.abort();
    let _ = sweeper.await;

    result
}

async fn run_seed(settings: config::Settings) -> Result<(), AppError> {
    if settings.database.url.is_none() {
        return Err(AppError::validation(
            "seed requires a database url; the in-memory store does not outlive the process",
        ));
    }

    let repls = ReplService::new(init_repositories(&settings).await?);
    let created = repls
        .seed_defaults()
        .await
        .map_err(|err| AppError::unexpected(format!("failed to seed sample repls: {err}")))?;

    info!(target = "replbuild::seed", created, "Seeding finished");
    Ok(())
}

async fn init_repositories(settings: &config::Settings) -> Result<Arc<dyn ReplsRepo>, AppError> {
    let Some(database_url) = settings.database.url.as_ref() else {
        warn!(
            target = "replbuild::serve",
            "No database url configured, repls are kept in memory"
        );
        return Ok(Arc::new(InMemoryRepositories::new()));
    };

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::migration(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "replbuild::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "replbuild::serve", "Shutdown signal received");
}
