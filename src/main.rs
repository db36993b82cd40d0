use std::{process, sync::Arc};

use foglio::{
    application::{
        accounts::AccountService,
        blog::BlogService,
        error::AppError,
        repos::{CommentsRepo, PostsRepo, TokensRepo, UsersRepo},
    },
    cache::{CacheConfig, MemoryStore, ReadCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, AppState},
        telemetry,
    },
};
use sqlx::PgPool;
use tracing::{Dispatch, Level, dispatcher, error, info};
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
    let (cli_args, settings) = config::load_with_cli().map_err(InfraError::from)?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(config::ServeArgs::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_app_state(repositories, &settings);
    serve_http(&settings, state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    info!(target = "foglio::migrate", "Migrations applied");
    Ok(())
}

async fn connect_pool(settings: &config::Settings) -> Result<PgPool, AppError> {
    let pool = PostgresRepositories::connect(
        &settings.database.url,
        settings.database.max_connections.get(),
        settings.database.acquire_timeout,
    )
    .await
    .map_err(InfraError::from)?;

    Ok(pool)
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let pool = connect_pool(settings).await?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_app_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> AppState {
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let tokens_repo: Arc<dyn TokensRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();

    let cache_config = CacheConfig::from(&settings.cache);
    let store = Arc::new(MemoryStore::new(&cache_config));
    let cache = ReadCache::new(store, cache_config);

    let accounts = Arc::new(AccountService::new(users_repo, tokens_repo));
    let blog = Arc::new(BlogService::new(posts_repo, comments_repo, cache));

    AppState {
        api: ApiState { accounts, blog },
        db: repositories,
    }
}

async fn serve_http(settings: &config::Settings, state: AppState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.listen)
        .await
        .map_err(InfraError::from)?;

    info!(
        target = "foglio::http",
        addr = %settings.server.listen,
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InfraError::from)?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(target = "foglio::http", "shutdown requested");
    }
}
