use std::process::ExitCode;
use std::sync::Arc;

use facilities_registry::{
    application::{
        error::{AppError, ErrorReport, HandlerError},
        handlers::{
            CreateCommand, DeleteCommand, EditCommand, EntityContext, EntityHandlers,
            GetAllQuery, GetByIdQuery, GetFilteredQuery, RequestHandler,
        },
        query::QueryParameters,
        repos::Repository,
    },
    cache::{CacheConfig, CacheService},
    config::{self, Command, EntityKind, Settings},
    domain::{
        Entity,
        entities::{
            Category, Employee, Grade, Housing, Material, MeasurementStandard, Room,
            ServiceRecord,
        },
    },
    infra::{
        db::{PgEntity, PostgresRepositories},
        error::InfraError,
        memory::MemoryRepository,
        telemetry,
    },
};
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::sync::CancellationToken;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_application_error(&error);
            ExitCode::from(error.exit_code())
        }
    }
}

fn report_application_error(error: &AppError) {
    let report = ErrorReport::from_error("facilities-registry", error);
    let log = || {
        error!(
            source = report.source,
            error = %error,
            chain = ?report.messages,
            "application error"
        );
    };

    if dispatcher::has_been_set() {
        log();
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, log);
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let cancel = CancellationToken::new();
    spawn_interrupt_listener(cancel.clone());

    let (entity, action) = match cli_args.command {
        Command::Migrate => return run_migrations(&settings).await,
        Command::List(args) => (args.entity, Action::List),
        Command::Get(args) => (args.entity, Action::Get(args.id)),
        Command::Query(args) => (args.entity, Action::Query(args.parameters())),
        Command::Create(args) => (args.entity, Action::Create(args.json)),
        Command::Edit(args) => (
            args.entity,
            Action::Edit {
                id: args.id,
                json: args.json,
            },
        ),
        Command::Delete(args) => (args.entity, Action::Delete(args.id)),
    };

    let store = Store::open(&settings).await?;
    let cache = CacheService::from_config(&CacheConfig::from(&settings.cache));
    let runner = Runner {
        store,
        cache,
        cancel,
    };

    match entity {
        EntityKind::Category => runner.execute::<Category>(action).await,
        EntityKind::Grade => runner.execute::<Grade>(action).await,
        EntityKind::Housing => runner.execute::<Housing>(action).await,
        EntityKind::Room => runner.execute::<Room>(action).await,
        EntityKind::Employee => runner.execute::<Employee>(action).await,
        EntityKind::Material => runner.execute::<Material>(action).await,
        EntityKind::MeasurementStandard => runner.execute::<MeasurementStandard>(action).await,
        EntityKind::ServiceRecord => runner.execute::<ServiceRecord>(action).await,
    }
}

fn spawn_interrupt_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; canceling in-flight request");
            cancel.cancel();
        }
    });
}

async fn run_migrations(settings: &Settings) -> Result<(), AppError> {
    let url = settings
        .database
        .url
        .as_deref()
        .ok_or(InfraError::DatabaseRequired { command: "migrate" })?;
    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::database)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;
    info!("database migrations applied");
    Ok(())
}

enum Action {
    List,
    Get(i64),
    Query(QueryParameters),
    Create(String),
    Edit { id: i64, json: String },
    Delete(i64),
}

enum Store {
    Postgres(PostgresRepositories),
    /// Process-local store; contents last for one invocation.
    Memory,
}

impl Store {
    async fn open(settings: &Settings) -> Result<Self, InfraError> {
        let Some(url) = settings.database.url.as_deref() else {
            warn!("no database url configured; using an empty in-memory store");
            return Ok(Self::Memory);
        };

        let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
            .await
            .map_err(InfraError::database)?;
        let repositories = PostgresRepositories::new(pool);
        repositories
            .health_check()
            .await
            .map_err(InfraError::database)?;
        Ok(Self::Postgres(repositories))
    }

    fn repository<T: PgEntity>(&self) -> Arc<dyn Repository<T>> {
        match self {
            Store::Postgres(repositories) => Arc::new(repositories.repository::<T>()),
            Store::Memory => Arc::new(MemoryRepository::<T>::new()),
        }
    }
}

struct Runner {
    store: Store,
    cache: CacheService,
    cancel: CancellationToken,
}

impl Runner {
    async fn execute<T>(&self, action: Action) -> Result<(), AppError>
    where
        T: PgEntity + Serialize + DeserializeOwned,
    {
        let handlers = EntityHandlers::new(EntityContext::new(
            self.store.repository::<T>(),
            self.cache.clone(),
        ));
        let cancel = &self.cancel;

        match action {
            Action::List => {
                let items = handlers.get_all.handle(GetAllQuery, cancel).await?;
                print_json(&*items)
            }
            Action::Get(id) => {
                let item = handlers
                    .get_by_id
                    .handle(GetByIdQuery { id }, cancel)
                    .await?
                    .ok_or_else(|| HandlerError::not_found(T::NAME, id))?;
                print_json(&item)
            }
            Action::Query(parameters) => {
                let page = handlers
                    .get_filtered
                    .handle(GetFilteredQuery { parameters }, cancel)
                    .await?;
                print_json(&page)
            }
            Action::Create(json) => {
                let entity: T = parse_body(&json)?;
                let saved = handlers
                    .create
                    .handle(CreateCommand { entity }, cancel)
                    .await?;
                print_json(&Saved { saved })
            }
            Action::Edit { id, json } => {
                let entity: T = parse_body(&json)?;
                let saved = handlers
                    .edit
                    .handle(EditCommand { id, entity }, cancel)
                    .await?;
                print_json(&Saved { saved })
            }
            Action::Delete(id) => {
                let saved = handlers
                    .delete
                    .handle(DeleteCommand { id }, cancel)
                    .await?;
                print_json(&Saved { saved })
            }
        }
    }
}

#[derive(Serialize)]
struct Saved {
    saved: u64,
}

fn parse_body<T: Entity + DeserializeOwned>(json: &str) -> Result<T, AppError> {
    serde_json::from_str(json)
        .map_err(|err| AppError::input(format!("invalid {} body: {err}", T::NAME)))
}

fn print_json<V: Serialize + ?Sized>(value: &V) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
