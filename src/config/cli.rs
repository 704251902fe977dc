use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, builder::BoolishValueParser};

use crate::application::query::{QueryParameters, SortDirection};

/// Command-line arguments for the registry binary.
#[derive(Debug, Parser)]
#[command(
    name = "facilities-registry",
    version,
    about = "Facilities and inventory registry"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "REGISTRY_CONFIG_FILE", value_name = "PATH", global = true)]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: SettingsOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// Print every record of an entity type.
    List(EntityArgs),
    /// Print one record by id.
    Get(IdArgs),
    /// Print one page of a filtered, sorted listing.
    Query(QueryArgs),
    /// Create a record from a JSON body.
    Create(CreateArgs),
    /// Replace a record from a JSON body.
    Edit(EditArgs),
    /// Delete a record by id.
    Delete(IdArgs),
}

/// Registry record types addressable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Category,
    Grade,
    Housing,
    Room,
    Employee,
    Material,
    MeasurementStandard,
    ServiceRecord,
}

#[derive(Debug, Args, Clone)]
pub struct EntityArgs {
    #[arg(value_enum)]
    pub entity: EntityKind,
}

#[derive(Debug, Args, Clone)]
pub struct IdArgs {
    #[arg(value_enum)]
    pub entity: EntityKind,
    pub id: i64,
}

#[derive(Debug, Args, Clone)]
pub struct CreateArgs {
    #[arg(value_enum)]
    pub entity: EntityKind,

    /// Record body as JSON; `id` is ignored.
    #[arg(long, value_name = "JSON")]
    pub json: String,
}

#[derive(Debug, Args, Clone)]
pub struct EditArgs {
    #[arg(value_enum)]
    pub entity: EntityKind,
    pub id: i64,

    /// Replacement body as JSON; `id` is taken from the positional argument.
    #[arg(long, value_name = "JSON")]
    pub json: String,
}

#[derive(Debug, Args, Clone)]
pub struct QueryArgs {
    #[arg(value_enum)]
    pub entity: EntityKind,

    /// Case-insensitive text to look for.
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub search: String,

    /// Field to search; defaults to the record type's usual text fields.
    #[arg(long = "search-by", value_name = "FIELD", default_value = "")]
    pub search_by: String,

    /// Field to sort by; defaults to id order.
    #[arg(long = "sort-by", value_name = "FIELD", default_value = "")]
    pub sort_by: String,

    /// Sort descending instead of ascending.
    #[arg(long)]
    pub descending: bool,

    /// Page size; non-positive values fall back to 10.
    #[arg(
        long = "items-on-page",
        value_name = "COUNT",
        default_value_t = 10,
        allow_negative_numbers = true
    )]
    pub items_on_page: i64,

    /// 1-based page; non-positive values fall back to 1.
    #[arg(
        long = "page-number",
        value_name = "PAGE",
        default_value_t = 1,
        allow_negative_numbers = true
    )]
    pub page_number: i64,
}

impl QueryArgs {
    pub fn parameters(&self) -> QueryParameters {
        let direction = if self.descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        QueryParameters::new()
            .search(self.search.clone())
            .search_by(self.search_by.clone())
            .sort_by(self.sort_by.clone(), direction)
            .page(self.page_number, self.items_on_page)
    }
}

/// Settings overridable from any subcommand.
#[derive(Debug, Args, Default, Clone)]
pub struct SettingsOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT", global = true)]
    pub database_max_connections: Option<u32>,

    /// Override the hard cache TTL.
    #[arg(long = "cache-absolute-expiration-seconds", value_name = "SECONDS", global = true)]
    pub cache_absolute_expiration_seconds: Option<u64>,

    /// Override the idle cache TTL.
    #[arg(long = "cache-sliding-expiration-seconds", value_name = "SECONDS", global = true)]
    pub cache_sliding_expiration_seconds: Option<u64>,

    /// Deduplicate concurrent cache reloads.
    #[arg(
        long = "cache-single-flight",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub cache_single_flight: Option<bool>,
}
