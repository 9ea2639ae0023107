//! Argument parsing, configuration and command dispatch for the `assetdb`
//! binary.

use anyhow::{Context, Result};
use assetdb_client::constants::{
    field_set, DEFAULT_FOLDER_FIELDS, DEFAULT_PROJECT_FIELDS, DEFAULT_REPRESENTATION_FIELDS,
    DEFAULT_SUBSET_FIELDS, DEFAULT_TASK_FIELDS, DEFAULT_VERSION_FIELDS,
};
use assetdb_client::entities::{
    get_assets, get_last_version_by_subset_name, get_projects, get_representations,
    get_subsets, get_versions, AssetQuery, RepresentationQuery, SubsetQuery, VersionQuery,
};
use assetdb_client::queries::{
    folders_graphql_query, projects_graphql_query, representations_graphql_query,
    subsets_graphql_query, tasks_graphql_query, versions_graphql_query,
};
use assetdb_client::{
    default_connection, ClientResult, Document, HttpConnection, ServerConfig, ServerConnection,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "assetdb")]
#[command(about = "Query an asset database server")]
pub struct Cli {
    /// Server URL, overrides the config file and ASSETDB_SERVER_URL
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// API key, overrides the config file and ASSETDB_API_KEY
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// JSON file with connection settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List projects
    Projects {
        /// Include inactive projects
        #[arg(long)]
        inactive: bool,
        /// Only library projects
        #[arg(long)]
        library: bool,
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// List assets of a project
    Assets {
        project: String,
        #[arg(long = "id")]
        ids: Vec<String>,
        #[arg(long = "name")]
        names: Vec<String>,
        /// Parent asset id; the project name or "root" selects top level assets
        #[arg(long = "parent")]
        parents: Vec<String>,
        /// Archived assets instead of active ones
        #[arg(long)]
        archived: bool,
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// List subsets of a project
    Subsets {
        project: String,
        #[arg(long = "id")]
        ids: Vec<String>,
        #[arg(long = "name")]
        names: Vec<String>,
        #[arg(long = "asset-id")]
        asset_ids: Vec<String>,
        #[arg(long)]
        archived: bool,
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// List versions of a project
    Versions {
        project: String,
        #[arg(long = "id")]
        ids: Vec<String>,
        #[arg(long = "subset-id")]
        subset_ids: Vec<String>,
        #[arg(long = "version")]
        versions: Vec<i64>,
        /// Include hero versions
        #[arg(long)]
        hero: bool,
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// List representations of a project
    Representations {
        project: String,
        #[arg(long = "id")]
        ids: Vec<String>,
        #[arg(long = "name")]
        names: Vec<String>,
        #[arg(long = "version-id")]
        version_ids: Vec<String>,
        /// Include archived representations
        #[arg(long)]
        archived: bool,
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// Latest version of a subset under an asset
    LastVersion {
        project: String,
        subset_name: String,
        #[arg(long, required_unless_present = "asset_name")]
        asset_id: Option<String>,
        #[arg(long)]
        asset_name: Option<String>,
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// Print the query document for an entity kind without contacting a server
    Render {
        #[arg(value_enum)]
        kind: EntityKind,
        /// Dotted v4 field paths; the kind's defaults when empty
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Bind the project name variable
        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Projects,
    Folders,
    Tasks,
    Subsets,
    Versions,
    Representations,
}

fn optional(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

/// Connection settings from the environment, then the config file, then the
/// command line flags, each overriding the previous. Validated once, after
/// every layer is applied.
pub fn resolve_config<F>(cli: &Cli, lookup: F) -> Result<ServerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ServerConfig::default();
    config
        .apply_env(lookup)
        .context("invalid ASSETDB_* environment")?;

    if let Some(path) = &cli.config {
        config
            .apply_file(path)
            .with_context(|| format!("invalid config file {}", path.display()))?;
    }

    if let Some(server) = &cli.server {
        config.server_url = server.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config.api_key = Some(api_key.clone());
    }
    config.validate()?;
    Ok(config)
}

impl Cli {
    /// True when no flag or file overrides the environment settings.
    pub fn uses_environment_only(&self) -> bool {
        self.server.is_none() && self.api_key.is_none() && self.config.is_none()
    }
}

/// Connection for the online commands.
///
/// Without overrides this is the process-wide default connection, which reads
/// the process environment itself and ignores `lookup`. Otherwise a dedicated
/// connection is built from the resolved settings.
pub fn connect<F>(cli: &Cli, lookup: F) -> Result<Arc<HttpConnection>>
where
    F: Fn(&str) -> Option<String>,
{
    if cli.uses_environment_only() {
        return default_connection().context("failed to open default connection");
    }
    let config = resolve_config(cli, lookup)?;
    info!("Connecting to {}", config.base_url());
    let con = HttpConnection::new(config).context("failed to create connection")?;
    Ok(Arc::new(con))
}

/// Renders the query document of `kind`, offline.
pub fn render_query(
    kind: EntityKind,
    fields: &[String],
    project: Option<&str>,
) -> ClientResult<String> {
    let defaults = match kind {
        EntityKind::Projects => DEFAULT_PROJECT_FIELDS,
        EntityKind::Folders => DEFAULT_FOLDER_FIELDS,
        EntityKind::Tasks => DEFAULT_TASK_FIELDS,
        EntityKind::Subsets => DEFAULT_SUBSET_FIELDS,
        EntityKind::Versions => DEFAULT_VERSION_FIELDS,
        EntityKind::Representations => DEFAULT_REPRESENTATION_FIELDS,
    };
    let fields: BTreeSet<String> = if fields.is_empty() {
        field_set(defaults.iter().copied())
    } else {
        field_set(fields.iter().cloned())
    };

    let mut query = match kind {
        EntityKind::Projects => projects_graphql_query(&fields)?,
        EntityKind::Folders => folders_graphql_query(&fields)?,
        EntityKind::Tasks => tasks_graphql_query(&fields)?,
        EntityKind::Subsets => subsets_graphql_query(&fields)?,
        EntityKind::Versions => versions_graphql_query(&fields)?,
        EntityKind::Representations => representations_graphql_query(&fields)?,
    };
    if let Some(project) = project {
        if query.get_variable("projectName").is_some() {
            query.set_variable_value("projectName", project)?;
        }
    }
    Ok(query.calculate_query()?)
}

fn documents(documents: Vec<Document>) -> Value {
    Value::Array(documents.into_iter().map(Value::Object).collect())
}

/// Runs one command and returns its JSON output. `render` never touches
/// the connection.
pub async fn run_command<C>(con: &C, command: &Command) -> ClientResult<Value>
where
    C: ServerConnection + ?Sized,
{
    debug!(?command, "running command");
    let output = match command {
        Command::Projects {
            inactive,
            library,
            fields,
        } => {
            let library = library.then_some(true);
            let fields = optional(fields);
            documents(get_projects(con, true, *inactive, library, fields.as_deref()).await?)
        }
        Command::Assets {
            project,
            ids,
            names,
            parents,
            archived,
            fields,
        } => {
            let query = AssetQuery {
                asset_ids: optional(ids),
                asset_names: optional(names),
                parent_ids: (!parents.is_empty())
                    .then(|| parents.iter().cloned().map(Some).collect()),
                archived: *archived,
                fields: optional(fields),
            };
            documents(get_assets(con, project, &query).await?)
        }
        Command::Subsets {
            project,
            ids,
            names,
            asset_ids,
            archived,
            fields,
        } => {
            let query = SubsetQuery {
                subset_ids: optional(ids),
                subset_names: optional(names),
                asset_ids: optional(asset_ids),
                archived: *archived,
                fields: optional(fields),
                ..Default::default()
            };
            documents(get_subsets(con, project, &query).await?)
        }
        Command::Versions {
            project,
            ids,
            subset_ids,
            versions,
            hero,
            fields,
        } => {
            let query = VersionQuery {
                version_ids: optional(ids),
                subset_ids: optional(subset_ids),
                versions: (!versions.is_empty()).then(|| versions.clone()),
                hero: *hero,
                fields: optional(fields),
            };
            documents(get_versions(con, project, &query).await?)
        }
        Command::Representations {
            project,
            ids,
            names,
            version_ids,
            archived,
            fields,
        } => {
            let query = RepresentationQuery {
                representation_ids: optional(ids),
                representation_names: optional(names),
                version_ids: optional(version_ids),
                archived: *archived,
                fields: optional(fields),
                ..Default::default()
            };
            documents(get_representations(con, project, &query).await?)
        }
        Command::LastVersion {
            project,
            subset_name,
            asset_id,
            asset_name,
            fields,
        } => {
            let fields = optional(fields);
            get_last_version_by_subset_name(
                con,
                project,
                subset_name,
                asset_id.as_deref(),
                asset_name.as_deref(),
                fields.as_deref(),
            )
            .await?
            .map_or(Value::Null, Value::Object)
        }
        Command::Render {
            kind,
            fields,
            project,
        } => Value::String(render_query(*kind, fields, project.as_deref())?),
    };
    Ok(output)
}
