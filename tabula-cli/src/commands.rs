//! `describe`, `count` and `find` against a live service.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::debug;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabula_core::{DataQueryBuilder, Session};
use tabula_http::{DataStore, HttpTransport, Transport, TransportConfig};

use crate::CliError;

pub(crate) const ARG_BASE_URL: &str = "base-url";
pub(crate) const ARG_TABLE: &str = "table";
pub(crate) const ARG_TIMEOUT: &str = "timeout-secs";
pub(crate) const ARG_WHERE: &str = "where";
pub(crate) const ARG_SORT_BY: &str = "sort-by";
pub(crate) const ARG_RELATED: &str = "related";
pub(crate) const ARG_PAGE_SIZE: &str = "page-size";
pub(crate) const ARG_OFFSET: &str = "offset";

/// Environment variables naming the required options of one command.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequiredEnv {
    pub(crate) base_url: &'static str,
    pub(crate) table: &'static str,
}

pub(crate) const DESCRIBE_ENV: RequiredEnv = RequiredEnv {
    base_url: "TABULA_CMDS_DESCRIBE_BASE_URL",
    table: "TABULA_CMDS_DESCRIBE_TABLE",
};
pub(crate) const COUNT_ENV: RequiredEnv = RequiredEnv {
    base_url: "TABULA_CMDS_COUNT_BASE_URL",
    table: "TABULA_CMDS_COUNT_TABLE",
};
pub(crate) const FIND_ENV: RequiredEnv = RequiredEnv {
    base_url: "TABULA_CMDS_FIND_BASE_URL",
    table: "TABULA_CMDS_FIND_TABLE",
};

/// CLI arguments for the `describe` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Print the column schema of a table")]
#[ortho_config(prefix = "TABULA")]
pub(crate) struct DescribeArgs {
    /// Remote table name.
    #[arg(value_name = "table")]
    #[serde(default)]
    pub(crate) table: Option<String>,
    /// Service base URL, including the application id and REST key.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// Request timeout in seconds.
    #[arg(long = ARG_TIMEOUT, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

/// CLI arguments for the `count` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Count the objects of a table matching a where clause")]
#[ortho_config(prefix = "TABULA")]
pub(crate) struct CountArgs {
    /// Remote table name.
    #[arg(value_name = "table")]
    #[serde(default)]
    pub(crate) table: Option<String>,
    /// Service base URL, including the application id and REST key.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// Request timeout in seconds.
    #[arg(long = ARG_TIMEOUT, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Where clause, e.g. "age > 5".
    #[arg(long = ARG_WHERE, value_name = "clause")]
    #[serde(default)]
    pub(crate) where_clause: Option<String>,
}

/// CLI arguments for the `find` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Find objects of a table. Options can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Find the objects of a table"
)]
#[ortho_config(prefix = "TABULA")]
pub(crate) struct FindArgs {
    /// Remote table name.
    #[arg(value_name = "table")]
    #[serde(default)]
    pub(crate) table: Option<String>,
    /// Service base URL, including the application id and REST key.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// Request timeout in seconds.
    #[arg(long = ARG_TIMEOUT, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Where clause, e.g. "age > 5".
    #[arg(long = ARG_WHERE, value_name = "clause")]
    #[serde(default)]
    pub(crate) where_clause: Option<String>,
    /// Comma-separated sort columns, e.g. "name,age DESC".
    #[arg(long = ARG_SORT_BY, value_name = "columns")]
    #[serde(default)]
    pub(crate) sort_by: Option<String>,
    /// Comma-separated relations to load with each object.
    #[arg(long = ARG_RELATED, value_name = "relations")]
    #[serde(default)]
    pub(crate) related: Option<String>,
    /// Maximum number of objects returned.
    #[arg(long = ARG_PAGE_SIZE, value_name = "n")]
    #[serde(default)]
    pub(crate) page_size: Option<u32>,
    /// Number of objects skipped.
    #[arg(long = ARG_OFFSET, value_name = "n")]
    #[serde(default)]
    pub(crate) offset: Option<u32>,
}

impl DescribeArgs {
    pub(crate) fn into_operation(self) -> Result<Operation, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(Operation::Describe(ServiceConfig::try_from(merged)?))
    }
}

impl CountArgs {
    pub(crate) fn into_operation(self) -> Result<Operation, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(Operation::Count(QueryConfig::try_from(merged)?))
    }
}

impl FindArgs {
    pub(crate) fn into_operation(self) -> Result<Operation, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(Operation::Find(QueryConfig::try_from(merged)?))
    }
}

/// Where to send requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServiceConfig {
    pub(crate) base_url: String,
    pub(crate) table: String,
    pub(crate) timeout: Option<Duration>,
}

impl ServiceConfig {
    fn resolve(
        base_url: Option<String>,
        table: Option<String>,
        timeout_secs: Option<u64>,
        env: RequiredEnv,
    ) -> Result<Self, CliError> {
        let base_url = base_url.ok_or(CliError::MissingArgument {
            field: ARG_BASE_URL,
            env: env.base_url,
        })?;
        let table = table
            .filter(|table| !table.is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_TABLE,
                env: env.table,
            })?;
        Ok(Self {
            base_url,
            table,
            timeout: timeout_secs.map(Duration::from_secs),
        })
    }

    pub(crate) fn transport_config(&self) -> TransportConfig {
        let config = TransportConfig::new(self.base_url.clone());
        match self.timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }
}

impl TryFrom<DescribeArgs> for ServiceConfig {
    type Error = CliError;

    fn try_from(args: DescribeArgs) -> Result<Self, Self::Error> {
        Self::resolve(args.base_url, args.table, args.timeout_secs, DESCRIBE_ENV)
    }
}

/// A service target plus the query to run against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueryConfig {
    pub(crate) service: ServiceConfig,
    pub(crate) query: DataQueryBuilder,
}

impl TryFrom<CountArgs> for QueryConfig {
    type Error = CliError;

    fn try_from(args: CountArgs) -> Result<Self, Self::Error> {
        let service = ServiceConfig::resolve(args.base_url, args.table, args.timeout_secs, COUNT_ENV)?;
        let mut query = DataQueryBuilder::new();
        if let Some(clause) = args.where_clause {
            query = query.with_where_clause(clause);
        }
        Ok(Self { service, query })
    }
}

impl TryFrom<FindArgs> for QueryConfig {
    type Error = CliError;

    fn try_from(args: FindArgs) -> Result<Self, Self::Error> {
        let service = ServiceConfig::resolve(args.base_url, args.table, args.timeout_secs, FIND_ENV)?;
        let mut query = DataQueryBuilder::new();
        if let Some(clause) = args.where_clause {
            query = query.with_where_clause(clause);
        }
        if let Some(columns) = args.sort_by.as_deref() {
            query = query.with_sort_by(split_list(columns));
        }
        if let Some(relations) = args.related.as_deref() {
            query = query.with_related(split_list(relations));
        }
        if let Some(page_size) = args.page_size {
            query = query.with_page_size(page_size);
        }
        if let Some(offset) = args.offset {
            query = query.with_offset(offset);
        }
        Ok(Self { service, query })
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// A resolved command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Operation {
    Describe(ServiceConfig),
    Count(QueryConfig),
    Find(QueryConfig),
}

impl Operation {
    pub(crate) const fn service(&self) -> &ServiceConfig {
        match self {
            Self::Describe(service) => service,
            Self::Count(config) | Self::Find(config) => &config.service,
        }
    }
}

/// Builds the transport for a command invocation.
pub(crate) trait TransportBuilder {
    type Output: Transport;

    fn build(&self, config: &ServiceConfig) -> Result<Self::Output, CliError>;
}

pub(crate) struct HttpTransportBuilder;

impl TransportBuilder for HttpTransportBuilder {
    type Output = HttpTransport;

    fn build(&self, config: &ServiceConfig) -> Result<Self::Output, CliError> {
        HttpTransport::with_config(config.transport_config()).map_err(|source| {
            CliError::BuildTransport {
                base_url: config.base_url.clone(),
                source,
            }
        })
    }
}

/// Run `operation` to completion and return its JSON output.
pub(crate) fn execute<B: TransportBuilder>(
    operation: &Operation,
    builder: &B,
) -> Result<Value, CliError> {
    let transport = builder.build(operation.service())?;
    let store = DataStore::new(transport, Arc::new(Session::default()));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    runtime.block_on(dispatch(&store, operation))
}

async fn dispatch<T: Transport>(
    store: &DataStore<T>,
    operation: &Operation,
) -> Result<Value, CliError> {
    let table = store.table(operation.service().table.as_str());
    debug!("running against table {}", table.table());
    let output = match operation {
        Operation::Describe(_) => {
            let properties = table.describe().await?;
            serde_json::to_value(properties).map_err(CliError::SerializeOutput)?
        }
        Operation::Count(config) => Value::from(table.count(Some(&config.query)).await?),
        Operation::Find(config) => Value::Array(
            table
                .find(Some(&config.query))
                .await?
                .into_value()
                .into_iter()
                .map(Value::Object)
                .collect(),
        ),
    };
    Ok(output)
}

pub(crate) fn write_output(writer: &mut dyn Write, output: &Value) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(output).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn count_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<QueryConfig, CliError> {
    let merged = CountArgs::merge_from_layers(layers).map_err(CliError::from)?;
    QueryConfig::try_from(merged)
}
