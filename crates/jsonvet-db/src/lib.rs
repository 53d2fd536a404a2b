//! # jsonvet-db — Postgres Row Source
//!
//! Implements the engine's [`RowSource`] over a single Postgres
//! connection. The audit run is synchronous and fully sequential, so
//! this crate owns a current-thread tokio runtime and blocks on each
//! query; one query is in flight at any time, matching the engine's
//! one-record-at-a-time model.
//!
//! Connections require TLS (`sslmode=require`); audited databases are
//! reached over untrusted networks.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{Connection, PgConnection};
use thiserror::Error;
use tokio::runtime::Runtime;

use jsonvet_core::RecordId;
use jsonvet_engine::augment::{DATASOURCES_TABLE, USERS_TABLE};
use jsonvet_engine::{RowSource, SourceError};

/// Lookup table mapping path ids to type-label names.
const TYPE_LOOKUP_TABLE: &str = "dictionaries.user_paths";

/// Failure establishing the database session.
#[derive(Error, Debug)]
pub enum DbError {
    /// The connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    Options(#[source] sqlx::Error),

    /// The server refused or dropped the connection attempt.
    #[error("could not connect to the database: {0}")]
    Connect(#[source] sqlx::Error),

    /// The blocking runtime could not be built.
    #[error("runtime initialization failed: {0}")]
    Runtime(#[from] std::io::Error),
}

/// A [`RowSource`] backed by one Postgres connection.
pub struct PgRowSource {
    runtime: Runtime,
    connection: PgConnection,
}

impl PgRowSource {
    /// Connect with `sslmode=require`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when the connection string is malformed, the
    /// runtime cannot start, or the server cannot be reached.
    pub fn connect(connection_string: &str) -> Result<Self, DbError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let options = PgConnectOptions::from_str(connection_string)
            .map_err(DbError::Options)?
            .ssl_mode(PgSslMode::Require);
        let connection = runtime
            .block_on(PgConnection::connect_with(&options))
            .map_err(DbError::Connect)?;
        Ok(Self {
            runtime,
            connection,
        })
    }

    fn fetch_text_column(
        &mut self,
        table: &str,
        sql: &str,
    ) -> Result<Vec<Option<String>>, SourceError> {
        self.runtime
            .block_on(
                sqlx::query_scalar::<_, Option<String>>(sql).fetch_all(&mut self.connection),
            )
            .map_err(|error| SourceError {
                table: table.to_owned(),
                reason: error.to_string(),
            })
    }
}

impl RowSource for PgRowSource {
    fn payloads(&mut self, table: &str, field: &str) -> Result<Vec<Option<String>>, SourceError> {
        let sql = format!("SELECT {field}::text FROM {table}");
        self.fetch_text_column(table, &sql)
    }

    fn ids(&mut self, table: &str) -> Result<Vec<RecordId>, SourceError> {
        let sql = format!("SELECT id::text FROM {table}");
        Ok(self
            .fetch_text_column(table, &sql)?
            .into_iter()
            .map(|id| RecordId(id.unwrap_or_default()))
            .collect())
    }

    fn type_labels(&mut self, table: &str) -> Result<Vec<String>, SourceError> {
        let join_column = match table {
            USERS_TABLE => "path",
            DATASOURCES_TABLE => "user_path",
            other => {
                tracing::warn!(
                    table = %other,
                    "type labels are only defined for the users and datasources tables"
                );
                return Ok(Vec::new());
            }
        };
        let sql = format!(
            "SELECT up.name FROM {table} \
             JOIN {TYPE_LOOKUP_TABLE} up ON {table}.{join_column} = up.id"
        );
        Ok(self
            .fetch_text_column(table, &sql)?
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect())
    }
}
