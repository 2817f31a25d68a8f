use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, MySql, QueryBuilder};
use tracing::{debug, info};

use crate::error::EtlError;
use crate::models::{Config, IntradayTable};

/// Rows per multi-row INSERT; six bind parameters each keeps us far below
/// MySQL's 65535 placeholder limit.
const INSERT_BATCH_SIZE: usize = 1000;

/// Destination for the normalized table
#[async_trait]
pub trait TableSink {
    /// Replace the destination's contents with `table`. Returns rows written.
    async fn replace_table(&self, table: &IntradayTable) -> Result<u64, EtlError>;
}

/// SQLX-based MySQL writer. Opens one connection per call, no pooling.
#[derive(Clone)]
pub struct DatabaseManagerSqlx {
    options: MySqlConnectOptions,
    table_name: Option<String>,
}

impl DatabaseManagerSqlx {
    pub fn new(config: &Config) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&config.db_host)
            .username(&config.db_user)
            .password(&config.db_password)
            .database(&config.db_name);
        if let Some(port) = config.db_port {
            options = options.port(port);
        }

        Self {
            options,
            table_name: config.db_table_name.clone(),
        }
    }

    fn table_name(&self) -> Result<&str, EtlError> {
        self.table_name
            .as_deref()
            .ok_or_else(|| EtlError::Persistence("DB_TABLE_NAME is not set".to_string()))
    }
}

#[async_trait]
impl TableSink for DatabaseManagerSqlx {
    async fn replace_table(&self, table: &IntradayTable) -> Result<u64, EtlError> {
        let table_ident = quote_identifier(self.table_name()?)?;

        let mut conn = MySqlConnection::connect_with(&self.options).await?;
        info!("🗄️  Connected to MySQL, replacing table {}", table_ident);

        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table_ident))
            .execute(&mut conn)
            .await?;
        sqlx::query(&create_table_sql(&table_ident))
            .execute(&mut conn)
            .await?;

        let mut tx = conn.begin().await?;
        let mut written = 0u64;
        for chunk in table.rows.chunks(INSERT_BATCH_SIZE) {
            let mut builder: QueryBuilder<MySql> =
                QueryBuilder::new(format!("INSERT INTO {} ({}) ", table_ident, column_list()));
            builder.push_values(chunk, |mut row, bar| {
                row.push_bind(bar.datetime)
                    .push_bind(bar.open)
                    .push_bind(bar.high)
                    .push_bind(bar.low)
                    .push_bind(bar.close)
                    .push_bind(bar.volume);
            });

            let result = builder.build().execute(&mut *tx).await?;
            written += result.rows_affected();
            debug!("Inserted batch of {} rows", chunk.len());
        }
        tx.commit().await?;
        conn.close().await?;

        info!("✅ Table {} now holds {} rows", table_ident, written);
        Ok(written)
    }
}

/// Backtick-quote a MySQL identifier, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> Result<String, EtlError> {
    let name = name.trim();
    if name.is_empty() || name.len() > 64 || name.contains('\0') {
        return Err(EtlError::Persistence(format!("invalid table name '{}'", name)));
    }
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// SQL type per entry of [`IntradayTable::COLUMNS`]
const COLUMN_TYPES: [&str; 6] = ["DATETIME", "DOUBLE", "DOUBLE", "DOUBLE", "DOUBLE", "BIGINT"];

fn column_list() -> String {
    IntradayTable::COLUMNS
        .iter()
        .map(|column| format!("`{}`", column))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn create_table_sql(table_ident: &str) -> String {
    let columns: Vec<String> = IntradayTable::COLUMNS
        .iter()
        .zip(COLUMN_TYPES)
        .map(|(column, sql_type)| format!("`{}` {}", column, sql_type))
        .collect();
    format!("CREATE TABLE {} ({})", table_ident, columns.join(", "))
}
