use chrono::NaiveDate;
use tracing::info;

use crate::api::TimeSeriesProvider;
use crate::cache::{ensure_current, CacheStatus};
use crate::database_sqlx::TableSink;
use crate::error::EtlError;
use crate::export::write_csv;
use crate::models::{ArtifactPaths, IntradayTable};
use crate::transform::normalize;
use crate::utils::{log_completion, log_completion_sync};

/// What one pipeline run did
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub cache_status: CacheStatus,
    pub table: IntradayTable,
    pub csv_rows: usize,
    pub db_rows: u64,
}

/// Runs the fetch, normalize, and persist stages in order.
///
/// Each stage takes the previous stage's output and returns its own; the
/// collector itself only holds the provider, the sink, and the artifact paths.
pub struct DataCollector<P, S> {
    provider: P,
    sink: S,
    paths: ArtifactPaths,
}

impl<P, S> DataCollector<P, S>
where
    P: TimeSeriesProvider,
    S: TableSink,
{
    pub fn new(provider: P, sink: S, paths: ArtifactPaths) -> Self {
        Self {
            provider,
            sink,
            paths,
        }
    }

    /// One full run against the calendar date `today`
    pub async fn run(&self, today: NaiveDate) -> Result<PipelineReport, EtlError> {
        info!("🚀 Starting intraday pipeline for {}", today);

        let snapshot = log_completion("ensure_current", || {
            ensure_current(&self.provider, &self.paths.json_cache, today)
        })
        .await?;

        let table = log_completion_sync("normalize", || normalize(&snapshot.payload))?;

        let csv_rows = log_completion_sync("write_csv", || write_csv(&table, &self.paths.csv))?;

        let db_rows = log_completion("replace_table", || self.sink.replace_table(&table)).await?;

        info!(
            "🎉 Pipeline finished: {} rows ({:?})",
            table.len(),
            snapshot.status
        );

        Ok(PipelineReport {
            cache_status: snapshot.status,
            table,
            csv_rows,
            db_rows,
        })
    }
}
