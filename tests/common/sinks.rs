//! In-memory stand-in for the MySQL sink

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use stock_intraday::database_sqlx::TableSink;
use stock_intraday::models::IntradayTable;
use stock_intraday::EtlError;

/// Records every table it is asked to store; clones share the record.
#[derive(Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<IntradayTable>>>,
}

impl RecordingSink {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Contents after the last replace, like the real table
    pub fn current(&self) -> Option<IntradayTable> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TableSink for RecordingSink {
    async fn replace_table(&self, table: &IntradayTable) -> Result<u64, EtlError> {
        self.calls.lock().unwrap().push(table.clone());
        Ok(table.len() as u64)
    }
}
