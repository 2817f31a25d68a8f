pub mod api;
pub mod cache;
pub mod chart;
pub mod data_collector;
pub mod database_sqlx;
pub mod error;
pub mod export;
pub mod models;
pub mod transform;
pub mod utils;

pub use error::EtlError;
