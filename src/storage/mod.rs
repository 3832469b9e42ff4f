use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::MergedDataset;

mod sqlite;
pub use sqlite::SqliteStorage;

/// Rows written by one `persist` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    pub students: usize,
    pub classes: usize,
    pub enrollments: usize,
    pub grades: usize,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn migrate(&self) -> Result<()>;
    /// Store a merged dataset. Grades and enrollments are linked through the ids the
    /// store assigns, never through their position in the dataset.
    async fn persist(&self, source_url: &str, dataset: &MergedDataset) -> Result<PersistReport>;
}
