//! Scrapes student, class and grade records out of loosely structured HTML pages,
//! follows detail-page links, and reconciles everything into one dataset.

pub mod config;
pub mod error;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod scrapers;
pub mod storage;
pub mod utils;

pub use crate::config::{Config, SelectorConfig};
pub use error::{IngestError, Result};
pub use models::MergedDataset;
pub use pipeline::{merge_documents, normalize_records, parse_document, Pipeline};
pub use scrapers::{discover_links, extract_records, Selectors};
