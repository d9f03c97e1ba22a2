pub mod analyzer;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod glpi;
pub mod parser;
pub mod scheduler;

pub use config::AppConfig;
pub use error::{AppError, ExtractionError};
