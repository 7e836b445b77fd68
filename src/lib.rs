pub mod change_detector;
pub mod config;
pub mod extractor;
pub mod models;
pub mod plugins;
pub mod scheduler;
pub mod scraper;
pub mod stock_checker;
pub mod store;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use extractor::{Extraction, StatusExtractor};
pub use models::{MonitorConfig, StockStatus, TrackedItem};
pub use scheduler::{SweepScheduler, SweepTiming};
pub use scraper::{PageFetcher, WebScraper};
pub use stock_checker::{ItemCheckResult, StockChecker};
pub use store::TrackingStore;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
