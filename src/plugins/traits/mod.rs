pub mod notifier;
pub mod stage;

pub use notifier::{Notifier, NotificationResult, StockChangeEvent};
pub use stage::{ExtractionStage, Page, StageOutcome, StageResult};
