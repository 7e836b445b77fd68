pub mod notifiers;
pub mod stages;
pub mod traits;

pub use traits::{ExtractionStage, Notifier};
