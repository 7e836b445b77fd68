// Status extraction stages, in chain order
pub mod structured_data;
pub mod keywords;

pub use keywords::KeywordStage;
pub use structured_data::StructuredDataStage;
