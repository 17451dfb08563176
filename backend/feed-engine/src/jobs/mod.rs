pub mod rescorer;

pub use rescorer::{start_rescorer, RescoreSummary, Rescorer};
