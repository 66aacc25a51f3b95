//! Data models and structures for the RX gap tester

pub mod config;
pub mod results;
pub mod stream;
pub mod test_case;

// Re-export main model types
pub use config::Config;
pub use results::{Anomaly, AnomalyKind, CaseOutcome, CaseResult, RunReport};
pub use stream::StreamParams;
pub use test_case::TestCase;
