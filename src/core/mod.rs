pub mod api;
pub mod suite;

pub use crate::domain::model::{CheckReport, CheckStatus, ListPage};
pub use crate::domain::ports::{ProbeTarget, ReportSink};
pub use crate::utils::error::Result;
pub use suite::{Check, CheckOutcome, CheckSuite, FailurePolicy, ProbeContext};
