pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::LocalReportSink, CliConfig};
pub use crate::core::{api::ApiClient, suite::CheckSuite};
pub use utils::error::{ProbeError, Result};
