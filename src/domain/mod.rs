pub mod model;
pub mod ports;

pub use model::{CheckReport, CheckStatus, ListPage};
pub use ports::{ProbeTarget, ReportSink};
