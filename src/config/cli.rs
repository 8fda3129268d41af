use crate::domain::ports::ReportSink;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

/// 把 JSON 報告寫到本地資料夾
#[derive(Debug, Clone)]
pub struct LocalReportSink {
    base_path: String,
}

impl LocalReportSink {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl ReportSink for LocalReportSink {
    async fn write_report(&self, filename: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(filename);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}
