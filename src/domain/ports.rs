use crate::utils::error::Result;

/// 提供探測目標的連線資訊（CLI 或測試替身都可實作）
pub trait ProbeTarget: Send + Sync {
    fn base_url(&self) -> &str;
    fn tenant_id(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
}

/// 報告輸出端
pub trait ReportSink: Send + Sync {
    fn write_report(
        &self,
        filename: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
