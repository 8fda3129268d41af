use crate::domain::model::{CheckReport, CheckStatus};
use crate::utils::error::{ProbeError, Result};
use std::collections::HashMap;
use std::time::Instant;

/// 檢查執行上下文，用於在檢查間傳遞數據（登入 token、匯出的欄位）
#[derive(Debug, Clone)]
pub struct ProbeContext {
    pub execution_id: String,
    pub shared_data: HashMap<String, serde_json::Value>,
    pub reports: Vec<CheckReport>,
}

impl ProbeContext {
    pub fn new(execution_id: String) -> Self {
        Self {
            execution_id,
            shared_data: HashMap::new(),
            reports: Vec::new(),
        }
    }

    /// 登入檢查匯出的 bearer token
    pub fn token(&self) -> Option<&str> {
        self.shared_data.get("token").and_then(|v| v.as_str())
    }

    pub fn add_shared_data(&mut self, key: String, value: serde_json::Value) {
        self.shared_data.insert(key, value);
    }

    pub fn get_shared_data(&self, key: &str) -> Option<&serde_json::Value> {
        self.shared_data.get(key)
    }

    pub fn get_report_by_name(&self, name: &str) -> Option<&CheckReport> {
        self.reports.iter().find(|r| r.check_name == name)
    }

    pub fn add_report(&mut self, report: CheckReport) {
        self.reports.push(report);
    }
}

/// 檢查結果：報告加上要寫回共享上下文的匯出欄位。
/// 上下文在執行期間歸套件所有，檢查本身只讀，匯出由套件合併。
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub report: CheckReport,
    pub exports: HashMap<String, serde_json::Value>,
}

impl CheckOutcome {
    pub fn from_report(report: CheckReport) -> Self {
        Self {
            report,
            exports: HashMap::new(),
        }
    }

    pub fn with_export(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.exports.insert(key.into(), value);
        self
    }
}

/// 帶上下文的檢查介面
#[async_trait::async_trait]
pub trait Check: Send + Sync {
    fn name(&self) -> &str;

    /// 根據上下文決定是否執行
    fn should_run(&self, _context: &ProbeContext) -> bool {
        true
    }

    /// 跳過時寫入報告的原因
    fn skip_reason(&self, _context: &ProbeContext) -> String {
        "precondition not met".to_string()
    }

    async fn run(&self, context: &ProbeContext) -> Result<CheckOutcome>;
}

/// 檢查失敗時套件的行為
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    Stop,
    #[default]
    Continue,
}

impl FailurePolicy {
    pub fn parse(value: Option<&str>) -> Result<Self> {
        match value {
            None => Ok(Self::default()),
            Some("stop") => Ok(Self::Stop),
            Some("continue") => Ok(Self::Continue),
            Some(other) => Err(ProbeError::ConfigError {
                field: "error_handling.on_check_failure".to_string(),
                message: format!("Expected 'stop' or 'continue', got '{}'", other),
            }),
        }
    }
}

/// 檢查套件，負責順序執行多個檢查並收集報告
pub struct CheckSuite {
    checks: Vec<Box<dyn Check>>,
    execution_id: String,
    on_failure: FailurePolicy,
    initial_shared_data: HashMap<String, serde_json::Value>,
}

impl CheckSuite {
    pub fn new(execution_id: String) -> Self {
        Self {
            checks: Vec::new(),
            execution_id,
            on_failure: FailurePolicy::default(),
            initial_shared_data: HashMap::new(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    /// 套件配置的 `[global] shared_variables` 先放進上下文
    pub fn with_shared_data(mut self, data: HashMap<String, serde_json::Value>) -> Self {
        self.initial_shared_data = data;
        self
    }

    pub fn add_check(&mut self, check: Box<dyn Check>) {
        self.checks.push(check);
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// 順序執行所有檢查。單一檢查的失敗不會變成 Err：
    /// 失敗會記錄為 Failed 報告，由失敗策略決定是否中止後續檢查。
    pub async fn execute_all(&mut self) -> Result<Vec<CheckReport>> {
        let mut context = ProbeContext::new(self.execution_id.clone());
        context.shared_data.extend(self.initial_shared_data.clone());

        for check in &self.checks {
            if !check.should_run(&context) {
                let reason = check.skip_reason(&context);
                tracing::info!("⏭️ Skipping check: {} ({})", check.name(), reason);
                context.add_report(CheckReport::skipped(check.name(), reason));
                continue;
            }

            let start_time = Instant::now();
            let report = match check.run(&context).await {
                Ok(mut outcome) => {
                    outcome.report.duration = start_time.elapsed();

                    for (key, value) in outcome.exports {
                        tracing::debug!("📤 {}: exported '{}' to context", check.name(), key);
                        context.add_shared_data(key, value);
                    }

                    outcome.report
                }
                Err(e) => {
                    let mut report = CheckReport::failed(check.name(), e.to_string());
                    report.duration = start_time.elapsed();
                    report
                }
            };

            match report.status {
                CheckStatus::Passed => tracing::info!(
                    "✅ {}: passed ({:?})",
                    report.check_name,
                    report.duration
                ),
                CheckStatus::Failed => tracing::error!(
                    "❌ {}: failed - {}",
                    report.check_name,
                    report.details.join("; ")
                ),
                CheckStatus::Skipped => {}
            }

            let failed = report.is_failed();
            context.add_report(report);

            if failed && self.on_failure == FailurePolicy::Stop {
                tracing::warn!("🛑 Stopping suite after failed check (policy: stop)");
                break;
            }
        }

        Ok(context.reports)
    }

    /// 獲取執行摘要
    pub fn get_execution_summary(reports: &[CheckReport]) -> HashMap<String, serde_json::Value> {
        let mut summary = HashMap::new();

        let count = |status: CheckStatus| -> usize {
            reports.iter().filter(|r| r.status == status).count()
        };

        let total_duration_ms: u64 = reports
            .iter()
            .map(|r| r.duration.as_millis() as u64)
            .sum();

        summary.insert(
            "total_checks".to_string(),
            serde_json::Value::Number(reports.len().into()),
        );
        summary.insert(
            "passed".to_string(),
            serde_json::Value::Number(count(CheckStatus::Passed).into()),
        );
        summary.insert(
            "failed".to_string(),
            serde_json::Value::Number(count(CheckStatus::Failed).into()),
        );
        summary.insert(
            "skipped".to_string(),
            serde_json::Value::Number(count(CheckStatus::Skipped).into()),
        );
        summary.insert(
            "total_duration_ms".to_string(),
            serde_json::Value::Number(total_duration_ms.into()),
        );

        let check_names: Vec<serde_json::Value> = reports
            .iter()
            .map(|r| serde_json::Value::String(r.check_name.clone()))
            .collect();
        summary.insert(
            "executed_checks".to_string(),
            serde_json::Value::Array(check_names),
        );

        summary
    }
}

/// 組出寫入報告檔的 JSON 文件
pub fn build_suite_report(
    suite_name: &str,
    execution_id: &str,
    reports: &[CheckReport],
) -> serde_json::Value {
    serde_json::json!({
        "suite": suite_name,
        "execution_id": execution_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "summary": CheckSuite::get_execution_summary(reports),
        "checks": reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockCheck {
        name: String,
        should_run: bool,
        fail: bool,
        exports: HashMap<String, serde_json::Value>,
        requires_token: bool,
    }

    impl MockCheck {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                should_run: true,
                fail: false,
                exports: HashMap::new(),
                requires_token: false,
            }
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        fn with_export(mut self, key: &str, value: serde_json::Value) -> Self {
            self.exports.insert(key.to_string(), value);
            self
        }

        fn with_run_condition(mut self, should_run: bool) -> Self {
            self.should_run = should_run;
            self
        }

        fn requiring_token(mut self) -> Self {
            self.requires_token = true;
            self
        }
    }

    #[async_trait::async_trait]
    impl Check for MockCheck {
        fn name(&self) -> &str {
            &self.name
        }

        fn should_run(&self, context: &ProbeContext) -> bool {
            if self.requires_token && context.token().is_none() {
                return false;
            }
            self.should_run
        }

        async fn run(&self, context: &ProbeContext) -> Result<CheckOutcome> {
            let report = if self.fail {
                CheckReport::failed(&self.name, "mock failure")
            } else if self.requires_token {
                CheckReport::passed(&self.name)
                    .with_detail(format!("token={}", context.token().unwrap()))
            } else {
                CheckReport::passed(&self.name)
            };

            let mut outcome = CheckOutcome::from_report(report);
            outcome.exports = self.exports.clone();
            Ok(outcome)
        }
    }

    #[test]
    fn test_probe_context_shared_data() {
        let mut context = ProbeContext::new("test".to_string());
        assert!(context.token().is_none());

        context.add_shared_data("token".to_string(), serde_json::json!("tok_1"));
        context.add_shared_data("api_version".to_string(), serde_json::json!("v2"));

        assert_eq!(context.token(), Some("tok_1"));
        assert_eq!(
            context.get_shared_data("api_version").unwrap(),
            &serde_json::json!("v2")
        );
        assert!(context.get_shared_data("nonexistent").is_none());
    }

    #[test]
    fn test_probe_context_reports() {
        let mut context = ProbeContext::new("test".to_string());
        context.add_report(CheckReport::passed("health"));
        context.add_report(CheckReport::failed("products", "boom"));

        assert_eq!(
            context.get_report_by_name("health").unwrap().status,
            CheckStatus::Passed
        );
        assert!(context.get_report_by_name("ghost").is_none());
    }

    #[tokio::test]
    async fn test_suite_executes_in_order() {
        let mut suite = CheckSuite::new("test".to_string());
        suite.add_check(Box::new(MockCheck::new("health")));
        suite.add_check(Box::new(MockCheck::new("products")));

        let reports = suite.execute_all().await.unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].check_name, "health");
        assert_eq!(reports[1].check_name, "products");
        assert!(reports.iter().all(|r| r.status == CheckStatus::Passed));
    }

    #[tokio::test]
    async fn test_exports_flow_to_later_checks() {
        let mut suite = CheckSuite::new("test".to_string());
        suite.add_check(Box::new(
            MockCheck::new("login").with_export("token", serde_json::json!("tok_42")),
        ));
        suite.add_check(Box::new(MockCheck::new("inventory").requiring_token()));

        let reports = suite.execute_all().await.unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].status, CheckStatus::Passed);
        assert_eq!(reports[1].details, vec!["token=tok_42".to_string()]);
    }

    #[tokio::test]
    async fn test_auth_check_skipped_without_token() {
        let mut suite = CheckSuite::new("test".to_string());
        suite.add_check(Box::new(MockCheck::new("inventory").requiring_token()));

        let reports = suite.execute_all().await.unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status, CheckStatus::Skipped);
    }

    #[tokio::test]
    async fn test_continue_policy_runs_past_failures() {
        let mut suite =
            CheckSuite::new("test".to_string()).with_failure_policy(FailurePolicy::Continue);
        suite.add_check(Box::new(MockCheck::new("first").failing()));
        suite.add_check(Box::new(MockCheck::new("second")));

        let reports = suite.execute_all().await.unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].status, CheckStatus::Failed);
        assert_eq!(reports[1].status, CheckStatus::Passed);
    }

    #[tokio::test]
    async fn test_stop_policy_halts_after_failure() {
        let mut suite =
            CheckSuite::new("test".to_string()).with_failure_policy(FailurePolicy::Stop);
        suite.add_check(Box::new(MockCheck::new("first").failing()));
        suite.add_check(Box::new(MockCheck::new("second")));

        let reports = suite.execute_all().await.unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status, CheckStatus::Failed);
    }

    #[tokio::test]
    async fn test_disabled_check_recorded_as_skipped() {
        let mut suite = CheckSuite::new("test".to_string());
        suite.add_check(Box::new(MockCheck::new("off").with_run_condition(false)));
        suite.add_check(Box::new(MockCheck::new("on")));

        let reports = suite.execute_all().await.unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].status, CheckStatus::Skipped);
        assert_eq!(reports[1].status, CheckStatus::Passed);
    }

    #[test]
    fn test_execution_summary() {
        let reports = vec![
            CheckReport::passed("health"),
            CheckReport::failed("products", "boom"),
            CheckReport::skipped("inventory", "no token"),
        ];

        let summary = CheckSuite::get_execution_summary(&reports);

        assert_eq!(summary.get("total_checks").unwrap(), &serde_json::json!(3));
        assert_eq!(summary.get("passed").unwrap(), &serde_json::json!(1));
        assert_eq!(summary.get("failed").unwrap(), &serde_json::json!(1));
        assert_eq!(summary.get("skipped").unwrap(), &serde_json::json!(1));

        let executed = summary.get("executed_checks").unwrap().as_array().unwrap();
        assert_eq!(executed.len(), 3);
    }

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!(FailurePolicy::parse(None).unwrap(), FailurePolicy::Continue);
        assert_eq!(
            FailurePolicy::parse(Some("stop")).unwrap(),
            FailurePolicy::Stop
        );
        assert!(FailurePolicy::parse(Some("explode")).is_err());
    }
}
