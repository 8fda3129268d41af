use crate::app::checks::endpoint_check::{evaluate_status, finalize_report};
use crate::config::suite_config::CheckDefinition;
use crate::core::api::ApiClient;
use crate::core::suite::{Check, CheckOutcome, ProbeContext};
use crate::utils::error::Result;

/// 登入檢查：POST 帳密到 `/api/auth/login`，
/// 把回應的 `token` 匯出到共享上下文，後面的授權檢查靠它組 Bearer 標頭。
pub struct LoginCheck {
    definition: CheckDefinition,
    client: ApiClient,
}

impl LoginCheck {
    pub fn new(definition: CheckDefinition, client: ApiClient) -> Self {
        Self { definition, client }
    }

    /// 預設匯出 `token` -> `token`，可由 `[checks.export]` 覆寫
    fn export_fields(&self) -> Vec<(String, String)> {
        match &self.definition.export {
            Some(export) => export
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => vec![("token".to_string(), "token".to_string())],
        }
    }
}

#[async_trait::async_trait]
impl Check for LoginCheck {
    fn name(&self) -> &str {
        &self.definition.name
    }

    async fn run(&self, context: &ProbeContext) -> Result<CheckOutcome> {
        let response = self.client.execute(&self.definition.request, context).await?;

        let expect = self.definition.expect.clone().unwrap_or_default();
        let mut details = vec![format!("status {}", response.status)];
        let mut failures = Vec::new();

        evaluate_status(&expect, &response, &mut failures);

        let mut exports = std::collections::HashMap::new();
        if failures.is_empty() {
            for (field, key) in self.export_fields() {
                match response.field(&field) {
                    Some(serde_json::Value::String(token)) if !token.is_empty() => {
                        // token 本身不進日誌
                        details.push(format!("{} acquired ({} chars)", field, token.len()));
                        exports.insert(key, serde_json::Value::String(token.clone()));
                    }
                    Some(_) => {
                        failures.push(format!("login response field '{}' is not a string", field));
                    }
                    None => {
                        failures.push(format!("login response has no '{}' field", field));
                    }
                }
            }
        }

        if !failures.is_empty() {
            exports.clear();
        }

        let report = finalize_report(&self.definition.name, details, failures);
        let mut outcome = CheckOutcome::from_report(report);
        outcome.exports = exports;
        Ok(outcome)
    }
}
