use crate::app::checks::endpoint_check::finalize_report;
use crate::config::suite_config::CheckDefinition;
use crate::core::api::ApiClient;
use crate::core::suite::{Check, CheckOutcome, ProbeContext};
use crate::utils::error::Result;

/// 驗證檢查：送出刻意不合法的 payload（負的價格之類），
/// API 必須以期望的 4xx 拒絕才算通過。2xx 表示後端放行了壞資料。
pub struct RejectionCheck {
    definition: CheckDefinition,
    client: ApiClient,
}

impl RejectionCheck {
    pub fn new(definition: CheckDefinition, client: ApiClient) -> Self {
        Self { definition, client }
    }

    fn expected_status(&self) -> u16 {
        self.definition
            .expect
            .as_ref()
            .and_then(|e| e.status)
            .unwrap_or(400)
    }
}

/// 從錯誤回應撈出人類可讀的驗證訊息
fn validation_message(body: &serde_json::Value) -> Option<&str> {
    ["error", "message", "detail"]
        .iter()
        .find_map(|key| body.get(*key).and_then(|v| v.as_str()))
}

#[async_trait::async_trait]
impl Check for RejectionCheck {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn should_run(&self, context: &ProbeContext) -> bool {
        !(self.definition.requires_auth() && context.token().is_none())
    }

    fn skip_reason(&self, _context: &ProbeContext) -> String {
        "requires auth but no token is available".to_string()
    }

    async fn run(&self, context: &ProbeContext) -> Result<CheckOutcome> {
        let response = self.client.execute(&self.definition.request, context).await?;

        let expected = self.expected_status();
        let mut details = vec![format!("status {}", response.status)];
        let mut failures = Vec::new();

        if response.is_success() {
            failures.push(format!(
                "API accepted an invalid payload with status {}",
                response.status
            ));
        } else if response.status.as_u16() != expected {
            failures.push(format!(
                "expected rejection with status {}, got {}",
                expected, response.status
            ));
        } else {
            match validation_message(&response.body) {
                Some(message) => details.push(format!("rejected: {}", message)),
                None => details.push("rejected without a validation message".to_string()),
            }
        }

        let report = finalize_report(&self.definition.name, details, failures);
        Ok(CheckOutcome::from_report(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_message_extraction() {
        assert_eq!(
            validation_message(&json!({"error": "price must be positive"})),
            Some("price must be positive")
        );
        assert_eq!(
            validation_message(&json!({"message": "Preis darf nicht negativ sein"})),
            Some("Preis darf nicht negativ sein")
        );
        assert_eq!(validation_message(&json!({"items": []})), None);
    }
}
