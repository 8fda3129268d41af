use crate::config::suite_config::{CheckDefinition, ExpectConfig};
use crate::core::api::{ApiClient, ApiResponse};
use crate::core::suite::{Check, CheckOutcome, ProbeContext};
use crate::domain::model::{CheckReport, CheckStatus, ListPage};
use crate::utils::error::Result;

/// 通用端點檢查：發一個請求，評估狀態碼與列表期望，
/// 通過時把配置指定的回應欄位匯出到共享上下文。
pub struct EndpointCheck {
    definition: CheckDefinition,
    client: ApiClient,
}

impl EndpointCheck {
    pub fn new(definition: CheckDefinition, client: ApiClient) -> Self {
        Self { definition, client }
    }
}

/// 狀態碼評估。未設定期望值時任何 2xx 都算通過。
pub(crate) fn evaluate_status(
    expect: &ExpectConfig,
    response: &ApiResponse,
    failures: &mut Vec<String>,
) {
    match expect.status {
        Some(code) if response.status.as_u16() != code => {
            failures.push(format!(
                "expected status {}, got {}",
                code, response.status
            ));
        }
        None if !response.is_success() => {
            failures.push(format!("unexpected status {}", response.status));
        }
        _ => {}
    }
}

/// 列表期望評估：筆數下限/精確筆數、每筆必要欄位。
/// 回傳解析出的頁面供呼叫端做進一步檢查。
pub(crate) fn evaluate_listing(
    expect: &ExpectConfig,
    response: &ApiResponse,
    details: &mut Vec<String>,
    failures: &mut Vec<String>,
) -> Option<ListPage> {
    let page = match ListPage::from_value(&response.body) {
        Some(page) => page,
        None => {
            failures.push("response body has no 'items' array".to_string());
            return None;
        }
    };

    match page.total {
        Some(total) => details.push(format!("{} items (total {})", page.len(), total)),
        None => details.push(format!("{} items", page.len())),
    }

    if let Some(min) = expect.min_items {
        if page.len() < min {
            failures.push(format!("expected at least {} items, got {}", min, page.len()));
        }
    }

    if let Some(exact) = expect.exact_items {
        if page.len() != exact {
            failures.push(format!("expected exactly {} items, got {}", exact, page.len()));
        }
    }

    if let Some(fields) = &expect.required_fields {
        for field in fields {
            let missing = page
                .items
                .iter()
                .filter(|item| item.get(field).map_or(true, |v| v.is_null()))
                .count();
            if missing > 0 {
                failures.push(format!(
                    "{} of {} items missing field '{}'",
                    missing,
                    page.len(),
                    field
                ));
            }
        }
    }

    Some(page)
}

pub(crate) fn finalize_report(
    check_name: &str,
    details: Vec<String>,
    failures: Vec<String>,
) -> CheckReport {
    let mut report = CheckReport::passed(check_name);
    report.details = details;
    if !failures.is_empty() {
        report.status = CheckStatus::Failed;
        report.details.extend(failures);
    }
    report
}

#[async_trait::async_trait]
impl Check for EndpointCheck {
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

        let expect = self.definition.expect.clone().unwrap_or_default();
        let mut details = vec![format!("status {}", response.status)];
        let mut failures = Vec::new();

        evaluate_status(&expect, &response, &mut failures);

        let has_listing_expectations = expect.min_items.is_some()
            || expect.exact_items.is_some()
            || expect.required_fields.is_some();
        if has_listing_expectations {
            evaluate_listing(&expect, &response, &mut details, &mut failures);
        }

        let report = finalize_report(&self.definition.name, details, failures);
        let mut outcome = CheckOutcome::from_report(report);

        // 只有通過的檢查才匯出欄位，失敗的回應內容不可信
        if outcome.report.status == CheckStatus::Passed {
            if let Some(export) = &self.definition.export {
                for (field, key) in &export.fields {
                    match response.field(field) {
                        Some(value) => {
                            outcome.exports.insert(key.clone(), value.clone());
                        }
                        None => {
                            outcome.report.status = CheckStatus::Failed;
                            outcome.report.details.push(format!(
                                "export field '{}' missing from response",
                                field
                            ));
                        }
                    }
                }
            }
        }

        Ok(outcome)
    }
}
