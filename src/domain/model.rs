use serde::{Serialize, Serializer};
use std::time::Duration;

/// 單一檢查的最終狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Failed,
    Skipped,
}

/// 檢查執行結果，會輸出到終端與 JSON 報告
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub check_name: String,
    pub status: CheckStatus,
    pub details: Vec<String>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_duration_ms")]
    pub duration: Duration,
}

impl CheckReport {
    pub fn passed(check_name: &str) -> Self {
        Self {
            check_name: check_name.to_string(),
            status: CheckStatus::Passed,
            details: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn failed(check_name: &str, reason: impl Into<String>) -> Self {
        Self {
            check_name: check_name.to_string(),
            status: CheckStatus::Failed,
            details: vec![reason.into()],
            duration: Duration::ZERO,
        }
    }

    pub fn skipped(check_name: &str, reason: impl Into<String>) -> Self {
        Self {
            check_name: check_name.to_string(),
            status: CheckStatus::Skipped,
            details: vec![reason.into()],
            duration: Duration::ZERO,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == CheckStatus::Failed
    }
}

fn serialize_duration_ms<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(duration.as_millis() as u64)
}

/// 列表端點回應的封套：`{ "items": [...], "pagination": { "total": n }? }`。
/// 裸陣列也接受（舊端點還沒有加上分頁封套）。
#[derive(Debug, Clone)]
pub struct ListPage {
    pub items: Vec<serde_json::Value>,
    pub total: Option<u64>,
}

impl ListPage {
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Array(items) => Some(Self {
                items: items.clone(),
                total: None,
            }),
            serde_json::Value::Object(obj) => {
                let items = obj.get("items")?.as_array()?.clone();
                let total = obj
                    .get("pagination")
                    .and_then(|p| p.get("total"))
                    .and_then(|t| t.as_u64());
                Some(Self { items, total })
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
