use crate::app::checks::endpoint_check::{evaluate_listing, evaluate_status, finalize_report};
use crate::config::suite_config::CheckDefinition;
use crate::core::api::ApiClient;
use crate::core::suite::{Check, CheckOutcome, ProbeContext};
use crate::utils::error::Result;

/// 低於這個庫存量就算 Kritisch（item 沒帶 min_stock 時的後備值）
const DEFAULT_MIN_STOCK: f64 = 10.0;

/// 庫存頁的狀態徽章
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockBadge {
    Leer,
    Kritisch,
    Normal,
}

/// 依 `stock` 與 `min_stock` 分類，對應庫存頁上的徽章。
/// `stock` 缺漏或不是數字時回傳 None，由呼叫端記為失敗。
pub fn classify_stock(item: &serde_json::Value) -> Option<StockBadge> {
    let stock = item.get("stock")?.as_f64()?;
    let min_stock = item
        .get("min_stock")
        .and_then(|v| v.as_f64())
        .unwrap_or(DEFAULT_MIN_STOCK);

    if stock <= 0.0 {
        Some(StockBadge::Leer)
    } else if stock < min_stock {
        Some(StockBadge::Kritisch)
    } else {
        Some(StockBadge::Normal)
    }
}

/// 庫存檢查：列出 `/api/inventory` 並統計各狀態徽章的筆數。
/// 這取代了舊流程裡人工打開庫存頁數 "undefined" 列的驗證腳本。
pub struct InventoryCheck {
    definition: CheckDefinition,
    client: ApiClient,
}

impl InventoryCheck {
    pub fn new(definition: CheckDefinition, client: ApiClient) -> Self {
        Self { definition, client }
    }
}

#[async_trait::async_trait]
impl Check for InventoryCheck {
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

        if let Some(page) = evaluate_listing(&expect, &response, &mut details, &mut failures) {
            let mut leer = 0usize;
            let mut kritisch = 0usize;
            let mut normal = 0usize;
            let mut unusable = 0usize;

            for item in &page.items {
                match classify_stock(item) {
                    Some(StockBadge::Leer) => leer += 1,
                    Some(StockBadge::Kritisch) => kritisch += 1,
                    Some(StockBadge::Normal) => normal += 1,
                    None => unusable += 1,
                }
            }

            details.push(format!(
                "Leer: {}, Kritisch: {}, Normal: {}",
                leer, kritisch, normal
            ));

            if unusable > 0 {
                failures.push(format!(
                    "{} of {} items have no usable 'stock' field",
                    unusable,
                    page.len()
                ));
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
    fn test_classify_empty_stock() {
        assert_eq!(
            classify_stock(&json!({"name": "Mehl", "stock": 0})),
            Some(StockBadge::Leer)
        );
        assert_eq!(
            classify_stock(&json!({"name": "Mehl", "stock": -2.5})),
            Some(StockBadge::Leer)
        );
    }

    #[test]
    fn test_classify_critical_stock() {
        assert_eq!(
            classify_stock(&json!({"stock": 3, "min_stock": 5})),
            Some(StockBadge::Kritisch)
        );
        // min_stock 缺漏時使用後備門檻
        assert_eq!(
            classify_stock(&json!({"stock": 4})),
            Some(StockBadge::Kritisch)
        );
    }

    #[test]
    fn test_classify_normal_stock() {
        assert_eq!(
            classify_stock(&json!({"stock": 20, "min_stock": 5})),
            Some(StockBadge::Normal)
        );
        assert_eq!(
            classify_stock(&json!({"stock": 10})),
            Some(StockBadge::Normal)
        );
    }

    #[test]
    fn test_classify_missing_stock() {
        assert_eq!(classify_stock(&json!({"name": "Mehl"})), None);
        assert_eq!(classify_stock(&json!({"stock": "viel"})), None);
    }
}
