use crate::config::suite_config::RequestConfig;
use crate::core::api::{ApiClient, ApiResponse};
use crate::core::suite::ProbeContext;
use crate::utils::error::{ProbeError, Result};

/// 佈建統計：成功建立、已存在跳過、失敗各自計數。
/// 衝突（409 或帶 "exists"/"duplicate" 的 400）記為跳過，不算失敗。
#[derive(Debug, Default)]
pub struct SeedStats {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SeedStats {
    pub fn record(&mut self, label: &str, response: &ApiResponse) {
        if response.is_success() {
            tracing::info!("🌱 Created: {}", label);
            self.created += 1;
        } else if response.is_conflict() {
            tracing::info!("⏭️ Already exists, skipping: {}", label);
            self.skipped += 1;
        } else {
            tracing::error!("❌ Failed to create {}: status {}", label, response.status);
            self.failed += 1;
        }
    }
}

fn post_request(endpoint: &str, body: serde_json::Value, requires_auth: bool) -> RequestConfig {
    RequestConfig {
        endpoint: endpoint.to_string(),
        method: Some("POST".to_string()),
        body: Some(body),
        requires_auth: Some(requires_auth),
        ..Default::default()
    }
}

pub fn supplier_fixtures() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({"name": "Metro Großhandel", "contact": "bestellung@metro.example"}),
        serde_json::json!({"name": "Bio-Hof Schmidt", "contact": "hof@schmidt.example"}),
        serde_json::json!({"name": "Frischemarkt Nord", "contact": "order@frischemarkt.example"}),
    ]
}

pub fn product_fixtures() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({"name": "Tomaten", "price": 2.5, "unit": "kg", "stock": 40, "min_stock": 10}),
        serde_json::json!({"name": "Mehl", "price": 0.9, "unit": "kg", "stock": 80, "min_stock": 20}),
        serde_json::json!({"name": "Reis", "price": 1.8, "unit": "kg", "stock": 60, "min_stock": 15}),
        serde_json::json!({"name": "Olivenöl", "price": 7.2, "unit": "l", "stock": 12, "min_stock": 5}),
        serde_json::json!({"name": "Hähnchenbrust", "price": 8.9, "unit": "kg", "stock": 25, "min_stock": 8}),
        serde_json::json!({"name": "Linsen", "price": 2.1, "unit": "kg", "stock": 30, "min_stock": 10}),
    ]
}

/// 透過 API 佈建基礎資料：admin 帳號、供應商、產品與庫存。
/// 重複執行是安全的，已存在的資料會記錄後跳過；只有登入失敗會中止。
pub async fn run_seed(client: &ApiClient, email: &str, password: &str) -> Result<SeedStats> {
    let mut context = ProbeContext::new("seed".to_string());
    let mut stats = SeedStats::default();

    // 1. admin 帳號（已存在就跳過）
    tracing::info!("👤 Initializing admin user {}", email);
    let response = client
        .execute(
            &post_request(
                "/api/users/admin-init",
                serde_json::json!({"email": email, "password": password}),
                false,
            ),
            &context,
        )
        .await?;
    stats.record(&format!("admin user {}", email), &response);

    // 2. 登入拿 token，後面的呼叫都需要它。失敗就中止。
    tracing::info!("🔑 Logging in");
    let response = client
        .execute(
            &post_request(
                "/api/auth/login",
                serde_json::json!({"email": email, "password": password}),
                false,
            ),
            &context,
        )
        .await?;

    let token = response
        .field("token")
        .and_then(|v| v.as_str())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ProbeError::AuthError {
            message: format!("Login failed with status {}", response.status),
        })?;
    context.add_shared_data("token".to_string(), serde_json::json!(token));
    tracing::info!("🔑 Token acquired ({} chars)", token.len());

    // 3. 供應商
    for supplier in supplier_fixtures() {
        let label = format!(
            "supplier {}",
            supplier.get("name").and_then(|v| v.as_str()).unwrap_or("?")
        );
        let response = client
            .execute(&post_request("/api/suppliers", supplier, true), &context)
            .await?;
        stats.record(&label, &response);
    }

    // 4. 產品
    for product in product_fixtures() {
        let label = format!(
            "product {}",
            product.get("name").and_then(|v| v.as_str()).unwrap_or("?")
        );
        let response = client
            .execute(&post_request("/api/products", product, true), &context)
            .await?;
        stats.record(&label, &response);
    }

    // 5. 把庫存調成貼近實際的數值
    tracing::info!("📦 Triggering realistic inventory update");
    let response = client
        .execute(
            &post_request(
                "/api/inventory/update-realistic",
                serde_json::json!({}),
                true,
            ),
            &context,
        )
        .await?;
    if response.is_success() {
        tracing::info!("📦 Inventory updated");
    } else {
        tracing::warn!("🔶 Inventory update returned status {}", response.status);
        stats.failed += 1;
    }

    Ok(stats)
}
