use crate::config::suite_config::RequestConfig;
use crate::core::suite::ProbeContext;
use crate::utils::error::{ProbeError, Result};
use crate::utils::validation;
use reqwest::{Client, Method, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// 針對多租戶 API 的 HTTP 客戶端。
/// 每個請求固定帶上 `x-tenant-id`，登入後的請求另外附加 Bearer token。
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    tenant_id: String,
    default_timeout: Duration,
}

/// API 回應：狀態碼加上寬鬆解析的 JSON body。
/// 非 JSON body（錯誤頁面等）保留為字串，空 body 視為 null。
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Seed 腳本的容錯判斷：409 一律視為已存在，
    /// 部分端點用 400 搭配 "already exists" 訊息回報重複。
    pub fn is_conflict(&self) -> bool {
        if self.status == StatusCode::CONFLICT {
            return true;
        }
        if self.status == StatusCode::BAD_REQUEST {
            let text = self.body.to_string().to_lowercase();
            return text.contains("exist") || text.contains("duplicate");
        }
        false
    }

    /// 從 body 取出指定欄位（僅頂層）
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.body.get(name)
    }
}

impl ApiClient {
    pub fn new(base_url: &str, tenant_id: &str, timeout_seconds: u64) -> Result<Self> {
        validation::validate_url("base_url", base_url)?;
        validation::validate_non_empty_string("tenant_id", tenant_id)?;

        let base_url = Url::parse(base_url).map_err(|e| ProbeError::ConfigError {
            field: "base_url".to_string(),
            message: format!("Cannot parse base URL: {}", e),
        })?;

        Ok(Self {
            client: Client::new(),
            base_url,
            tenant_id: tenant_id.to_string(),
            default_timeout: Duration::from_secs(timeout_seconds),
        })
    }

    /// 從 ProbeTarget（CLI 配置等）建立客戶端
    pub fn from_target(target: &impl crate::domain::ports::ProbeTarget) -> Result<Self> {
        Self::new(
            target.base_url(),
            target.tenant_id(),
            target.timeout_seconds(),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// 執行請求定義，套用模板替換、超時與重試策略。
    /// 只在傳輸錯誤與 5xx 時重試；4xx 是明確結果，直接回傳給檢查評估。
    pub async fn execute(
        &self,
        request: &RequestConfig,
        context: &ProbeContext,
    ) -> Result<ApiResponse> {
        // 模板解析錯誤不重試，先行處理
        let endpoint = resolve_template(&request.endpoint, &context.shared_data)?;
        let headers = self.resolve_headers(request, context)?;

        let attempts = request.retry_attempts.unwrap_or(0);
        let delay = Duration::from_secs(request.retry_delay_seconds.unwrap_or(1));
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.send_once(request, &endpoint, &headers).await {
                Ok(response) if response.is_server_error() && attempt <= attempts => {
                    tracing::warn!(
                        "🔁 {} returned {}, retrying ({}/{})",
                        endpoint,
                        response.status,
                        attempt,
                        attempts
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => return Ok(response),
                Err(ProbeError::ApiError(e)) if attempt <= attempts => {
                    tracing::warn!(
                        "🔁 {} transport error: {}, retrying ({}/{})",
                        endpoint,
                        e,
                        attempt,
                        attempts
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn resolve_headers(
        &self,
        request: &RequestConfig,
        context: &ProbeContext,
    ) -> Result<Vec<(String, String)>> {
        let mut headers = Vec::new();

        if let Some(custom) = &request.headers {
            for (key, value) in custom {
                headers.push((key.clone(), resolve_template(value, &context.shared_data)?));
            }
        }

        // 授權標頭由登入檢查匯出的 token 組出
        let has_auth = headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("authorization"));
        if request.requires_auth.unwrap_or(false) && !has_auth {
            let token = context.token().ok_or_else(|| ProbeError::AuthError {
                message: format!(
                    "Endpoint {} requires auth but no token is available",
                    request.endpoint
                ),
            })?;
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        Ok(headers)
    }

    async fn send_once(
        &self,
        request: &RequestConfig,
        endpoint: &str,
        headers: &[(String, String)],
    ) -> Result<ApiResponse> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| ProbeError::ConfigError {
                field: "request.endpoint".to_string(),
                message: format!("Cannot join endpoint '{}': {}", endpoint, e),
            })?;

        let method = parse_method(request.method.as_deref())?;

        let mut builder = self
            .client
            .request(method, url.clone())
            .header("x-tenant-id", self.tenant_id.as_str())
            .timeout(
                request
                    .timeout_seconds
                    .map(Duration::from_secs)
                    .unwrap_or(self.default_timeout),
            );

        for (key, value) in headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        if let Some(params) = &request.parameters {
            for (key, value) in params {
                builder = builder.query(&[(key, value)]);
            }
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!("📡 {} {}", request.method.as_deref().unwrap_or("GET"), url);

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!("📡 {} responded with {}", url, status);

        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        };

        Ok(ApiResponse { status, body })
    }
}

fn parse_method(method: Option<&str>) -> Result<Method> {
    match method.unwrap_or("GET").to_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        other => Err(ProbeError::ConfigError {
            field: "request.method".to_string(),
            message: format!("Unsupported HTTP method: {}", other),
        }),
    }
}

/// 替換 `{key}` 佔位符，值來自共享上下文（登入 token、前面檢查匯出的欄位）。
/// 未解析的佔位符是硬錯誤，錯誤訊息列出可用的 key。
pub fn resolve_template(
    template: &str,
    shared_data: &HashMap<String, serde_json::Value>,
) -> Result<String> {
    let mut resolved = template.to_string();

    for (key, value) in shared_data {
        let placeholder = format!("{{{}}}", key);
        if resolved.contains(&placeholder) {
            let value_str = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => value.to_string().trim_matches('"').to_string(),
            };
            resolved = resolved.replace(&placeholder, &value_str);
        }
    }

    if resolved.contains('{') && resolved.contains('}') {
        return Err(ProbeError::ConfigError {
            field: "template".to_string(),
            message: format!(
                "Unresolved placeholder in '{}'. Available keys: {:?}",
                resolved,
                shared_data.keys().collect::<Vec<_>>()
            ),
        });
    }

    Ok(resolved)
}
