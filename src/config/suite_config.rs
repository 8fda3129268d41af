use crate::core::suite::FailurePolicy;
use crate::utils::error::{ProbeError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 套件配置：命名的檢查清單加上執行順序。
/// 沒有 `--suite` 檔案時，CLI 會改用 `SuiteConfig::standard` 的內建套件。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    pub suite: SuiteInfo,
    pub checks: Vec<CheckDefinition>,
    pub global: Option<GlobalConfig>,
    pub error_handling: Option<ErrorHandlingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub execution_order: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDefinition {
    pub name: String,
    pub description: Option<String>,
    /// "endpoint" | "login" | "inventory" | "meal_plan" | "rejection"
    pub kind: Option<String>,
    pub enabled: Option<bool>,
    pub request: RequestConfig,
    pub expect: Option<ExpectConfig>,
    pub export: Option<ExportConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestConfig {
    pub endpoint: String,
    pub method: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
    pub parameters: Option<HashMap<String, String>>,
    pub body: Option<serde_json::Value>,
    pub requires_auth: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectConfig {
    /// 期望的狀態碼；未設定時任何 2xx 都算通過
    pub status: Option<u16>,
    pub min_items: Option<usize>,
    pub exact_items: Option<usize>,
    /// 每筆 item 都必須帶有的欄位
    pub required_fields: Option<Vec<String>>,
    /// meal_plan 檢查：期望的天數
    pub days: Option<usize>,
    /// meal_plan 檢查：每天必須出現的餐別
    pub meal_types: Option<Vec<String>>,
}

/// 回應欄位匯出到共享上下文：response field -> context key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub shared_variables: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    /// "stop" 或 "continue"
    pub on_check_failure: Option<String>,
}

pub const KNOWN_KINDS: &[&str] = &["endpoint", "login", "inventory", "meal_plan", "rejection"];

impl CheckDefinition {
    /// 這個檢查是否需要帶 token。inventory 與 meal_plan 隱含需要授權，
    /// 其他種類預設不用；`request.requires_auth` 可明確覆寫。
    /// 跳過判斷與 Authorization 標頭附加都以這裡為準。
    pub fn requires_auth(&self) -> bool {
        self.request.requires_auth.unwrap_or(matches!(
            self.kind.as_deref(),
            Some("inventory") | Some("meal_plan")
        ))
    }
}

impl SuiteConfig {
    /// 從 TOML 檔案載入套件配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ProbeError::IoError)?;
        Self::from_toml(&content)
    }

    /// 從 TOML 字串解析套件配置
    pub fn from_toml(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ProbeError::ConfigError {
            field: "suite_toml_parsing".to_string(),
            message: format!("Suite TOML parsing error: {}", e),
        })
    }

    /// 替換 `${VAR}` 環境變數，未設定的變數原樣保留
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn failure_policy(&self) -> Result<FailurePolicy> {
        FailurePolicy::parse(
            self.error_handling
                .as_ref()
                .and_then(|e| e.on_check_failure.as_deref()),
        )
    }

    /// 獲取指定名稱的檢查定義
    pub fn get_check(&self, name: &str) -> Option<&CheckDefinition> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// 獲取啟用的檢查列表（按執行順序）
    pub fn get_enabled_checks(&self) -> Vec<&CheckDefinition> {
        self.suite
            .execution_order
            .iter()
            .filter_map(|name| self.get_check(name))
            .filter(|check| check.enabled.unwrap_or(true))
            .collect()
    }

    fn validate_check(&self, check: &CheckDefinition) -> Result<()> {
        validation::validate_non_empty_string("checks.name", &check.name)?;
        validation::validate_endpoint(
            &format!("checks.{}.request.endpoint", check.name),
            &check.request.endpoint,
        )?;

        if let Some(kind) = &check.kind {
            if !KNOWN_KINDS.contains(&kind.as_str()) {
                return Err(ProbeError::ConfigError {
                    field: format!("checks.{}.kind", check.name),
                    message: format!(
                        "Unknown check kind '{}'. Known kinds: {}",
                        kind,
                        KNOWN_KINDS.join(", ")
                    ),
                });
            }
        }

        if let Some(timeout) = check.request.timeout_seconds {
            validation::validate_positive_number(
                &format!("checks.{}.request.timeout_seconds", check.name),
                timeout as usize,
                1,
            )?;
        }

        if let Some(delay) = check.request.retry_delay_seconds {
            validation::validate_positive_number(
                &format!("checks.{}.request.retry_delay_seconds", check.name),
                delay as usize,
                1,
            )?;
        }

        if let Some(expect) = &check.expect {
            if let (Some(min), Some(exact)) = (expect.min_items, expect.exact_items) {
                if exact < min {
                    return Err(ProbeError::ConfigError {
                        field: format!("checks.{}.expect", check.name),
                        message: format!(
                            "exact_items ({}) is below min_items ({})",
                            exact, min
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

impl Validate for SuiteConfig {
    fn validate(&self) -> Result<()> {
        // 驗證執行順序中的檢查都存在
        let mut check_names = std::collections::HashSet::new();
        for check in &self.checks {
            if !check_names.insert(check.name.clone()) {
                return Err(ProbeError::ConfigError {
                    field: "checks".to_string(),
                    message: format!("Duplicate check name '{}'", check.name),
                });
            }
        }

        for check_name in &self.suite.execution_order {
            if !check_names.contains(check_name) {
                return Err(ProbeError::ConfigError {
                    field: "suite.execution_order".to_string(),
                    message: format!(
                        "Check '{}' in execution order not found in checks definition",
                        check_name
                    ),
                });
            }
        }

        for check in &self.checks {
            self.validate_check(check)?;
        }

        Ok(())
    }
}

/// 內建標準套件：涵蓋後端的所有 REST 端點。
/// 對應手動 QA 時期每個腳本敲一遍的那組呼叫。
impl SuiteConfig {
    pub fn standard(email: &str, password: &str) -> Self {
        let listing = |name: &str, endpoint: &str, min_items: usize| CheckDefinition {
            name: name.to_string(),
            description: None,
            kind: None,
            enabled: Some(true),
            request: RequestConfig {
                endpoint: endpoint.to_string(),
                requires_auth: Some(true),
                ..Default::default()
            },
            expect: Some(ExpectConfig {
                min_items: Some(min_items),
                required_fields: Some(vec!["name".to_string()]),
                ..Default::default()
            }),
            export: None,
        };

        let checks = vec![
            CheckDefinition {
                name: "health".to_string(),
                description: Some("Backend liveness probe".to_string()),
                kind: None,
                enabled: Some(true),
                request: RequestConfig {
                    endpoint: "/api/health".to_string(),
                    ..Default::default()
                },
                expect: None,
                export: None,
            },
            CheckDefinition {
                name: "login".to_string(),
                description: Some("Obtain bearer token".to_string()),
                kind: Some("login".to_string()),
                enabled: Some(true),
                request: RequestConfig {
                    endpoint: "/api/auth/login".to_string(),
                    method: Some("POST".to_string()),
                    body: Some(serde_json::json!({
                        "email": email,
                        "password": password,
                    })),
                    ..Default::default()
                },
                expect: None,
                export: None,
            },
            listing("products", "/api/products", 1),
            listing("recipes", "/api/recipes", 1),
            listing("suppliers", "/api/suppliers", 1),
            CheckDefinition {
                name: "inventory".to_string(),
                description: Some("Inventory listing with stock badge breakdown".to_string()),
                kind: Some("inventory".to_string()),
                enabled: Some(true),
                request: RequestConfig {
                    endpoint: "/api/inventory".to_string(),
                    requires_auth: Some(true),
                    ..Default::default()
                },
                expect: Some(ExpectConfig {
                    min_items: Some(1),
                    ..Default::default()
                }),
                export: None,
            },
            // 訂單在新租戶上可以是空的
            listing("orders", "/api/orders", 0),
            CheckDefinition {
                name: "meal_plan".to_string(),
                description: Some("AI meal plan coverage".to_string()),
                kind: Some("meal_plan".to_string()),
                enabled: Some(true),
                request: RequestConfig {
                    endpoint: "/api/ai/suggest-meals".to_string(),
                    method: Some("POST".to_string()),
                    requires_auth: Some(true),
                    body: Some(serde_json::json!({ "days": 7, "mode": "balanced" })),
                    ..Default::default()
                },
                expect: Some(ExpectConfig {
                    days: Some(7),
                    meal_types: Some(vec![
                        "breakfast".to_string(),
                        "lunch".to_string(),
                        "dinner".to_string(),
                    ]),
                    ..Default::default()
                }),
                export: None,
            },
            CheckDefinition {
                name: "product_validation".to_string(),
                description: Some("Negative price must be rejected".to_string()),
                kind: Some("rejection".to_string()),
                enabled: Some(true),
                request: RequestConfig {
                    endpoint: "/api/products".to_string(),
                    method: Some("POST".to_string()),
                    requires_auth: Some(true),
                    body: Some(serde_json::json!({
                        "name": "Probe Invalid Product",
                        "price": -1.0,
                        "unit": "kg",
                    })),
                    ..Default::default()
                },
                expect: Some(ExpectConfig {
                    status: Some(400),
                    ..Default::default()
                }),
                export: None,
            },
        ];

        let execution_order = checks.iter().map(|c| c.name.clone()).collect();

        Self {
            suite: SuiteInfo {
                name: "standard-smoke".to_string(),
                description: Some("Built-in smoke suite covering all API endpoints".to_string()),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
                execution_order,
            },
            checks,
            global: None,
            error_handling: Some(ErrorHandlingConfig {
                on_check_failure: Some("continue".to_string()),
            }),
        }
    }
}
