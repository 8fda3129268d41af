pub mod endpoint_check;
pub mod inventory_check;
pub mod login_check;
pub mod meal_plan_check;
pub mod rejection_check;

use crate::config::suite_config::{CheckDefinition, SuiteConfig};
use crate::core::api::ApiClient;
use crate::core::suite::{Check, CheckSuite};
use crate::utils::error::{ProbeError, Result};

pub use endpoint_check::EndpointCheck;
pub use inventory_check::InventoryCheck;
pub use login_check::LoginCheck;
pub use meal_plan_check::MealPlanCheck;
pub use rejection_check::RejectionCheck;

/// 根據定義的 kind 建立對應的檢查
pub fn build_check(mut definition: CheckDefinition, client: ApiClient) -> Result<Box<dyn Check>> {
    // 在這裡定案授權預設，讓跳過判斷與標頭附加讀到同一個值
    definition.request.requires_auth = Some(definition.requires_auth());

    match definition.kind.as_deref().unwrap_or("endpoint") {
        "endpoint" => Ok(Box::new(EndpointCheck::new(definition, client))),
        "login" => Ok(Box::new(LoginCheck::new(definition, client))),
        "inventory" => Ok(Box::new(InventoryCheck::new(definition, client))),
        "meal_plan" => Ok(Box::new(MealPlanCheck::new(definition, client))),
        "rejection" => Ok(Box::new(RejectionCheck::new(definition, client))),
        other => Err(ProbeError::ConfigError {
            field: format!("checks.{}.kind", definition.name),
            message: format!("Unknown check kind '{}'", other),
        }),
    }
}

/// 把套件配置組成可執行的 CheckSuite
pub fn build_suite(
    config: &SuiteConfig,
    client: &ApiClient,
    execution_id: String,
) -> Result<CheckSuite> {
    let mut shared_data = std::collections::HashMap::new();
    if let Some(global) = &config.global {
        if let Some(variables) = &global.shared_variables {
            for (key, value) in variables {
                shared_data.insert(key.clone(), serde_json::Value::String(value.clone()));
            }
        }
    }

    let mut suite = CheckSuite::new(execution_id)
        .with_failure_policy(config.failure_policy()?)
        .with_shared_data(shared_data);

    for definition in config.get_enabled_checks() {
        suite.add_check(build_check(definition.clone(), client.clone())?);
    }

    Ok(suite)
}
