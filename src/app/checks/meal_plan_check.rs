use crate::app::checks::endpoint_check::{evaluate_status, finalize_report};
use crate::config::suite_config::CheckDefinition;
use crate::core::api::ApiClient;
use crate::core::suite::{Check, CheckOutcome, ProbeContext};
use crate::utils::error::Result;

const DEFAULT_DAYS: usize = 7;
const DEFAULT_MEAL_TYPES: &[&str] = &["breakfast", "lunch", "dinner"];

/// AI 菜單檢查：呼叫 `/api/ai/suggest-meals`，
/// 驗證回傳的「日 → 餐別 → 食譜建議」映射覆蓋完整。
pub struct MealPlanCheck {
    definition: CheckDefinition,
    client: ApiClient,
}

impl MealPlanCheck {
    pub fn new(definition: CheckDefinition, client: ApiClient) -> Self {
        Self { definition, client }
    }
}

/// 建議必須指到一個食譜：物件帶名稱欄位，或非空字串
fn suggestion_names_recipe(suggestion: &serde_json::Value) -> bool {
    match suggestion {
        serde_json::Value::String(s) => !s.trim().is_empty(),
        serde_json::Value::Object(obj) => ["name", "recipe", "recipe_name", "title"]
            .iter()
            .any(|key| {
                obj.get(*key)
                    .and_then(|v| v.as_str())
                    .map_or(false, |s| !s.trim().is_empty())
            }),
        _ => false,
    }
}

/// 取出日鍵映射：接受整個 body 或包在 "plan" 底下的物件
fn plan_object(body: &serde_json::Value) -> Option<&serde_json::Map<String, serde_json::Value>> {
    match body.get("plan") {
        Some(serde_json::Value::Object(plan)) => Some(plan),
        _ => body.as_object(),
    }
}

pub fn validate_plan(
    body: &serde_json::Value,
    expected_days: usize,
    meal_types: &[String],
    details: &mut Vec<String>,
    failures: &mut Vec<String>,
) {
    let plan = match plan_object(body) {
        Some(plan) if !plan.is_empty() => plan,
        _ => {
            failures.push("response has no day-keyed meal plan object".to_string());
            return;
        }
    };

    if plan.len() != expected_days {
        failures.push(format!(
            "expected {} days in plan, got {}",
            expected_days,
            plan.len()
        ));
    }

    let mut complete_days = 0usize;
    for (day, meals) in plan {
        let meals = match meals.as_object() {
            Some(meals) => meals,
            None => {
                failures.push(format!("day '{}' is not a meal-type mapping", day));
                continue;
            }
        };

        let mut day_complete = true;
        for meal_type in meal_types {
            match meals.get(meal_type) {
                Some(suggestion) if suggestion_names_recipe(suggestion) => {}
                Some(_) => {
                    failures.push(format!("day '{}' {} names no recipe", day, meal_type));
                    day_complete = false;
                }
                None => {
                    failures.push(format!("day '{}' is missing {}", day, meal_type));
                    day_complete = false;
                }
            }
        }
        if day_complete {
            complete_days += 1;
        }
    }

    details.push(format!(
        "{}/{} days fully covered ({})",
        complete_days,
        plan.len(),
        meal_types.join("/")
    ));
}

#[async_trait::async_trait]
impl Check for MealPlanCheck {
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

        if failures.is_empty() {
            let expected_days = expect.days.unwrap_or(DEFAULT_DAYS);
            let meal_types: Vec<String> = expect.meal_types.clone().unwrap_or_else(|| {
                DEFAULT_MEAL_TYPES.iter().map(|s| s.to_string()).collect()
            });

            validate_plan(
                &response.body,
                expected_days,
                &meal_types,
                &mut details,
                &mut failures,
            );
        }

        let report = finalize_report(&self.definition.name, details, failures);
        Ok(CheckOutcome::from_report(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meal_types() -> Vec<String> {
        vec![
            "breakfast".to_string(),
            "lunch".to_string(),
            "dinner".to_string(),
        ]
    }

    fn full_day() -> serde_json::Value {
        json!({
            "breakfast": {"name": "Porridge", "cost_per_portion": 0.8},
            "lunch": {"name": "Linsensuppe", "cost_per_portion": 1.2},
            "dinner": {"name": "Gemüsecurry", "cost_per_portion": 1.5}
        })
    }

    #[test]
    fn test_complete_plan_passes() {
        let body = json!({
            "plan": {
                "monday": full_day(),
                "tuesday": full_day(),
                "wednesday": full_day()
            }
        });

        let mut details = Vec::new();
        let mut failures = Vec::new();
        validate_plan(&body, 3, &meal_types(), &mut details, &mut failures);

        assert!(failures.is_empty(), "unexpected failures: {:?}", failures);
        assert_eq!(details, vec!["3/3 days fully covered (breakfast/lunch/dinner)"]);
    }

    #[test]
    fn test_missing_meal_type_fails() {
        let body = json!({
            "monday": {
                "breakfast": {"name": "Porridge"},
                "lunch": {"name": "Linsensuppe"}
            }
        });

        let mut details = Vec::new();
        let mut failures = Vec::new();
        validate_plan(&body, 1, &meal_types(), &mut details, &mut failures);

        assert!(failures.iter().any(|f| f.contains("missing dinner")));
    }

    #[test]
    fn test_wrong_day_count_fails() {
        let body = json!({ "monday": full_day() });

        let mut details = Vec::new();
        let mut failures = Vec::new();
        validate_plan(&body, 7, &meal_types(), &mut details, &mut failures);

        assert!(failures.iter().any(|f| f.contains("expected 7 days")));
    }

    #[test]
    fn test_nameless_suggestion_fails() {
        let body = json!({
            "monday": {
                "breakfast": {"cost_per_portion": 0.8},
                "lunch": {"name": "Linsensuppe"},
                "dinner": {"name": "Gemüsecurry"}
            }
        });

        let mut details = Vec::new();
        let mut failures = Vec::new();
        validate_plan(&body, 1, &meal_types(), &mut details, &mut failures);

        assert!(failures.iter().any(|f| f.contains("names no recipe")));
    }

    #[test]
    fn test_plain_string_suggestion_accepted() {
        let body = json!({
            "monday": {
                "breakfast": "Porridge",
                "lunch": "Linsensuppe",
                "dinner": "Gemüsecurry"
            }
        });

        let mut details = Vec::new();
        let mut failures = Vec::new();
        validate_plan(&body, 1, &meal_types(), &mut details, &mut failures);

        assert!(failures.is_empty());
    }

    #[test]
    fn test_non_object_body_fails() {
        let mut details = Vec::new();
        let mut failures = Vec::new();
        validate_plan(&json!([1, 2, 3]), 7, &meal_types(), &mut details, &mut failures);

        assert!(!failures.is_empty());
    }
}
