pub mod cli;
pub mod suite_config;

use crate::domain::ports::ProbeTarget;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "mealprobe")]
#[command(about = "API smoke-test harness for a multi-tenant meal-planning backend")]
pub struct CliConfig {
    #[arg(long, default_value = "http://localhost:4001")]
    pub base_url: String,

    #[arg(long, default_value = "demo")]
    pub tenant: String,

    #[arg(long, default_value = "admin@example.com")]
    pub email: String,

    #[arg(long, default_value = "admin123")]
    pub password: String,

    /// 自訂套件的 TOML 檔；不給就跑內建標準套件
    #[arg(long)]
    pub suite: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "15")]
    pub timeout_seconds: u64,

    /// 寫出 JSON 報告（預設行為，用來蓋掉前面的 --no-report）
    #[arg(long, overrides_with = "no_report")]
    pub report: bool,

    #[arg(long, help = "Skip writing the JSON report file")]
    pub no_report: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ProbeTarget for CliConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tenant_id(&self) -> &str {
        &self.tenant
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("base_url", &self.base_url)?;
        validation::validate_non_empty_string("tenant", &self.tenant)?;
        validation::validate_non_empty_string("email", &self.email)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_positive_number("timeout_seconds", self.timeout_seconds as usize, 1)?;
        Ok(())
    }
}
