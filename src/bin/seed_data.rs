use clap::Parser;
use mealprobe::app::seed::run_seed;
use mealprobe::core::api::ApiClient;
use mealprobe::domain::ports::ProbeTarget;
use mealprobe::utils::logger;

/// 透過 API 佈建基礎資料：admin 帳號、供應商、產品與庫存。
/// 重複執行是安全的，已存在的資料會記錄後跳過。
#[derive(Debug, Parser)]
#[command(name = "seed_data")]
#[command(about = "Seed bootstrap data through the meal-planning API")]
struct SeedConfig {
    #[arg(long, default_value = "http://localhost:4001")]
    base_url: String,

    #[arg(long, default_value = "demo")]
    tenant: String,

    #[arg(long, default_value = "admin@example.com")]
    email: String,

    #[arg(long, default_value = "admin123")]
    password: String,

    #[arg(long, default_value = "15")]
    timeout_seconds: u64,

    #[arg(long, help = "Enable verbose output")]
    verbose: bool,
}

impl ProbeTarget for SeedConfig {
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

#[tokio::main]
async fn main() {
    let config = SeedConfig::parse();
    logger::init_cli_logger(config.verbose);

    let result = match ApiClient::from_target(&config) {
        Ok(client) => run_seed(&client, &config.email, &config.password).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(stats) => {
            println!(
                "🎉 Seeding finished: {} created, {} skipped, {} failed",
                stats.created, stats.skipped, stats.failed
            );
            if stats.failed > 0 {
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!("❌ Seeding aborted: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(2);
        }
    }
}
