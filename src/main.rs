use clap::Parser;
use mealprobe::app::checks::build_suite;
use mealprobe::config::suite_config::SuiteConfig;
use mealprobe::core::suite::{build_suite_report, CheckSuite};
use mealprobe::domain::model::CheckStatus;
use mealprobe::domain::ports::ReportSink;
use mealprobe::utils::{logger, validation::Validate};
use mealprobe::{ApiClient, CliConfig, LocalReportSink, Result};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting mealprobe against {}", config.base_url);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(2);
    }

    match run(&config).await {
        Ok(failed_checks) if failed_checks == 0 => {
            println!("✅ All checks passed");
        }
        Ok(failed_checks) => {
            eprintln!("❌ {} check(s) failed", failed_checks);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("❌ Probe run failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(2);
        }
    }
}

/// 執行套件，回傳失敗的檢查數
async fn run(config: &CliConfig) -> Result<usize> {
    // 載入套件配置：--suite 檔案優先，否則用內建標準套件
    let suite_config = match &config.suite {
        Some(path) => {
            tracing::info!("📋 Loading suite from {}", path);
            let loaded = SuiteConfig::from_file(path)?;
            loaded.validate()?;
            loaded
        }
        None => SuiteConfig::standard(&config.email, &config.password),
    };

    tracing::info!(
        "📋 Suite '{}': {} checks",
        suite_config.suite.name,
        suite_config.get_enabled_checks().len()
    );

    let client = ApiClient::from_target(config)?;

    let execution_id = format!(
        "probe_{}",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    let mut suite = build_suite(&suite_config, &client, execution_id.clone())?;

    let reports = suite.execute_all().await?;

    // 執行摘要
    println!("\n📊 Suite '{}' finished:", suite_config.suite.name);
    for report in &reports {
        let symbol = match report.status {
            CheckStatus::Passed => "✅",
            CheckStatus::Failed => "❌",
            CheckStatus::Skipped => "⏭️",
        };
        println!(
            "  {} {} ({:?}) {}",
            symbol,
            report.check_name,
            report.duration,
            report.details.join("; ")
        );
    }

    let summary = CheckSuite::get_execution_summary(&reports);
    println!(
        "📈 {} checks: {} passed, {} failed, {} skipped",
        summary.get("total_checks").map(|v| v.to_string()).unwrap_or_default(),
        summary.get("passed").map(|v| v.to_string()).unwrap_or_default(),
        summary.get("failed").map(|v| v.to_string()).unwrap_or_default(),
        summary.get("skipped").map(|v| v.to_string()).unwrap_or_default(),
    );

    // 寫入 JSON 報告
    if !config.no_report {
        let report_doc = build_suite_report(&suite_config.suite.name, &execution_id, &reports);
        let filename = format!("{}.json", execution_id);
        let sink = LocalReportSink::new(config.output_path.clone());
        sink.write_report(&filename, serde_json::to_string_pretty(&report_doc)?.as_bytes())
            .await?;
        println!("📁 Report saved to: {}/{}", config.output_path, filename);
    }

    Ok(reports.iter().filter(|r| r.is_failed()).count())
}
