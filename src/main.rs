use clap::Parser;
use splitdock::utils::error::{DockError, ErrorSeverity};
use splitdock::utils::{logger, validation::Validate};
use splitdock::{CliConfig, RunStatus, SplitDockEngine, SystemRunner};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting splitdock");
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let engine =
        SplitDockEngine::new_with_monitoring(Arc::new(SystemRunner::new()), &config, config.monitor);

    if config.dry_run {
        let plan = engine.plan();
        println!("🔍 Dry run, nothing will be executed");
        println!("  Split: {}", plan.split.display());
        println!("  Dock (chunk 1): {}", plan.first_dock.display());
        println!("  Workers: {}", plan.worker_count);
        return Ok(());
    }

    let (report, report_written) = match engine.run().await {
        Ok(report) => (report, true),
        Err(DockError::ReportWriteFailed {
            path,
            reason,
            report,
        }) => {
            eprintln!("❌ Report not written to {}: {}", path.display(), reason);
            (*report, false)
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed before docking: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low | ErrorSeverity::High => 1,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    };

    for path in report.outputs() {
        println!("{}", path.display());
    }
    match report.status() {
        RunStatus::AllDocked => {
            tracing::info!("✅ All {} chunks docked", report.len());
        }
        RunStatus::PartiallyFailed { .. } | RunStatus::AllFailed => {
            for (chunk, failure) in report.failures() {
                eprintln!(
                    "❌ chunk {} ({}): {}",
                    chunk.sequence_index,
                    chunk.path.display(),
                    failure.message
                );
            }
            std::process::exit(4);
        }
    }

    if !report_written {
        std::process::exit(5);
    }

    Ok(())
}
