use anyhow::Context;
use clap::Parser;
use splitdock::config::toml_config::TomlConfig;
use splitdock::core::ConfigProvider;
use splitdock::utils::error::{DockError, ErrorSeverity};
use splitdock::utils::{logger, validation::Validate};
use splitdock::{RunStatus, SplitDockEngine, SystemRunner};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "toml-splitdock")]
#[command(about = "Split-and-dock driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "splitdock.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override dock.worker_count from config
    #[arg(short, long)]
    workers: Option<usize>,

    /// Show the commands that would run without executing them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 設定檔決定日誌格式，所以先載入再初始化日誌
    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    if config.json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based splitdock");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 套用命令列覆蓋設定
    if let Some(workers) = args.workers {
        config.dock.worker_count = Some(workers);
        tracing::info!("🔧 Worker count overridden to: {}", workers);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config);

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let engine =
        SplitDockEngine::new_with_monitoring(Arc::new(SystemRunner::new()), &config, monitor_enabled);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No processes will be spawned");
        let plan = engine.plan();
        println!("  Split: {}", plan.split.display());
        println!("  Dock (chunk 1): {}", plan.first_dock.display());
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

    match report.status() {
        RunStatus::AllDocked => {
            println!("✅ All {} chunks docked", report.len());
            for path in report.outputs() {
                println!("📁 {}", path.display());
            }
        }
        RunStatus::PartiallyFailed { failed, total } => {
            eprintln!("⚠️ {} of {} chunks failed", failed, total);
            print_failures(&report);
            std::process::exit(4);
        }
        RunStatus::AllFailed => {
            eprintln!("❌ Every chunk failed to dock");
            print_failures(&report);
            std::process::exit(4);
        }
    }

    if !report_written {
        std::process::exit(5);
    }

    Ok(())
}

fn print_failures(report: &splitdock::OrchestrationReport) {
    for (chunk, failure) in report.failures() {
        eprintln!(
            "  chunk {} [{:?}] {}",
            chunk.sequence_index, failure.kind, failure.message
        );
    }
}

fn display_config_summary(config: &TomlConfig) {
    let tools = config.tools();
    let request = config.split_request();
    let params = config.dock_params();

    println!("📋 Configuration Summary:");
    println!("  Input: {}", request.input.display());
    println!(
        "  Chunks: {} records each in {}/{}*",
        request.chunk_size,
        request.work_dir.display(),
        request.chunk_prefix
    );
    println!("  Receptor: {}", params.receptor_param.display());
    println!("  Protocol: {}", params.dock_param.display());
    println!("  Workers: {}", config.worker_count());
    println!(
        "  Tools: {} / {}",
        tools.split_executable.display(),
        tools.dock_executable.display()
    );
    if !params.flags.is_empty() {
        println!("  Flags: {}", params.flags.to_args().join(" "));
    }
}
