use bitable_ads::adapters::tiktok::advertiser::AdvertiserInfo;
use bitable_ads::app::{self, RunOptions};
use bitable_ads::config::{AppConfig, Cli, Command};
use bitable_ads::utils::error::{AdsError, ErrorSeverity};
use bitable_ads::utils::logger;
use bitable_ads::ProgressEvent;
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting bitable-ads CLI");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    if let Err(e) = execute(cli).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        // 輸出用戶友好的錯誤信息
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        std::process::exit(exit_code(&e));
    }
}

async fn execute(cli: Cli) -> Result<(), AdsError> {
    let config = AppConfig::from_file(&cli.config)?;

    match cli.command {
        Command::Run(args) => {
            let options = RunOptions {
                records: args.records,
                report: args.report,
                dry_run: args.dry_run,
            };

            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ProgressEvent>();
            let printer = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    print_progress(&event);
                }
            });

            let result = app::run_batch(&config, &options, &tx).await;
            drop(tx);
            // 進度輸出結束即可，失敗不影響批次結果
            let _ = printer.await;

            let report = result?;
            for row in report.results.iter().filter(|r| !r.success) {
                println!(
                    "❌ {}: {}",
                    row.record_id,
                    row.error.as_deref().unwrap_or("unknown")
                );
            }
            for row in report.results.iter().filter(|r| r.write_back_error.is_some()) {
                println!(
                    "⚠️ {}: write-back failed: {}",
                    row.record_id,
                    row.write_back_error.as_deref().unwrap_or_default()
                );
            }
            println!(
                "✅ Batch completed: {} succeeded, {} failed",
                report.succeeded, report.failed
            );
            if let Some(path) = &options.report {
                println!("📁 Report saved to: {}", path.display());
            }
        }
        Command::Auth { auth_code } => {
            let (grant, advertisers) = app::authorize(&config, &auth_code).await?;
            println!("✅ Access token granted (expires in {}s)", grant.expires_in);
            println!("🔑 access_token: {}", grant.access_token);
            println!("🔁 refresh_token: {}", grant.refresh_token);
            print_advertisers(&advertisers);
        }
        Command::Advertisers => {
            let advertisers = app::list_advertisers(&config).await?;
            print_advertisers(&advertisers);
        }
        Command::Verify => {
            app::verify(&config).await?;
            println!("✅ Feishu table is accessible");
        }
    }

    Ok(())
}

fn print_advertisers(advertisers: &[AdvertiserInfo]) {
    if advertisers.is_empty() {
        println!("⚠️ No advertiser accounts are authorized");
    }
    for advertiser in advertisers {
        println!("📣 {} [{}]", advertiser.display_name(), advertiser.status);
    }
}

fn print_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::BatchStarted { total } => println!("🚀 Processing {} record(s)", total),
        ProgressEvent::RowStarted {
            index,
            total,
            record_id,
        } => println!("[{}/{}] {}", index + 1, total, record_id),
        ProgressEvent::StageStarted { stage, percent, .. } => {
            println!("    {:>3}% {}", percent, stage)
        }
        ProgressEvent::RowFinished { success, .. } => {
            println!("    {}", if *success { "✅ done" } else { "❌ failed" })
        }
        ProgressEvent::BatchFinished { .. } => {}
    }
}

/// 根據錯誤嚴重程度決定退出碼
fn exit_code(error: &AdsError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
