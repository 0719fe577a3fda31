use clap::Parser;
use std::time::Duration;
use valida_prospect::config::toml_config::TomlConfig;
use valida_prospect::core::dns::HickoryDns;
use valida_prospect::core::registry::RegistryClient;
use valida_prospect::domain::ports::ConfigProvider;
use valida_prospect::utils::error::{EnrichError, ErrorSeverity};
use valida_prospect::utils::{logger, validation::Validate};
use valida_prospect::{CliConfig, EnrichEngine, EnrichPipeline, LocalStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose, cli.log_json);

    tracing::info!("Starting valida-prospect CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // --config 指定 TOML 檔時整組設定改由檔案提供
    match cli.config.clone() {
        Some(path) => {
            let config = match TomlConfig::from_file(&path) {
                Ok(config) => config,
                Err(e) => exit_with(&e),
            };
            run(config).await;
        }
        None => run(cli).await,
    }

    Ok(())
}

async fn run<C>(config: C)
where
    C: ConfigProvider + Validate,
{
    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        exit_with(&e);
    }

    let registry = match RegistryClient::new(
        config.registry_endpoint(),
        Duration::from_secs(config.request_timeout_seconds()),
    ) {
        Ok(client) => client,
        Err(e) => exit_with(&e),
    };
    let dns = HickoryDns::from_system();
    let storage = LocalStorage::new(".".to_string());

    // Ctrl-C 只在下一個安全點（冷卻等待）中止，已付費的查詢都已落盤
    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 Ctrl-C received, stopping at the next safe point...");
            let _ = cancel_tx.send(true);
        }
    });

    let pipeline = EnrichPipeline::new(storage, config, Box::new(dns), Box::new(registry))
        .with_cancellation(cancel_rx);
    let engine = EnrichEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Enrichment completed successfully!");
            println!("✅ Enrichment completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => exit_with(&e),
    }
}

fn exit_with(e: &EnrichError) -> ! {
    tracing::error!(
        "❌ Enrichment failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
