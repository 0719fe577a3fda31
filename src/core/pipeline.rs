//! Enrichment 批次管線：extract → transform → load。
//!
//! transform 是系統的控制核心：Validating → DomainChecking →
//! TaxIdEnriching 三個階段依序跑完整批。註冊局查詢受單一全域配額
//! （每個窗口最多 N 次呼叫）限制，所以整個管線是單一邏輯執行緒，
//! 平行化沒有意義，只會更快撞上 429。
//!
//! 所有跨列的可變狀態（配額計數、domain memo、統計）都是
//! transform 呼叫內的區域變數，不同批次之間互不干擾。

use crate::core::cache::EnrichmentCache;
use crate::core::dns::domain_exists;
use crate::core::email::{extract_domain, is_format_valid, normalize_tax_id};
use crate::core::segment::macro_segment;
use crate::domain::model::{
    EnrichPhase, EnrichedBatch, EnrichedRecord, Enrichment, LookupOutcome, ProgressEvent,
    ProspectRecord, RecordBatch, RegistryInfo, ENRICHMENT_COLUMNS,
};
use crate::domain::ports::{
    ConfigProvider, DnsResolver, Pipeline, ProgressSink, RegistryLookup, Storage,
};
use crate::utils::error::{EnrichError, Result};
use crate::utils::stats::RunStats;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::watch;

/// 輸出檔名，沿用產品既有的下載檔名
pub const OUTPUT_FILENAME: &str = "base_enriquecida.csv";

/// 預設進度回呼：寫進 log
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::PhaseStarted(EnrichPhase::Validating) => {
                tracing::info!("📧 Validating e-mail formats...")
            }
            ProgressEvent::PhaseStarted(EnrichPhase::DomainChecking) => {
                tracing::info!("🌐 Checking e-mail domains via DNS...")
            }
            ProgressEvent::PhaseStarted(EnrichPhase::TaxIdEnriching) => {
                tracing::info!("🏢 Looking up tax ids against the public registry (paced, may take a while)...")
            }
            ProgressEvent::PhaseStarted(EnrichPhase::Done) => {
                tracing::info!("✅ Enrichment finished")
            }
            ProgressEvent::CooldownStarted { seconds } => {
                tracing::info!("⏳ Quota window exhausted, cooling down for {}s...", seconds)
            }
            ProgressEvent::CooldownFinished => tracing::debug!("⏳ Cooldown finished"),
            ProgressEvent::RecordEnriched {
                index,
                total,
                cache_hit,
            } => tracing::debug!(
                "🏢 Record {}/{} enriched (cache hit: {})",
                index + 1,
                total,
                cache_hit
            ),
        }
    }
}

/// 配額窗口計數。窗口內的呼叫數達到上限後必須冷卻並歸零
struct QuotaWindow {
    calls_in_window: u32,
    max_calls: u32,
}

impl QuotaWindow {
    fn new(max_calls: u32) -> Self {
        Self {
            calls_in_window: 0,
            max_calls,
        }
    }

    fn exhausted(&self) -> bool {
        self.calls_in_window >= self.max_calls
    }

    fn record_call(&mut self) {
        self.calls_in_window += 1;
    }

    fn reset(&mut self) {
        self.calls_in_window = 0;
    }
}

pub struct EnrichPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    dns: Box<dyn DnsResolver>,
    registry: Box<dyn RegistryLookup>,
    progress: Box<dyn ProgressSink>,
    cancel: Option<watch::Receiver<bool>>,
}

impl<S: Storage, C: ConfigProvider> EnrichPipeline<S, C> {
    pub fn new(
        storage: S,
        config: C,
        dns: Box<dyn DnsResolver>,
        registry: Box<dyn RegistryLookup>,
    ) -> Self {
        Self {
            storage,
            config,
            dns,
            registry,
            progress: Box::new(TracingProgress),
            cancel: None,
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// 提供取消通道。取消只在冷卻等待中生效：快取每寫一筆就落盤，
    /// 中斷不會丟失已完成的查詢
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    async fn cooldown(&self) -> Result<()> {
        let seconds = self.config.cooldown_seconds();
        self.progress
            .on_event(&ProgressEvent::CooldownStarted { seconds });

        let sleep = tokio::time::sleep(Duration::from_secs(seconds));
        match self.cancel.clone() {
            Some(mut rx) => {
                tokio::select! {
                    _ = sleep => {}
                    _ = wait_for_cancel(&mut rx) => return Err(EnrichError::Cancelled),
                }
            }
            None => sleep.await,
        }

        self.progress.on_event(&ProgressEvent::CooldownFinished);
        Ok(())
    }

    /// 一次註冊局查詢，失敗一律降級為 None（該列空白、記負向快取），
    /// 各失敗類別分開記 log 與統計
    async fn perform_lookup(&self, tax_id: &str, stats: &mut RunStats) -> Option<RegistryInfo> {
        match self.registry.lookup(tax_id).await {
            Ok(LookupOutcome::Found(info)) => {
                stats.registry_hits += 1;
                Some(info)
            }
            Ok(LookupOutcome::NotFound) => {
                stats.registry_misses += 1;
                tracing::info!("🏢 Registry has no data for {}", tax_id);
                None
            }
            Ok(LookupOutcome::QuotaExceeded) => {
                stats.quota_rejections += 1;
                tracing::warn!(
                    "🏢 Registry rejected {}: quota exceeded (429), recording a negative entry",
                    tax_id
                );
                None
            }
            Ok(LookupOutcome::Failed(status)) => {
                stats.lookup_failures += 1;
                tracing::warn!("🏢 Registry lookup for {} failed with status {}", tax_id, status);
                None
            }
            Err(e) => {
                stats.lookup_failures += 1;
                tracing::warn!("🏢 Registry lookup for {} failed: {}", tax_id, e);
                None
            }
        }
    }
}

/// 只在收到 true 時完成；發送端消失就永遠等下去（等同不可取消）
async fn wait_for_cancel(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for EnrichPipeline<S, C> {
    async fn extract(&self) -> Result<RecordBatch> {
        let bytes = self.storage.read_file(self.config.input_path()).await?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.config.csv_delimiter())
            .flexible(true)
            .from_reader(bytes.as_slice());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        for column in [self.config.email_column(), self.config.tax_id_column()] {
            if !headers.iter().any(|h| h.as_str() == column) {
                return Err(EnrichError::ColumnNotFoundError {
                    column: column.to_string(),
                });
            }
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let data = headers
                .iter()
                .cloned()
                .zip(row.iter().map(str::to_string))
                .collect();
            records.push(ProspectRecord { data });
        }

        tracing::info!(
            "📄 Read {} records ({} columns) from '{}'",
            records.len(),
            headers.len(),
            self.config.input_path()
        );

        Ok(RecordBatch { headers, records })
    }

    async fn transform(&self, batch: RecordBatch) -> Result<EnrichedBatch> {
        let total = batch.records.len();
        let mut stats = RunStats::new(total);
        let email_column = self.config.email_column();
        let tax_id_column = self.config.tax_id_column();

        // 階段一：e-mail 格式驗證（純函式，逐列）
        self.progress
            .on_event(&ProgressEvent::PhaseStarted(EnrichPhase::Validating));
        let format_valid: Vec<bool> = batch
            .records
            .iter()
            .map(|record| is_format_valid(record.field(email_column)))
            .collect();
        stats.valid_email_formats = format_valid.iter().filter(|v| **v).count();

        // 階段二：domain 存在性。很多列共用同一個 domain，
        // memo 保證每個 domain 本次執行最多查一次（不跨執行持久化）
        self.progress
            .on_event(&ProgressEvent::PhaseStarted(EnrichPhase::DomainChecking));
        let mut domain_memo: HashMap<String, bool> = HashMap::new();
        let mut domain_ok = Vec::with_capacity(total);
        for record in &batch.records {
            let exists = match extract_domain(record.field(email_column)) {
                Some(domain) => match domain_memo.get(&domain) {
                    Some(cached) => *cached,
                    None => {
                        let found = domain_exists(self.dns.as_ref(), &domain).await;
                        domain_memo.insert(domain, found);
                        found
                    }
                },
                None => false,
            };
            domain_ok.push(exists);
        }
        stats.distinct_domains = domain_memo.len();
        stats.existing_domains = domain_ok.iter().filter(|v| **v).count();

        // 階段三：配額節奏下的註冊局查詢，經過持久化快取。
        // 依輸入順序逐列處理，輸出順序是正確性不變量
        self.progress
            .on_event(&ProgressEvent::PhaseStarted(EnrichPhase::TaxIdEnriching));
        let mut cache = EnrichmentCache::load(&self.storage, self.config.cache_path()).await?;
        let mut quota = QuotaWindow::new(self.config.max_calls_per_window());
        let mut registry_results: Vec<Option<RegistryInfo>> = Vec::with_capacity(total);

        for (index, record) in batch.records.iter().enumerate() {
            let raw_tax_id = record.field(tax_id_column);
            let (info, cache_hit) = match normalize_tax_id(raw_tax_id) {
                // 格式不合：直接空白，不消耗配額
                None => {
                    stats.invalid_tax_ids += 1;
                    (None, false)
                }
                Some(tax_id) => match cache.get(&tax_id) {
                    // 查過就不再查，負向條目也是終態
                    Some(cached) => {
                        stats.cache_hits += 1;
                        (cached.clone(), true)
                    }
                    None => {
                        if quota.exhausted() {
                            stats.cooldowns += 1;
                            self.cooldown().await?;
                            quota.reset();
                        }

                        let info = self.perform_lookup(&tax_id, &mut stats).await;
                        quota.record_call();
                        stats.registry_calls += 1;
                        cache.put(&self.storage, tax_id, info.clone()).await?;
                        (info, false)
                    }
                },
            };

            self.progress.on_event(&ProgressEvent::RecordEnriched {
                index,
                total,
                cache_hit,
            });
            registry_results.push(info);
        }

        self.progress
            .on_event(&ProgressEvent::PhaseStarted(EnrichPhase::Done));
        stats.log_summary();

        let mut headers = batch.headers;
        headers.extend(ENRICHMENT_COLUMNS.iter().map(|c| c.to_string()));

        let rows = batch
            .records
            .into_iter()
            .zip(registry_results)
            .enumerate()
            .map(|(i, (record, registry))| {
                let segment = registry
                    .as_ref()
                    .map(|info| macro_segment(&info.activity_code).to_string())
                    .unwrap_or_default();
                EnrichedRecord {
                    record,
                    enrichment: Enrichment {
                        email_format_valid: format_valid[i],
                        domain_exists: domain_ok[i],
                        registry,
                        segment,
                    },
                }
            })
            .collect();

        Ok(EnrichedBatch { headers, rows })
    }

    async fn load(&self, result: EnrichedBatch) -> Result<String> {
        let output_path = format!(
            "{}/{}",
            self.config.output_path().trim_end_matches('/'),
            OUTPUT_FILENAME
        );

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.config.csv_delimiter())
            .from_writer(Vec::new());

        writer.write_record(&result.headers)?;

        let original_count = result.headers.len() - ENRICHMENT_COLUMNS.len();
        let original_headers = &result.headers[..original_count];

        for row in &result.rows {
            let mut fields: Vec<String> = original_headers
                .iter()
                .map(|h| row.record.field(h).to_string())
                .collect();
            fields.extend(row.enrichment.to_fields());
            writer.write_record(&fields)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| EnrichError::ProcessingError {
                message: format!("CSV writer flush failed: {}", e),
            })?;

        tracing::debug!("💾 Writing {} bytes to '{}'", bytes.len(), output_path);
        self.storage.write_file(&output_path, &bytes).await?;

        Ok(output_path)
    }
}
