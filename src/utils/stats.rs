use chrono::{DateTime, Utc};

/// 單次批次執行的統計，結束時輸出摘要。
/// 每次 transform 建立一個新的實例，不共用狀態。
#[derive(Debug, Clone)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub total_records: usize,
    pub valid_email_formats: usize,
    pub existing_domains: usize,
    pub distinct_domains: usize,
    pub invalid_tax_ids: usize,
    pub cache_hits: usize,
    pub registry_calls: usize,
    pub registry_hits: usize,
    pub registry_misses: usize,
    pub quota_rejections: usize,
    pub lookup_failures: usize,
    pub cooldowns: usize,
}

impl RunStats {
    pub fn new(total_records: usize) -> Self {
        Self {
            started_at: Utc::now(),
            total_records,
            valid_email_formats: 0,
            existing_domains: 0,
            distinct_domains: 0,
            invalid_tax_ids: 0,
            cache_hits: 0,
            registry_calls: 0,
            registry_hits: 0,
            registry_misses: 0,
            quota_rejections: 0,
            lookup_failures: 0,
            cooldowns: 0,
        }
    }

    pub fn log_summary(&self) {
        let total = self.total_records.max(1) as f64;
        tracing::info!(
            "📊 Run summary (started {}): {} records, {} valid e-mail formats ({:.1}%), {} resolvable domains ({} distinct)",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.total_records,
            self.valid_email_formats,
            self.valid_email_formats as f64 / total * 100.0,
            self.existing_domains,
            self.distinct_domains,
        );
        tracing::info!(
            "📊 Registry: {} calls ({} hits, {} misses), {} cache hits, {} invalid ids, {} quota rejections, {} failures, {} cooldowns",
            self.registry_calls,
            self.registry_hits,
            self.registry_misses,
            self.cache_hits,
            self.invalid_tax_ids,
            self.quota_rejections,
            self.lookup_failures,
            self.cooldowns,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_start_at_zero() {
        let stats = RunStats::new(10);
        assert_eq!(stats.total_records, 10);
        assert_eq!(stats.registry_calls, 0);
        assert_eq!(stats.cache_hits, 0);
        assert_eq!(stats.cooldowns, 0);
    }
}
