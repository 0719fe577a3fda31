use crate::domain::model::{EnrichedBatch, LookupOutcome, ProgressEvent, RecordBatch};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn registry_endpoint(&self) -> &str;
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn email_column(&self) -> &str;
    fn tax_id_column(&self) -> &str;
    fn cache_path(&self) -> &str;
    fn csv_delimiter(&self) -> u8;
    fn max_calls_per_window(&self) -> u32;
    fn cooldown_seconds(&self) -> u64;
    fn request_timeout_seconds(&self) -> u64;
}

/// DNS 查詢能力。
///
/// `Ok(false)` 代表查詢成功但沒有該類型記錄 (NXDOMAIN / 空回應)，
/// `Err` 代表查詢本身失敗（逾時、傳輸錯誤）。兩者的後續處理不同：
/// 前者是確定的否定答案，後者要記 log 再降級為否定。
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn has_mx_records(&self, domain: &str) -> Result<bool>;
    async fn has_a_records(&self, domain: &str) -> Result<bool>;
}

/// 對外部註冊局發出單次查詢。不得在內部重試，節奏控制是批次層的事
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    async fn lookup(&self, tax_id: &str) -> Result<LookupOutcome>;
}

/// 接收批次處理進度的回呼
pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RecordBatch>;
    async fn transform(&self, batch: RecordBatch) -> Result<EnrichedBatch>;
    async fn load(&self, result: EnrichedBatch) -> Result<String>;
}
