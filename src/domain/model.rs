use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 輸入的一筆 prospect 記錄，未指定的欄位原樣保留
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProspectRecord {
    pub data: HashMap<String, String>,
}

impl ProspectRecord {
    /// 取得欄位值，缺少時回傳空字串
    pub fn field(&self, column: &str) -> &str {
        self.data.get(column).map(String::as_str).unwrap_or("")
    }
}

/// 一批輸入記錄。headers 保留原始欄位順序，輸出時按相同順序寫回
#[derive(Debug, Clone)]
pub struct RecordBatch {
    pub headers: Vec<String>,
    pub records: Vec<ProspectRecord>,
}

/// 公共註冊局查詢成功後的正規化結果，同時也是快取條目的格式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryInfo {
    pub registration_status: Option<String>,
    pub activity_code: String,
    pub activity_description: String,
}

/// 單次註冊局查詢的分類結果。
///
/// 配額超限 (429) 與其他失敗在型別層級分開，呼叫端才能分別記錄；
/// 批次策略目前對兩者一視同仁（該列得到空白 enrichment、快取記負向條目）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(RegistryInfo),
    /// 查詢成功但註冊局沒有該筆資料 (404)
    NotFound,
    /// 配額超限 (429)
    QuotaExceeded,
    /// 其他非 200 狀態碼
    Failed(u16),
}

/// 附加到每一列的 enrichment 欄位
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub email_format_valid: bool,
    pub domain_exists: bool,
    pub registry: Option<RegistryInfo>,
    pub segment: String,
}

/// 輸出欄位名稱，沿用產品既有的欄位命名
pub const ENRICHMENT_COLUMNS: [&str; 6] = [
    "email_valido_formato",
    "dominio_existe",
    "cnpj_situacao_cadastral",
    "cnae_principal_codigo",
    "cnae_principal_descricao",
    "segmento_macro",
];

impl Enrichment {
    /// 以 ENRICHMENT_COLUMNS 的順序輸出各欄位的文字值
    pub fn to_fields(&self) -> [String; 6] {
        let (status, code, description) = match &self.registry {
            Some(info) => (
                info.registration_status.clone().unwrap_or_default(),
                info.activity_code.clone(),
                info.activity_description.clone(),
            ),
            None => (String::new(), String::new(), String::new()),
        };
        [
            self.email_format_valid.to_string(),
            self.domain_exists.to_string(),
            status,
            code,
            description,
            self.segment.clone(),
        ]
    }
}

/// 一列輸入加上它的 enrichment 結果，輸出順序與輸入一一對應
#[derive(Debug, Clone)]
pub struct EnrichedRecord {
    pub record: ProspectRecord,
    pub enrichment: Enrichment,
}

#[derive(Debug, Clone)]
pub struct EnrichedBatch {
    pub headers: Vec<String>,
    pub rows: Vec<EnrichedRecord>,
}

/// 批次處理的階段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichPhase {
    Validating,
    DomainChecking,
    TaxIdEnriching,
    Done,
}

/// 發給呼叫端的進度事件，讓前端在長時間冷卻期間仍能顯示狀態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    PhaseStarted(EnrichPhase),
    CooldownStarted { seconds: u64 },
    CooldownFinished,
    RecordEnriched {
        index: usize,
        total: usize,
        cache_hit: bool,
    },
}
