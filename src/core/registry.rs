//! 公共註冊局 (cnpj.ws 介面形狀) 的單次查詢 client。
//!
//! 這一層只負責一次 HTTP 往返與回應正規化；重試與節奏控制
//! 屬於批次層。回應缺欄位時降級為空值，不中斷。

use crate::domain::model::{LookupOutcome, RegistryInfo};
use crate::domain::ports::RegistryLookup;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub struct RegistryClient {
    base_url: String,
    client: Client,
}

impl RegistryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("valida-prospect/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl RegistryLookup for RegistryClient {
    async fn lookup(&self, tax_id: &str) -> Result<LookupOutcome> {
        let url = format!("{}/{}", self.base_url, tax_id);
        tracing::debug!("🏢 Registry request: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        tracing::debug!("🏢 Registry response status: {}", status);

        match status {
            StatusCode::OK => {
                let body: Value = response.json().await?;
                match normalize_response(&body) {
                    Some(info) => Ok(LookupOutcome::Found(info)),
                    None => {
                        tracing::warn!("🏢 Registry returned a non-object body for {}", tax_id);
                        Ok(LookupOutcome::Failed(status.as_u16()))
                    }
                }
            }
            StatusCode::NOT_FOUND => Ok(LookupOutcome::NotFound),
            StatusCode::TOO_MANY_REQUESTS => Ok(LookupOutcome::QuotaExceeded),
            other => Ok(LookupOutcome::Failed(other.as_u16())),
        }
    }
}

/// 將巢狀回應攤平成 RegistryInfo。缺欄位降級為 None / 空字串，
/// 整個 body 不是物件時回傳 None（視同失敗）
fn normalize_response(body: &Value) -> Option<RegistryInfo> {
    let root = body.as_object()?;

    let establishment = root.get("estabelecimento").and_then(Value::as_object);

    // 狀態欄位在 estabelecimento 底下，舊格式放在頂層
    let registration_status = establishment
        .and_then(|e| e.get("situacao_cadastral"))
        .and_then(Value::as_str)
        .or_else(|| root.get("situacao_cadastral").and_then(Value::as_str))
        .map(str::to_string);

    let activity = establishment
        .and_then(|e| e.get("atividade_principal"))
        .and_then(Value::as_object);

    // 代碼欄位叫 id 或 codigo，取第一個非空的
    let activity_code = activity
        .map(|a| {
            ["id", "codigo"]
                .iter()
                .filter_map(|key| a.get(*key))
                .map(plain_string)
                .find(|code| !code.is_empty())
                .unwrap_or_default()
        })
        .unwrap_or_default();

    let activity_description = activity
        .and_then(|a| a.get("descricao"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    Some(RegistryInfo {
        registration_status,
        activity_code,
        activity_description,
    })
}

fn plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
