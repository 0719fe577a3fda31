//! Domain 存在性檢查。
//!
//! MX 記錄是郵件基礎設施的直接訊號；查不到時退回 A 記錄，
//! 寬鬆認定「domain 還活著」以免誤殺配置不良但真實存在的公司。
//! 所有錯誤一律降級為 false，查詢失敗（非確定的否定答案）記 warn。

use crate::domain::ports::DnsResolver;
use crate::utils::error::{EnrichError, Result};
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::TokioAsyncResolver;

/// hickory-resolver 實作，優先使用系統的 DNS 設定
pub struct HickoryDns {
    resolver: TokioAsyncResolver,
}

impl HickoryDns {
    pub fn from_system() -> Self {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(e) => {
                tracing::warn!("🌐 System DNS config unavailable ({}), using defaults", e);
                TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
            }
        };
        Self { resolver }
    }
}

/// NXDOMAIN / 空回應是確定的「沒有記錄」，其他錯誤交給呼叫端降級
fn classify_resolve_error(e: ResolveError) -> Result<bool> {
    match e.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => Ok(false),
        _ => Err(EnrichError::DnsError {
            message: e.to_string(),
        }),
    }
}

#[async_trait]
impl DnsResolver for HickoryDns {
    async fn has_mx_records(&self, domain: &str) -> Result<bool> {
        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => Ok(lookup.iter().next().is_some()),
            Err(e) => classify_resolve_error(e),
        }
    }

    async fn has_a_records(&self, domain: &str) -> Result<bool> {
        match self.resolver.ipv4_lookup(domain).await {
            Ok(lookup) => Ok(lookup.iter().next().is_some()),
            Err(e) => classify_resolve_error(e),
        }
    }
}

/// MX 優先、A 記錄備援的存在性檢查。永不回傳錯誤
pub async fn domain_exists<R: DnsResolver + ?Sized>(resolver: &R, domain: &str) -> bool {
    let domain = domain.trim().to_lowercase();
    if domain.is_empty() {
        return false;
    }

    match resolver.has_mx_records(&domain).await {
        Ok(true) => return true,
        Ok(false) => {}
        Err(e) => tracing::warn!("🌐 MX query for '{}' failed: {}", domain, e),
    }

    match resolver.has_a_records(&domain).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!("🌐 A query for '{}' failed: {}", domain, e);
            false
        }
    }
}
