use crate::core::ConfigProvider;
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_EMAIL_COLUMN: &str = "Email";
const DEFAULT_TAX_ID_COLUMN: &str = "CNPJ";
const DEFAULT_CACHE_PATH: &str = "./output/cnpj_cache.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub input: InputConfig,
    pub quota: Option<QuotaConfig>,
    pub cache: Option<CacheConfig>,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    pub email_column: Option<String>,
    pub cnpj_column: Option<String>,
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    pub max_calls_per_window: Option<u32>,
    pub cooldown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EnrichError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EnrichError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${REGISTRY_URL})，未定義的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_url("source.endpoint", &self.source.endpoint)?;
        crate::utils::validation::validate_path("input.path", &self.input.path)?;
        crate::utils::validation::validate_path("load.output_path", &self.load.output_path)?;

        if let Some(delimiter) = &self.input.delimiter {
            crate::utils::validation::validate_delimiter("input.delimiter", delimiter)?;
        }

        if let Some(quota) = &self.quota {
            if let Some(max_calls) = quota.max_calls_per_window {
                crate::utils::validation::validate_positive_number(
                    "quota.max_calls_per_window",
                    max_calls as u64,
                    1,
                )?;
            }
        }

        if let Some(timeout) = self.source.timeout_seconds {
            crate::utils::validation::validate_positive_number(
                "source.timeout_seconds",
                timeout,
                1,
            )?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn registry_endpoint(&self) -> &str {
        &self.source.endpoint
    }

    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn email_column(&self) -> &str {
        self.input
            .email_column
            .as_deref()
            .unwrap_or(DEFAULT_EMAIL_COLUMN)
    }

    fn tax_id_column(&self) -> &str {
        self.input
            .cnpj_column
            .as_deref()
            .unwrap_or(DEFAULT_TAX_ID_COLUMN)
    }

    fn cache_path(&self) -> &str {
        self.cache
            .as_ref()
            .map(|c| c.path.as_str())
            .unwrap_or(DEFAULT_CACHE_PATH)
    }

    fn csv_delimiter(&self) -> u8 {
        self.input
            .delimiter
            .as_deref()
            .and_then(|d| d.as_bytes().first().copied())
            .unwrap_or(b';')
    }

    fn max_calls_per_window(&self) -> u32 {
        self.quota
            .as_ref()
            .and_then(|q| q.max_calls_per_window)
            .unwrap_or(3)
    }

    fn cooldown_seconds(&self) -> u64 {
        self.quota
            .as_ref()
            .and_then(|q| q.cooldown_seconds)
            .unwrap_or(65)
    }

    fn request_timeout_seconds(&self) -> u64 {
        self.source.timeout_seconds.unwrap_or(10)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
