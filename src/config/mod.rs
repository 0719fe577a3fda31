pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::{EnrichError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{
    validate_delimiter, validate_non_empty_string, validate_path, validate_positive_number,
    validate_url, Validate,
};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "valida-prospect")]
#[command(about = "Enriches a B2B prospect list with e-mail, DNS and CNPJ registry signals")]
pub struct CliConfig {
    #[arg(long, help = "Input file with prospect records (delimited text)")]
    pub input: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "https://publica.cnpj.ws/cnpj")]
    pub registry_endpoint: String,

    #[arg(long, default_value = "Email", help = "Name of the e-mail column")]
    pub email_column: String,

    #[arg(long, default_value = "CNPJ", help = "Name of the CNPJ column")]
    pub cnpj_column: String,

    #[arg(long, default_value = "./output/cnpj_cache.json")]
    pub cache_path: String,

    #[arg(long, default_value = ";", help = "CSV delimiter (single ASCII character)")]
    pub delimiter: String,

    #[arg(long, default_value = "3")]
    pub max_calls_per_window: u32,

    #[arg(long, default_value = "65")]
    pub cooldown_seconds: u64,

    #[arg(long, default_value = "10")]
    pub timeout_seconds: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON (for non-interactive runs)")]
    pub log_json: bool,

    #[arg(long, help = "Load settings from a TOML file instead of flags")]
    pub config: Option<String>,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn registry_endpoint(&self) -> &str {
        &self.registry_endpoint
    }

    fn input_path(&self) -> &str {
        self.input.as_deref().unwrap_or("")
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn email_column(&self) -> &str {
        &self.email_column
    }

    fn tax_id_column(&self) -> &str {
        &self.cnpj_column
    }

    fn cache_path(&self) -> &str {
        &self.cache_path
    }

    fn csv_delimiter(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b';')
    }

    fn max_calls_per_window(&self) -> u32 {
        self.max_calls_per_window
    }

    fn cooldown_seconds(&self) -> u64 {
        self.cooldown_seconds
    }

    fn request_timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        match &self.input {
            None => {
                return Err(EnrichError::MissingConfigError {
                    field: "input".to_string(),
                })
            }
            Some(path) => validate_path("input", path)?,
        }

        validate_url("registry_endpoint", &self.registry_endpoint)?;
        validate_path("output_path", &self.output_path)?;
        validate_path("cache_path", &self.cache_path)?;
        validate_non_empty_string("email_column", &self.email_column)?;
        validate_non_empty_string("cnpj_column", &self.cnpj_column)?;
        validate_delimiter("delimiter", &self.delimiter)?;
        validate_positive_number("max_calls_per_window", self.max_calls_per_window as u64, 1)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;

        Ok(())
    }
}
