//! Configuração do brandpulse.
//!
//! Dois níveis: [`AppConfig`] (credenciais e defaults de deploy, de
//! `brandpulse.toml` com precedência das variáveis de ambiente) e
//! [`RunConfig`] (parâmetros de uma execução, vindos da aba Settings da
//! planilha com defaults e pisos). Nenhum estado global: o RunConfig é
//! construído uma vez na entrada e passado por referência.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use chrono::{FixedOffset, Utc};
use serde::Deserialize;

use crate::error::BrandpulseError;

pub const CONFIG_FILE: &str = "brandpulse.toml";

/// Credenciais e defaults de deploy.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Chave da API OpenAI.
    #[serde(default)]
    pub openai_api_key: String,

    /// Token bearer para o backend de planilha.
    #[serde(default)]
    pub sheets_token: String,

    /// Identificador da planilha de destino.
    #[serde(default)]
    pub sheet_id: String,

    /// Modelo usado quando a aba Settings não define `model`.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Deslocamento UTC fixo usado para a chave de data diária.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,

    /// URL base alternativa da API OpenAI (testes).
    #[serde(default)]
    pub openai_base_url: Option<String>,

    /// URL base alternativa do backend de planilha (testes).
    #[serde(default)]
    pub sheets_base_url: Option<String>,
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

// Fuso do projeto original (Africa/Cairo).
fn default_utc_offset() -> i32 {
    2
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            sheets_token: String::new(),
            sheet_id: String::new(),
            default_model: default_model(),
            utc_offset_hours: default_utc_offset(),
            openai_base_url: None,
            sheets_base_url: None,
        }
    }
}

impl AppConfig {
    /// Carrega `brandpulse.toml` do diretório atual, se existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega de um caminho específico; usa defaults se o arquivo não existir.
    /// Variáveis de ambiente têm precedência sobre o arquivo.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&contents)?
        } else {
            Self::default()
        };

        for (var, field) in [
            ("OPENAI_API_KEY", &mut config.openai_api_key),
            ("SHEETS_TOKEN", &mut config.sheets_token),
            ("SHEET_ID", &mut config.sheet_id),
            ("DEFAULT_MODEL", &mut config.default_model),
        ] {
            if let Ok(value) = std::env::var(var)
                && !value.is_empty()
            {
                *field = value;
            }
        }

        Ok(config)
    }

    /// Validação antecipada: falha nomeando a primeira credencial ausente,
    /// antes de qualquer trabalho começar.
    pub fn validate(&self) -> Result<(), BrandpulseError> {
        for (name, value) in [
            ("OPENAI_API_KEY", &self.openai_api_key),
            ("SHEETS_TOKEN", &self.sheets_token),
            ("SHEET_ID", &self.sheet_id),
        ] {
            if value.trim().is_empty() {
                return Err(BrandpulseError::Config(name.to_string()));
            }
        }
        Ok(())
    }

    /// Chave de calendário de hoje (`YYYY-MM-DD`) no fuso configurado.
    pub fn today_key(&self) -> String {
        today_key(self.utc_offset_hours)
    }
}

/// Parâmetros imutáveis de uma execução.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub model: String,
    pub tab_prompts: String,
    pub tab_brands: String,
    pub tab_wide: String,
    pub dual_variant: bool,
    /// Limite de concorrência do pool de workers.
    pub concurrency: usize,
    /// Jobs processados entre flushes automáticos.
    pub flush_every: usize,
}

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_FLUSH_EVERY: usize = 25;
pub const MIN_FLUSH_EVERY: usize = 5;

impl RunConfig {
    /// Constrói a partir do mapa da aba Settings, com defaults e pisos.
    pub fn from_settings(settings: &HashMap<String, String>, default_model: &str) -> Self {
        let get = |key: &str| {
            settings
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };
        Self {
            model: get("model").unwrap_or(default_model).to_string(),
            tab_prompts: get("sheet_name_prompts").unwrap_or("Prompts").to_string(),
            tab_brands: get("sheet_name_brands").unwrap_or("Brands").to_string(),
            tab_wide: get("sheet_name_wide").unwrap_or("Daily_Runs").to_string(),
            dual_variant: get("enable_dual_variant")
                .map(|v| v.eq_ignore_ascii_case("TRUE"))
                .unwrap_or(true),
            concurrency: get("chunk_size")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CONCURRENCY)
                .max(1),
            flush_every: get("flush_every")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_FLUSH_EVERY)
                .max(MIN_FLUSH_EVERY),
        }
    }
}

/// Chave de data no formato `YYYY-MM-DD` para um deslocamento UTC fixo.
pub fn today_key(offset_hours: i32) -> String {
    let clamped = offset_hours.clamp(-23, 23);
    let offset =
        FixedOffset::east_opt(clamped * 3600).expect("clamped offset is in range");
    Utc::now().with_timezone(&offset).format("%Y-%m-%d").to_string()
}
