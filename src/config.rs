//! Configuração do jobtrack carregada a partir de `jobtrack.toml`.
//!
//! A struct [`TrackerConfig`] contém o endpoint do provedor, credenciais e a
//! política de espera ([`WaitPolicy`]). Valores não presentes no arquivo usam
//! defaults sensíveis. A variável de ambiente `JOBTRACK_TOKEN` tem precedência
//! sobre o arquivo.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::tracker::WaitSpec;

pub const DEFAULT_CONFIG_FILE: &str = "jobtrack.toml";
pub const TOKEN_ENV: &str = "JOBTRACK_TOKEN";

/// Configuração de nível superior carregada de `jobtrack.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Domínio base dos endpoints do provedor (`{service}.{region}.{domain}`).
    #[serde(default)]
    pub endpoint_domain: String,

    /// Projeto dono dos jobs consultados.
    #[serde(default)]
    pub project_id: String,

    /// Versão da API de jobs.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Token de autenticação enviado em `X-Auth-Token`.
    #[serde(default)]
    pub token: String,

    /// Escopo de serviço padrão quando não especificado via CLI.
    #[serde(default = "default_service")]
    pub service: String,

    /// Região padrão quando não especificada via CLI.
    #[serde(default)]
    pub region: String,

    /// URL base fixa, ignorando serviço e região (endpoints privados, testes).
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub wait: WaitPolicy,
}

/// Cadência e orçamento de espera usados pelo facade.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WaitPolicy {
    /// Intervalo entre consultas, em segundos.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Tempo máximo de espera por job, em segundos.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Falhas transitórias consecutivas toleradas durante a espera.
    #[serde(default)]
    pub transport_retries: u32,
}

// Valor padrão para a versão da API: "v1".
fn default_api_version() -> String {
    "v1".to_string()
}

// Valor padrão para o serviço: "ecs".
fn default_service() -> String {
    "ecs".to_string()
}

// Valor padrão para o intervalo: 10s.
fn default_poll_interval_secs() -> u64 {
    10
}

// Valor padrão para o timeout: 600s.
fn default_timeout_secs() -> u64 {
    600
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
            transport_retries: 0,
        }
    }
}

impl WaitPolicy {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject policies that would make a waiter spin.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("wait.poll_interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Build the [`WaitSpec`] for one wait on `target_status` under this policy.
    pub fn spec_for(&self, target_status: &str) -> WaitSpec {
        WaitSpec::new(target_status, self.poll_interval(), self.timeout())
            .with_transport_retries(self.transport_retries)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            endpoint_domain: String::new(),
            project_id: String::new(),
            api_version: default_api_version(),
            token: String::new(),
            service: default_service(),
            region: String::new(),
            base_url: None,
            wait: WaitPolicy::default(),
        }
    }
}

impl TrackerConfig {
    /// Carrega a configuração de `jobtrack.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho explícito.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<TrackerConfig>(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        config.wait.validate()?;

        // Variável de ambiente tem precedência sobre o arquivo para o token.
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                config.token = token;
            }
        }

        Ok(config)
    }
}
