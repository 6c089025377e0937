//! Tipos de erro para o cliente de jobs do provedor.
//!
//! Define [`ProviderError`] com variantes para rate limiting, erros da API,
//! erros de rede e documentos de job malformados. Usa `thiserror` para derivar
//! `Display` e `Error` a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao buscar um documento de job no provedor.
///
/// - [`RateLimited`](ProviderError::RateLimited) — o servidor retornou HTTP 429
/// - [`Api`](ProviderError::Api) — qualquer outro erro HTTP (4xx/5xx)
/// - [`Network`](ProviderError::Network) — falha na camada de rede
/// - [`Decode`](ProviderError::Decode) — corpo não é JSON ou não tem `status`
#[derive(Debug, Error)]
pub enum ProviderError {
    /// O servidor retornou HTTP 429.
    /// `retry_after_ms` indica quantos milissegundos esperar antes de retentar.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Erro retornado pela API (ex.: 401 token inválido, 404 job desconhecido, 500 erro interno).
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// O documento do job não pôde ser interpretado.
    #[error("malformed job document: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Whether a later attempt at the same fetch could plausibly succeed.
    ///
    /// Network failures, 5xx responses and rate limiting are transient.
    /// Client errors and undecodable documents are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } => true,
            ProviderError::Api { status, .. } => *status >= 500,
            ProviderError::Network(_) => true,
            ProviderError::Decode(_) => false,
        }
    }
}
