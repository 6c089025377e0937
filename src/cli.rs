//! Interface de linha de comando do jobtrack baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (status, wait, entity,
//! sub-entities) e flags globais que sobrepõem `jobtrack.toml`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// jobtrack — espera jobs do provedor terminarem e resolve os ids produzidos.
#[derive(Debug, Parser)]
#[command(name = "jobtrack", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho para o arquivo de configuração.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Escopo de serviço dono do job (ex.: ecs, evs).
    #[arg(long, global = true)]
    pub service: Option<String>,

    /// Região do job.
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Intervalo entre consultas, em segundos.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Tempo máximo de espera, em segundos.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Falhas transitórias consecutivas toleradas durante a espera.
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mostra o status atual de um job.
    Status {
        job_id: String,
    },

    /// Espera um job atingir o status alvo e imprime o relatório.
    Wait {
        job_id: String,

        /// Status a aguardar.
        #[arg(long, default_value = "SUCCESS")]
        target: String,
    },

    /// Espera o job terminar e imprime `entities.<field>`.
    Entity {
        job_id: String,
        /// Campo do resultado (ex.: server_id).
        field: String,
    },

    /// Espera o job terminar e imprime `entities.<field>` de cada sub-job, em ordem.
    SubEntities {
        job_id: String,
        /// Campo do resultado de cada sub-job (ex.: volume_id).
        field: String,
    },
}
