//! Interface de terminal do jobtrack — spinner e saída colorida.
//!
//! Usa `indicatif` para o spinner enquanto um job é aguardado e `console`
//! para estilização com cores.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use jobtrack::{TrackError, WaitReport};

/// Indicador visual enquanto um job é aguardado no terminal.
pub struct WaitProgress {
    // Spinner do indicatif.
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl WaitProgress {
    /// Inicia o spinner para o job informado.
    pub fn start(job_id: &str, target: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]") {
            pb.set_style(style);
        }
        pb.set_message(format!("waiting for job {job_id} to reach {target}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Finaliza o spinner com sucesso.
    pub fn done(&self, message: &str) {
        self.pb.finish_and_clear();
        eprintln!("  {} {message}", self.green.apply_to("✓"));
    }

    /// Finaliza o spinner e exibe o erro; cancelamentos aparecem em amarelo.
    pub fn failed(&self, err: &TrackError) {
        self.pb.finish_and_clear();
        let mark = match err {
            TrackError::Cancelled { .. } => self.yellow.apply_to("⊘"),
            _ => self.red.apply_to("✗"),
        };
        eprintln!("  {mark} {err}");
    }
}

/// Imprime o relatório de espera formatado em JSON.
pub fn print_report(report: &WaitReport) {
    println!(
        "{}",
        serde_json::to_string_pretty(report).unwrap_or_default()
    );
}
