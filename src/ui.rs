//! Interface de terminal do brandpulse — barra de progresso e saída colorida.
//!
//! Usa `indicatif` para a barra de progresso da execução e `console` para
//! estilização com cores. O [`RunProgress`] acompanha visualmente os jobs
//! conforme os workers os concluem.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::run::RunSummary;

/// Indicador visual de progresso para uma execução no terminal.
pub struct RunProgress {
    pb: ProgressBar,
    // Estilo verde para sucesso.
    green: Style,
    // Estilo vermelho para falha.
    red: Style,
}

impl RunProgress {
    /// Inicia a barra para `total` jobs.
    pub fn start(total: usize, model: &str) -> Self {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("model {model}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    /// Registra um job concluído com sucesso.
    pub fn job_done(&self, id: &str) {
        self.pb
            .println(format!("  {} {id}", self.green.apply_to("✓")));
        self.pb.inc(1);
    }

    /// Registra um job que falhou (os demais continuam).
    pub fn job_failed(&self, id: &str) {
        self.pb.println(format!("  {} {id}", self.red.apply_to("✗")));
        self.pb.inc(1);
    }

    /// Finaliza a barra e limpa a linha.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

/// Imprime o resumo final: banner colorido e o objeto JSON da execução.
pub fn print_summary(summary: &RunSummary) {
    let style = if summary.errors.is_empty() {
        Style::new().green().bold()
    } else {
        Style::new().red().bold()
    };
    eprintln!();
    eprintln!("{}", style.apply_to("─── Run Summary ───"));
    println!(
        "{}",
        serde_json::to_string_pretty(summary).unwrap_or_default()
    );
}
