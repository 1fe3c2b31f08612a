//! Interface de linha de comando do brandpulse baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, check)
//! e flags globais (--model, --quiet).

use clap::{Parser, Subcommand};

/// brandpulse — execuções diárias de prompts com rastreamento de marcas.
#[derive(Debug, Parser)]
#[command(name = "brandpulse", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Modelo a usar nesta execução, sobrepondo a aba Settings.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Suprime a barra de progresso; imprime apenas o JSON final.
    #[arg(long, short, global = true, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa a rodada diária completa e imprime o resumo em JSON.
    Run {
        /// Desabilita a variante aumentada (busca web) nesta execução.
        #[arg(long)]
        no_dual: bool,

        /// Limite de concorrência do pool, sobrepondo `chunk_size`.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Jobs entre flushes automáticos, sobrepondo `flush_every`.
        #[arg(long)]
        flush_every: Option<usize>,
    },

    /// Valida credenciais e configuração sem executar nada.
    Check,
}
