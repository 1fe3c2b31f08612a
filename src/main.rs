use clap::Parser;
use serde_json::json;

use brandpulse::cli::{Cli, Command};
use brandpulse::config::AppConfig;
use brandpulse::run::{self, RunOverrides};
use brandpulse::ui;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app = match AppConfig::load() {
        Ok(app) => app,
        Err(e) => fail(&e.to_string()),
    };

    match cli.command {
        Command::Run {
            no_dual,
            concurrency,
            flush_every,
        } => {
            let overrides = RunOverrides {
                model: cli.model,
                dual: no_dual.then_some(false),
                concurrency,
                flush_every,
            };
            match run::execute(&app, &overrides, !cli.quiet).await {
                Ok(summary) => {
                    if cli.quiet {
                        println!("{}", serde_json::to_string(&summary).unwrap_or_default());
                    } else {
                        ui::print_summary(&summary);
                    }
                }
                Err(e) => fail(&e.to_string()),
            }
        }
        Command::Check => match app.validate() {
            Ok(()) => println!("{}", json!({ "ok": true })),
            Err(e) => fail(&e.to_string()),
        },
    }
}

/// Print the `{ok:false, error}` object and exit non-zero, mirroring the
/// entry point's failure contract.
fn fail(error: &str) -> ! {
    println!("{}", json!({ "ok": false, "error": error }));
    std::process::exit(1);
}
