//! NAU Vault Inspector
//!
//! Runs a TOML scenario through an editor session and prints the resulting
//! proposal, submission and (when enabled) debug report.
//!
//! ```text
//! nau-vault-inspect scenario.toml
//! RUST_LOG=debug nau-vault-inspect scenario.toml
//! ```

use std::env;
use std::process::ExitCode;

use nau_vault_editor::Scenario;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: nau-vault-inspect <scenario.toml>");
        return ExitCode::from(2);
    };

    let report = match Scenario::load(&path).and_then(|scenario| scenario.run()) {
        Ok(report) => report,
        Err(e) => {
            log::error!("{path}: {e} ({})", e.code());
            return ExitCode::FAILURE;
        }
    };

    match toml::to_string_pretty(&report) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            log::warn!("TOML rendering failed ({e}), printing debug form");
            println!("{report:#?}");
        }
    }
    ExitCode::SUCCESS
}
