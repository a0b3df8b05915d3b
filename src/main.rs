//! targetline - release pipeline runner
//!
//! Runs a requested target of the release pipeline together with every
//! target it depends on.
//!
//! ## Quick Start
//!
//! ```bash
//! # Full release with build counter 42
//! targetline --build-counter 42
//!
//! # Only compile, in Debug
//! targetline compile --configuration Debug
//!
//! # Show what would run
//! targetline --plan
//!
//! # Generate shell completions
//! targetline --completions bash > /etc/bash_completion.d/targetline
//! ```

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            for cause in e.chain().skip(1) {
                eprintln!("  caused by: {cause}");
            }
            ExitCode::FAILURE
        }
    }
}
