//! dynbson - command-line front end
//!
//! Converts between JSON-described dynamic values and BSON documents.
//!
//! # Features
//!
//! - Encode N-dimensional values into BSON
//! - Decode BSON documents back into values
//! - Validate documents and print them as extended JSON
//! - Configuration management and shell completion
//!
//! # Usage
//!
//! ```bash
//! dynbson encode value.json -o value.bson
//! dynbson decode value.bson
//! ```

use tracing::Level;

use dynbson::cli::CliInterface;
use dynbson::error::Result;

/// Application entry point
fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Main application logic
///
/// This function orchestrates the application startup:
/// 1. Parse command-line arguments
/// 2. Load configuration
/// 3. Initialize logging
/// 4. Run the selected subcommand
///
/// # Returns
/// * `Result<bool>` - Whether the command succeeded, or error
fn run() -> Result<bool> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    cli.run()
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level: Level = cli.config().logging.level.to_tracing_level();

    // stdout carries command output; logs go to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
