//! Command-line interface for dynbson
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and validation
//! - Reading inputs from files or standard input
//! - Dispatching subcommands to the codec and the formatter

pub mod completion;

use clap::{Parser, Subcommand};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{Config, LogLevel, OutputFormat};
use crate::error::Result;
use crate::formatter::Formatter;
use crate::value::DynamicValue;

/// Path argument that stands for standard input or output
const STDIO_PATH: &str = "-";

/// dynbson - Convert dynamic array values to and from BSON
#[derive(Parser, Debug)]
#[command(
    name = "dynbson",
    version,
    about = "Convert dynamic array values to and from BSON",
    long_about = "Encode N-dimensional numeric, logical, text, cell, record and date values
into BSON documents, and decode BSON documents back into such values."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Maximum nesting depth for encoding and decoding
    #[arg(long, value_name = "N", global = true)]
    pub max_depth: Option<usize>,

    /// Output format (json, json-pretty)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<String>,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for dynbson
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode a JSON-described value into BSON
    Encode {
        /// JSON file holding the value ("-" for stdin)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file for the BSON bytes (stdout by default)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print the bytes as hex instead of raw BSON
        #[arg(long)]
        hex: bool,
    },

    /// Decode a BSON document into a value
    Decode {
        /// BSON file ("-" for stdin)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Print a one-line summary instead of the full value
        #[arg(long)]
        summary: bool,
    },

    /// Check that a file holds one well-formed BSON document
    Validate {
        /// BSON file ("-" for stdin)
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Print a BSON document as relaxed extended JSON
    Json {
        /// BSON file ("-" for stdin)
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        let args = CliArgs::parse();
        let config = Self::load_config(&args)?;

        Ok(Self { args, config })
    }

    /// Load configuration from file and environment, then apply arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    fn load_config(args: &CliArgs) -> Result<Config> {
        let config_path = args.config_file.as_deref();
        let mut config = Config::load_from_file(config_path)?;

        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            config = Config::default();
        }

        config.apply_env()?;
        Self::apply_args_to_config(&mut config, args);
        config.validate()?;

        Ok(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Override configuration values with CLI arguments where provided
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if let Some(depth) = args.max_depth {
            config.codec.max_depth = depth;
        }

        if let Some(format_str) = &args.format {
            config.display.format = Self::parse_output_format(format_str, config.display.format);
        }

        if args.no_color {
            config.display.color_output = false;
        }

        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Parse output format string, keeping `fallback` for unknown names
    fn parse_output_format(format_str: &str, fallback: OutputFormat) -> OutputFormat {
        OutputFormat::parse(format_str).unwrap_or_else(|| {
            eprintln!("Warning: Unknown format '{}', using default", format_str);
            fallback
        })
    }

    /// Run the selected subcommand
    ///
    /// # Returns
    /// * `Result<bool>` - False when the command ran but reports failure
    ///   (an invalid document for `validate`)
    pub fn run(&self) -> Result<bool> {
        let formatter = Formatter::from_config(&self.config.display);
        match &self.args.command {
            Commands::Encode { input, output, hex } => {
                self.encode(input, output.as_deref(), *hex)?;
                Ok(true)
            }
            Commands::Decode { input, summary } => {
                let bytes = read_input(input)?;
                let value = crate::decode_from_bytes_with(&bytes, &self.config.codec)?;
                info!("Decoded {}", Formatter::summarize(&value));
                if *summary {
                    println!("{}", Formatter::summarize(&value));
                } else {
                    if Formatter::has_non_finite(&value) {
                        warn!("NaN and infinite numbers are printed as null and will not encode back");
                    }
                    println!("{}", formatter.format_value(&value)?);
                }
                Ok(true)
            }
            Commands::Validate { input } => {
                let valid = crate::validate_bytes(&read_input(input)?);
                if !self.args.quiet {
                    println!("{}", valid);
                }
                Ok(valid)
            }
            Commands::Json { input } => {
                let json = crate::bytes_to_json(&read_input(input)?)?;
                println!("{}", formatter.format_json(&json)?);
                Ok(true)
            }
            Commands::Config { show, validate } => {
                self.handle_config_command(*show, *validate)?;
                Ok(true)
            }
            Commands::Completion { shell } => {
                print!("{}", completion::generate_completion(shell)?);
                Ok(true)
            }
        }
    }

    /// Encode the JSON value in `input` and write the BSON bytes
    fn encode(&self, input: &Path, output: Option<&Path>, hex: bool) -> Result<()> {
        let value: DynamicValue = serde_json::from_slice(&read_input(input)?)?;
        info!("Encoding {}", Formatter::summarize(&value));
        let bytes = crate::encode_to_bytes_with(&value, &self.config.codec)?;
        debug!("Encoded {} bytes", bytes.len());

        let payload = if hex {
            let mut text = Formatter::format_hex(&bytes);
            text.push('\n');
            text.into_bytes()
        } else {
            bytes
        };

        match output {
            Some(path) if path != Path::new(STDIO_PATH) => std::fs::write(path, payload)?,
            _ => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&payload)?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    /// Handle config subcommand
    ///
    /// # Arguments
    /// * `show` - Whether to show configuration
    /// * `validate` - Whether to validate configuration
    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config_file();
        }

        if show || !validate {
            self.show_config()?;
        }

        Ok(())
    }

    /// Validate configuration file
    fn validate_config_file(&self) {
        let path = self.get_config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("❌ Configuration file does not exist");
            return;
        }

        match Config::from_file(&path) {
            Ok(config) => match config.validate() {
                Ok(_) => println!("✅ Configuration is valid"),
                Err(e) => println!("❌ Configuration validation failed: {}", e),
            },
            Err(e) => println!("❌ Failed to load configuration: {}", e),
        }
    }

    /// Show effective configuration
    fn show_config(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("# Configuration file: {}", path.display());
        println!();
        println!("{}", self.config.to_toml()?);
        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_path)
    }
}

/// Read a whole input file, or standard input for `-`
fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new(STDIO_PATH) {
        let mut buffer = Vec::new();
        std::io::stdin().lock().read_to_end(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(std::fs::read(path)?)
    }
}
