use std::path::PathBuf;

use clap::Parser;
use matter_data_model::CompilationInput;
use matter_endpoint_config::{compile, group_nvm_tokens, CompilerOptions, Endianness, StringSizing};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use tracing::Level;

/// Compiles a data model snapshot (JSON) into endpoint configuration tables.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file holding the compilation input
    #[arg(value_name = "INPUT.json")]
    input: PathBuf,

    /// Store numeric long defaults big endian
    #[arg(long)]
    big_endian: bool,

    /// Largest default (in bytes) kept inline in the attribute record
    #[arg(long, value_name = "N", default_value_t = matter_endpoint_config::options::DEFAULT_INLINE_BUDGET)]
    inline_budget: u16,

    /// Treat unrecognized storage options as RAM instead of failing
    #[arg(long)]
    lenient_storage: bool,

    /// Size read-only strings with a default to that default
    #[arg(long)]
    minimize_write_once_strings: bool,

    /// Also group NVM attributes into persistence tokens
    #[arg(long)]
    tokens: bool,

    /// Log debug output
    #[arg(long, short)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn options(&self) -> CompilerOptions {
        CompilerOptions {
            endianness: if self.big_endian {
                Endianness::Big
            } else {
                Endianness::Little
            },
            inline_budget: self.inline_budget,
            lenient_storage: self.lenient_storage,
            string_sizing: if self.minimize_write_once_strings {
                StringSizing::MinimizeWriteOnce
            } else {
                StringSizing::MaxLength
            },
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct Output {
    options: CompilerOptions,
    config: matter_endpoint_config::EndpointConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens: Option<matter_endpoint_config::TokenTable>,
}

fn init_logging(args: &Args) {
    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr);
    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let text = std::fs::read_to_string(&args.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", args.input.display()))?;
    let input: CompilationInput = serde_json::from_str(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("parsing {}", args.input.display()))?;

    let options = args.options();
    let config = compile(&input, &options)?;
    let tokens = if args.tokens {
        Some(group_nvm_tokens(&input, &options)?)
    } else {
        None
    };

    let output = Output {
        options,
        config,
        tokens,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&output).into_diagnostic()?
    );
    Ok(())
}
