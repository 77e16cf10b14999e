/// binstash command-line tool: decode binary files against a field
/// layout given on the command line, and dump bytes while writing one.
///
/// # Command overview
///
/// ```text
/// binstash <COMMAND> [OPTIONS]
///
/// Commands:
///   parse    Decode a file with --field specs and print the stash as JSON
///   hex      Print a hex dump of (part of) a file
///   help     Print help information
///
/// Global options:
///   -v, -vv, -vvv    Log at info, debug, trace (RUST_LOG also honoured)
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                        |
/// |------|------------------------------------------------|
/// | 0    | Success                                        |
/// | 1    | Error (I/O failure, bad field spec, etc.)      |
///
/// Results go to stdout, logs and errors to stderr.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod cmd_hex;
mod cmd_parse;
mod field;

// ── CLI root ──────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "binstash", version, about = "Chainable binary field decoder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Decode a file against a list of field specs.
    Parse(ParseArgs),
    /// Print a hex dump of a file.
    Hex(HexArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `binstash parse`.
///
/// Each `--field` declares one operation, in order. Field specs have the
/// form `<kind>:<key>[:<size>]`:
///
/// ```text
/// ┌──────────────────────────┬────────────────────────────────────────────┐
/// │ Spec                     │ Effect                                     │
/// ├──────────────────────────┼────────────────────────────────────────────┤
/// │ word16lu:ports.src       │ 16-bit little-endian unsigned word         │
/// │ buffer:payload:len       │ `len` raw bytes (literal or earlier key)   │
/// │ string:name:8            │ 8-byte UTF-8 string                        │
/// │ string:rest              │ string to end of input                     │
/// │ cstring:label            │ null-terminated string                     │
/// │ skip:4                   │ skip 4 bytes (or a key's value)            │
/// │ scan:line:\r\n           │ bytes up to a delimiter                    │
/// └──────────────────────────┴────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct ParseArgs {
    /// File to decode.
    pub file: PathBuf,

    /// Field spec; repeat for each field, in layout order.
    #[arg(short, long = "field", required = true)]
    pub fields: Vec<String>,

    /// Feed the file through the streaming parser instead of one-shot.
    #[arg(long)]
    pub stream: bool,

    /// Chunk size used with `--stream`.
    #[arg(long, default_value_t = 8192)]
    pub chunk_size: usize,

    /// Separator for nested keys.
    #[arg(long, default_value_t = '.')]
    pub separator: char,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,
}

/// Arguments for `binstash hex`.
#[derive(clap::Args)]
pub struct HexArgs {
    /// File to dump.
    pub file: PathBuf,

    /// First byte to show.
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Number of bytes to show (default: to end of file).
    #[arg(long)]
    pub length: Option<usize>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Parse(args) => cmd_parse::run(&args),
        Commands::Hex(args) => cmd_hex::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
