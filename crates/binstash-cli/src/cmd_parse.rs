/// Implementation of `binstash parse`.
///
/// Reads a file, declares every `--field` spec in order, and prints the
/// resulting stash as JSON on stdout.
///
/// # Modes
///
/// ```text
/// ┌──────────┬──────────────────────────────────────────────────────────────┐
/// │ Mode     │ Behaviour                                                    │
/// ├──────────┼──────────────────────────────────────────────────────────────┤
/// │ one-shot │ Whole file in memory; short fields become null (default)     │
/// │ --stream │ File fed in --chunk-size pieces through the streaming parser │
/// └──────────┴──────────────────────────────────────────────────────────────┘
/// ```
///
/// Both modes produce the same JSON for any layout that fits the file;
/// `--stream` exists to exercise (and debug) the incremental path.
use std::fs::{self, File};
use std::io::{self, Write as _};

use anyhow::{Context, Result};
use binstash_decoder::{DecoderConfig, Parser, Stash, StreamParser};
use tracing::info;

use crate::ParseArgs;
use crate::field::FieldSpec;

/// Run the `binstash parse` command.
///
/// # Errors
///
/// Returns an error if a field spec is malformed, the file cannot be
/// read, a size refers to a field that was never parsed, or stdout is
/// closed.
pub fn run(args: &ParseArgs) -> Result<()> {
    let fields = args
        .fields
        .iter()
        .map(|raw| raw.parse::<FieldSpec>())
        .collect::<Result<Vec<_>>>()?;

    let config = DecoderConfig {
        separator: args.separator,
        read_chunk_size: args.chunk_size,
        ..DecoderConfig::default()
    };

    let (stash, consumed) = if args.stream {
        parse_streaming(args, &fields, config)?
    } else {
        parse_oneshot(args, &fields, config)?
    };
    info!(consumed, fields = fields.len(), "parse complete");

    let json = if args.pretty {
        serde_json::to_string_pretty(&stash)?
    } else {
        serde_json::to_string(&stash)?
    };
    let mut out = io::stdout().lock();
    writeln!(out, "{json}").context("cannot write to stdout")?;
    Ok(())
}

fn parse_oneshot(args: &ParseArgs, fields: &[FieldSpec], config: DecoderConfig) -> Result<(Stash, u64)> {
    let bytes = fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    let mut parser = Parser::with_config(&bytes, config);
    for field in fields {
        field.apply(&mut parser);
    }
    let consumed = parser.tell();
    let stash = parser
        .finish()
        .with_context(|| format!("failed to parse {}", args.file.display()))?;
    Ok((stash, consumed))
}

fn parse_streaming(args: &ParseArgs, fields: &[FieldSpec], config: DecoderConfig) -> Result<(Stash, u64)> {
    let file = File::open(&args.file).with_context(|| format!("cannot open {}", args.file.display()))?;

    let mut stream = StreamParser::with_config(config);
    for field in fields {
        field.apply(&mut stream);
    }
    stream
        .read_from_sync(file)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;
    let consumed = stream.tell();
    Ok((stream.finish()?, consumed))
}
