/// Implementation of `binstash hex`.
///
/// Prints a 16-bytes-per-line dump with absolute offsets, which is the
/// quickest way to work out a `--field` layout for an unfamiliar file.
///
/// ```text
/// 00000000  05 00 50 0b b8                                    ..P..
/// ```
use std::fs;
use std::io::{self, Write as _};

use anyhow::{Context, Result, bail};

use crate::HexArgs;

/// Run the `binstash hex` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, `--offset` is past the
/// end of the file, or stdout is closed.
pub fn run(args: &HexArgs) -> Result<()> {
    let bytes = fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    if args.offset > bytes.len() {
        bail!(
            "offset {} is past the end of {} ({} bytes)",
            args.offset,
            args.file.display(),
            bytes.len()
        );
    }
    let end = args
        .length
        .map_or(bytes.len(), |len| args.offset.saturating_add(len).min(bytes.len()));

    let mut out = io::stdout().lock();
    for line in dump_lines(&bytes[args.offset..end], args.offset) {
        writeln!(out, "{line}").context("cannot write to stdout")?;
    }
    Ok(())
}

/// Format `data` as hex dump lines, labelling offsets from `base`.
fn dump_lines(data: &[u8], base: usize) -> Vec<String> {
    data.chunks(16)
        .enumerate()
        .map(|(i, chunk)| {
            let offset = base + i * 16;
            let hex = chunk
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(" ");
            let ascii: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
                .collect();
            format!("{offset:08x}  {hex:<48}  {ascii}")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_short_line() {
        let lines = dump_lines(&[5, 0, 80, 11, 184], 0);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("00000000  05 00 50 0b b8 "));
        assert!(lines[0].ends_with("..P.."));
    }

    #[test]
    fn offsets_continue_from_base() {
        let data = [0u8; 20];
        let lines = dump_lines(&data, 0x100);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("00000110  "));
    }
}
