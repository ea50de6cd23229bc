//! # utf-recode CLI - Unicode Transformation Format Converter
//!
//! Command-line interface for converting, validating and cleaning UTF text
//! files, with ISO-8859-1 as a narrow encoding.

#[cfg(feature = "cli")]
use std::cell::Cell;
#[cfg(feature = "cli")]
use std::fs::{self, File};
#[cfg(feature = "cli")]
use std::io::{self, BufWriter, ErrorKind, Read, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use std::time::Instant;

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use serde::Serialize;
#[cfg(feature = "cli")]
use tracing::{debug, info};
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use utf_recode::bom::{Bom, bom_for, detect_bom};
#[cfg(feature = "cli")]
use utf_recode::narrow::Latin1;
#[cfg(feature = "cli")]
use utf_recode::policy::{Abort, from_fn};
#[cfg(feature = "cli")]
use utf_recode::scan::ill_formed_spans;
#[cfg(feature = "cli")]
use utf_recode::unit::units_from_bytes;
#[cfg(feature = "cli")]
use utf_recode::{
    ByteOrder, CodeUnit, Encoding, Policy, StreamRecoder, Translator, WIDE_ENCODING,
    first_ill_formed,
};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// utf-recode: conformant UTF converter
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "utf-recode")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Convert files between encodings
    Convert(ConvertArgs),

    /// Check that a file is well-formed
    Validate(ValidateArgs),

    /// Replace every ill-formed sequence of a UTF-8 file
    Clean(CleanArgs),

    /// List all supported encodings
    List,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ConvertArgs {
    /// Source encoding
    #[arg(short = 'f', long = "from")]
    from: EncodingArg,

    /// Target encoding
    #[arg(short = 't', long = "to")]
    to: EncodingArg,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// What to do with ill-formed input
    #[arg(long, default_value = "replace")]
    policy: PolicyArg,

    /// Text written in place of ill-formed input (implies --policy replace)
    #[arg(long, conflicts_with = "policy")]
    replacement: Option<String>,

    /// Strip BOM from input
    #[arg(long)]
    strip_bom: bool,

    /// Add BOM to output
    #[arg(long)]
    add_bom: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ValidateArgs {
    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Expected encoding
    #[arg(short, long)]
    encoding: EncodingArg,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct CleanArgs {
    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Text written in place of ill-formed input (default: U+FFFD)
    #[arg(long)]
    replacement: Option<String>,

    /// Buffer size for large files (KB)
    #[arg(long, default_value = "64")]
    buffer_size: usize,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EncodingArg {
    #[value(alias = "utf-8")]
    Utf8,
    #[value(alias = "utf-16le")]
    Utf16le,
    #[value(alias = "utf-16be")]
    Utf16be,
    #[value(alias = "utf-32le")]
    Utf32le,
    #[value(alias = "utf-32be")]
    Utf32be,
    #[value(alias = "iso-8859-1")]
    Latin1,
}

#[cfg(feature = "cli")]
impl EncodingArg {
    fn encoding(self) -> Encoding {
        match self {
            EncodingArg::Utf8 => Encoding::Utf8,
            EncodingArg::Utf16le | EncodingArg::Utf16be => Encoding::Utf16,
            EncodingArg::Utf32le | EncodingArg::Utf32be => Encoding::Utf32,
            EncodingArg::Latin1 => Encoding::Narrow,
        }
    }

    fn byte_order(self) -> ByteOrder {
        match self {
            EncodingArg::Utf16be | EncodingArg::Utf32be => ByteOrder::Big,
            _ => ByteOrder::Little,
        }
    }

    fn label(self) -> &'static str {
        match self {
            EncodingArg::Utf8 => "UTF-8",
            EncodingArg::Utf16le => "UTF-16LE",
            EncodingArg::Utf16be => "UTF-16BE",
            EncodingArg::Utf32le => "UTF-32LE",
            EncodingArg::Utf32be => "UTF-32BE",
            EncodingArg::Latin1 => "ISO-8859-1",
        }
    }

    fn description(self) -> &'static str {
        match self {
            EncodingArg::Utf8 => "UTF-8 Unicode",
            EncodingArg::Utf16le => "UTF-16 Little Endian",
            EncodingArg::Utf16be => "UTF-16 Big Endian",
            EncodingArg::Utf32le => "UTF-32 Little Endian",
            EncodingArg::Utf32be => "UTF-32 Big Endian",
            EncodingArg::Latin1 => "ISO-8859-1 (Latin-1), narrow",
        }
    }

    fn bom(self) -> Option<&'static [u8]> {
        bom_for(self.encoding(), self.byte_order())
    }
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    /// Write U+FFFD
    Replace,
    /// Drop the ill-formed input
    Skip,
    /// Stop with an error
    Strict,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ConversionResult {
    success: bool,
    bytes_processed: usize,
    bytes_written: usize,
    processing_time_ms: u64,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct CleanResult {
    bytes_processed: usize,
    bytes_written: usize,
    replaced: usize,
    processing_time_ms: u64,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct Span {
    start: usize,
    end: usize,
    byte_offset: usize,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ValidationReport {
    encoding: &'static str,
    valid: bool,
    code_units: usize,
    first_ill_formed: Option<Span>,
    ill_formed_count: usize,
    bom: Option<Bom>,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert(ref args) => convert_command(args, &cli)?,
        Commands::Validate(ref args) => validate_command(args, &cli)?,
        Commands::Clean(ref args) => clean_command(args, &cli)?,
        Commands::List => list_command(&cli)?,
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    let default = if verbose { "utf_recode=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "reading input");
            fs::read(path).with_context(|| format!("Failed to read input file: {}", path.display()))
        }
        None => {
            info!("reading from stdin");
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

#[cfg(feature = "cli")]
fn write_output(path: Option<&Path>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, data)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!(path = %path.display(), "wrote output");
        }
        None => io::stdout()
            .write_all(data)
            .context("Failed to write to stdout")?,
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn build_policy(policy: PolicyArg, replacement: Option<&str>) -> Policy {
    match (policy, replacement) {
        (PolicyArg::Replace, Some(text)) => Policy::Substitute(text.to_string()),
        (PolicyArg::Replace, None) => Policy::Replace,
        (PolicyArg::Skip, _) => Policy::Skip,
        (PolicyArg::Strict, _) => Policy::Strict,
    }
}

#[cfg(feature = "cli")]
fn convert_data(
    data: &[u8],
    from: EncodingArg,
    to: EncodingArg,
    policy: &Policy,
) -> utf_recode::Result<Vec<u8>> {
    Translator::new(from.encoding(), to.encoding())?
        .with_byte_order(from.byte_order(), to.byte_order())
        .with_policy(policy.clone())
        .convert_with(data, &Latin1)
}

#[cfg(feature = "cli")]
fn convert_command(args: &ConvertArgs, cli: &Cli) -> Result<()> {
    let start_time = Instant::now();
    info!(from = args.from.label(), to = args.to.label(), "converting");

    let input_data = read_input(args.input.as_deref())?;
    let mut processed_data = &input_data[..];

    // Handle BOM stripping
    if args.strip_bom {
        if let Some(bom) = args.from.bom() {
            if let Some(rest) = processed_data.strip_prefix(bom) {
                debug!(len = bom.len(), "stripped BOM");
                processed_data = rest;
            }
        }
    }

    let policy = build_policy(args.policy, args.replacement.as_deref());
    let output_data = convert_data(processed_data, args.from, args.to, &policy).with_context(|| {
        format!(
            "Conversion from {} to {} failed",
            args.from.label(),
            args.to.label()
        )
    })?;

    // Handle BOM addition
    let final_data = match args.to.bom() {
        Some(bom) if args.add_bom => [bom, &output_data[..]].concat(),
        _ => output_data,
    };

    write_output(args.output.as_deref(), &final_data)?;

    let processing_time = start_time.elapsed();
    info!(
        bytes_processed = processed_data.len(),
        bytes_written = final_data.len(),
        elapsed = ?processing_time,
        "conversion finished"
    );

    match cli.format {
        OutputFormat::Json => {
            let result = ConversionResult {
                success: true,
                bytes_processed: processed_data.len(),
                bytes_written: final_data.len(),
                processing_time_ms: processing_time.as_millis() as u64,
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            if cli.verbose || args.output.is_some() {
                eprintln!("✓ Conversion completed successfully");
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn scan_units<U: CodeUnit>(
    data: &[u8],
    order: ByteOrder,
) -> utf_recode::Result<(usize, Option<Span>, usize)> {
    let units = units_from_bytes::<U>(data, order)?;
    let first = first_ill_formed(&units);
    let span = (!first.is_empty()).then(|| Span {
        start: first.start,
        end: first.end,
        byte_offset: first.start * U::WIDTH,
    });
    Ok((units.len(), span, ill_formed_spans(&units).count()))
}

#[cfg(feature = "cli")]
fn validate_command(args: &ValidateArgs, cli: &Cli) -> Result<()> {
    let input_data = read_input(args.input.as_deref())?;
    let order = args.encoding.byte_order();

    let (code_units, first_span, ill_formed_count) = match args.encoding {
        EncodingArg::Utf8 => scan_units::<u8>(&input_data, order)?,
        EncodingArg::Utf16le | EncodingArg::Utf16be => scan_units::<u16>(&input_data, order)?,
        EncodingArg::Utf32le | EncodingArg::Utf32be => scan_units::<u32>(&input_data, order)?,
        // every byte is a character
        EncodingArg::Latin1 => (input_data.len(), None, 0),
    };

    let report = ValidationReport {
        encoding: args.encoding.label(),
        valid: first_span.is_none(),
        code_units,
        first_ill_formed: first_span,
        ill_formed_count,
        bom: detect_bom(&input_data),
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if report.valid {
                println!("✓ Input is valid {}", report.encoding);
            } else {
                println!("✗ Input is not valid {}", report.encoding);
            }
            if let Some(span) = &report.first_ill_formed {
                println!(
                    "  First ill-formed sequence: code units {}..{} (byte offset {})",
                    span.start, span.end, span.byte_offset
                );
                println!("  Ill-formed sequences: {}", report.ill_formed_count);
            }
            if let Some(bom) = &report.bom {
                println!("  BOM: {} ({:02X?})", bom.encoding, bom.bytes());
            }
        }
    }

    if !report.valid {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn clean_command(args: &CleanArgs, cli: &Cli) -> Result<()> {
    let start_time = Instant::now();

    let mut reader: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(
            File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output file: {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let replacement = args
        .replacement
        .as_deref()
        .unwrap_or("\u{FFFD}")
        .as_bytes()
        .to_vec();
    let replaced = Cell::new(0usize);
    let policy = from_fn(|| -> std::result::Result<Vec<u8>, Abort> {
        replaced.set(replaced.get() + 1);
        Ok(replacement.clone())
    });

    let mut stream = StreamRecoder::<u8, u8>::new();
    let mut buffer = vec![0u8; args.buffer_size.max(1) * 1024];
    let mut out = Vec::with_capacity(buffer.len());
    let mut bytes_written = 0;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err).context("Failed to read input"),
        };
        stream.push(&buffer[..n], &mut out, &policy)?;
        writer.write_all(&out).context("Failed to write output")?;
        bytes_written += out.len();
        out.clear();
    }

    let bytes_processed = stream.consumed() + stream.pending();
    stream.finish(&mut out, &policy)?;
    writer.write_all(&out).context("Failed to write output")?;
    writer.flush().context("Failed to write output")?;
    bytes_written += out.len();

    let processing_time = start_time.elapsed();
    info!(
        bytes_processed,
        bytes_written,
        replaced = replaced.get(),
        elapsed = ?processing_time,
        "cleaning finished"
    );

    match cli.format {
        OutputFormat::Json => {
            let result = CleanResult {
                bytes_processed,
                bytes_written,
                replaced: replaced.get(),
                processing_time_ms: processing_time.as_millis() as u64,
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            eprintln!("✓ Replaced {} ill-formed sequences", replaced.get());
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn list_command(cli: &Cli) -> Result<()> {
    let encodings = EncodingArg::value_variants();

    match cli.format {
        OutputFormat::Json => {
            let encodings_info: Vec<_> = encodings
                .iter()
                .map(|encoding| {
                    serde_json::json!({
                        "name": encoding.label(),
                        "description": encoding.description(),
                        "unit_width": encoding.encoding().unit_width().unwrap_or(1),
                        "bom": encoding.bom(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&encodings_info)?);
        }
        OutputFormat::Text => {
            println!("Supported Encodings ({} total):", encodings.len());
            println!();
            for encoding in encodings {
                let bom = encoding
                    .bom()
                    .map(|bom| format!("{bom:02X?}"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:12} {:32} BOM {}",
                    encoding.label(),
                    encoding.description(),
                    bom
                );
            }
            println!();
            println!("Platform wide encoding: {WIDE_ENCODING}");
        }
    }

    Ok(())
}
