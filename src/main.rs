use std::{
  fs::File,
  io::{self, BufReader, BufWriter, Write},
  path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use png_relevel::{
  png::{has_png_signature, RawPngChunkIter, RecompressReport, Recompressor},
  CompressionLevel, RecompressOptions,
};
use tracing::{error, info, metadata::LevelFilter, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Subcommand)]
enum Command {
  /// Recompress the image data of a PNG file.
  ///
  /// All chunks other than IDAT are copied unchanged. The pixels decode to
  /// exactly the same values as before.
  Recompress {
    /// PNG file to read.
    input: PathBuf,

    /// Where to write the new PNG. Writes to stdout if not given.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// zlib compression level, 0 (store only) to 10 (slowest).
    #[clap(short, long, default_value_t = CompressionLevel::DEFAULT)]
    level: CompressionLevel,

    /// Data bytes per output IDAT chunk.
    #[clap(long, default_value_t = RecompressOptions::DEFAULT_IDAT_TARGET_LEN)]
    chunk_size: u32,
  },
  /// Print the chunks of PNG files, with their declared and actual CRCs.
  Chunks {
    /// PNG files to read.
    files: Vec<PathBuf>,
  },
}

#[derive(Parser)]
#[clap(version, about)]
struct Args {
  /// Tool to run.
  #[clap(subcommand)]
  command: Command,
}

fn fallible_main() -> anyhow::Result<()> {
  let args = Args::parse();

  match args.command {
    Command::Recompress { input, output, level, chunk_size } => {
      let options =
        RecompressOptions::default().with_level(level).with_idat_target_len(chunk_size);
      let report = match output {
        Some(output) => recompress_to_file(&input, &output, options)?,
        None => {
          let stdout = io::stdout().lock();
          recompress_file(&input, BufWriter::new(stdout), options)?
        }
      };
      info!(
        chunks_in = report.idat_chunks_in,
        chunks_out = report.idat_chunks_out,
        "IDAT data: {} -> {} bytes",
        report.compressed_in,
        report.compressed_out
      );
    }
    Command::Chunks { files } => {
      if files.is_empty() {
        bail!("no files given");
      }
      for path in &files {
        if let Err(e) = print_chunks(path) {
          error!("{}: {e:?}", path.display());
        }
      }
    }
  }

  Ok(())
}

fn recompress_file<W: Write>(
  input: &Path, sink: W, options: RecompressOptions,
) -> anyhow::Result<RecompressReport> {
  info!(file = ?input, level = options.level.get(), "Recompressing");
  let source = BufReader::new(
    File::open(input).with_context(|| format!("cannot open {}", input.display()))?,
  );
  Recompressor::new(options)
    .recompress(source, sink)
    .with_context(|| format!("cannot recompress {}", input.display()))
}

/// A failed run leaves a half written file behind, which is removed.
fn recompress_to_file(
  input: &Path, output: &Path, options: RecompressOptions,
) -> anyhow::Result<RecompressReport> {
  if same_file(input, output) {
    bail!("output would overwrite the input file");
  }
  let file =
    File::create(output).with_context(|| format!("cannot create {}", output.display()))?;
  let result = recompress_file(input, BufWriter::new(file), options);
  if result.is_err() {
    if let Err(e) = std::fs::remove_file(output) {
      warn!("cannot remove partial output {}: {e}", output.display());
    }
  }
  result
}

/// Whether both paths lead to one existing file, however they're spelled.
fn same_file(a: &Path, b: &Path) -> bool {
  match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
    (Ok(a), Ok(b)) => a == b,
    _ => false,
  }
}

fn print_chunks(path: &Path) -> anyhow::Result<()> {
  let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
  println!("{}: {} bytes", path.display(), bytes.len());
  if !has_png_signature(&bytes) {
    bail!("not a PNG file");
  }
  for (n, chunk) in RawPngChunkIter::new(&bytes).enumerate() {
    let actual = chunk.actual_crc();
    let mark = if actual == chunk.declared_crc() { "ok" } else { "BAD" };
    println!(
      "{n:4}: {:?} len={:<8} crc={:#010X} actual={actual:#010X} {mark}",
      chunk.ty(),
      chunk.data().len(),
      chunk.declared_crc(),
    );
  }
  Ok(())
}

fn main() {
  let subscriber = tracing_subscriber::registry()
    .with(EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy())
    .with(tracing_subscriber::fmt::layer().without_time().with_writer(io::stderr));
  tracing::subscriber::set_global_default(subscriber)
    .expect("cannot set default tracing subscriber");

  if let Err(err) = fallible_main() {
    error!("{err:?}");
    std::process::exit(1);
  }
}
