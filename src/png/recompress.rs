use super::*;

use miniz_oxide::MZFlush;

/// Hard cap on how much decoded data goes into the encoder per flush.
const MAX_DECODE_WINDOW: usize = 1 << 20;

/// What a recompression did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecompressReport {
  /// Chunks other than `IDAT` copied over, `IHDR` included.
  pub copied_chunks: u32,
  pub idat_chunks_in: u32,
  pub idat_chunks_out: u32,
  /// Total `IDAT` data length in the input.
  pub compressed_in: u64,
  /// Total `IDAT` data length in the output.
  pub compressed_out: u64,
  /// Length of the decoded image data stream.
  pub decoded: u64,
}

/// Rewrites a PNG with its image data recompressed.
///
/// Everything but the `IDAT` chunks is copied through as-is, in its
/// original order. The `IDAT` run is decoded and encoded again at the
/// configured level, then packed into new chunks of the configured size.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recompressor {
  options: RecompressOptions,
}
impl Recompressor {
  #[inline]
  #[must_use]
  pub const fn new(options: RecompressOptions) -> Self {
    Self { options }
  }

  #[inline]
  #[must_use]
  pub const fn options(&self) -> &RecompressOptions {
    &self.options
  }

  /// Reads a PNG from `source` and writes the recompressed PNG to `sink`.
  ///
  /// Chunks are written as soon as their CRC checks out, and no chunk is
  /// written before that. If this returns an error then whatever reached
  /// `sink` is not a usable PNG.
  pub fn recompress<R: Read, W: Write>(&self, source: R, mut sink: W) -> PngResult<RecompressReport> {
    let mut cursor = ChunkCursor::new(source);
    let mut report = RecompressReport::default();

    let signature = cursor.read_signature()?;
    if !has_png_signature(&signature) {
      return Err(PngLevelError::NotAPngFile);
    }
    sink.write_all(&signature)?;

    let ihdr = copy_ihdr(&mut cursor, &mut sink)?;
    debug!(
      width = ihdr.width(),
      height = ihdr.height(),
      bit_depth = ihdr.bit_depth,
      color_type = ihdr.color_type,
      interlace = ihdr.interlace_method,
      "IHDR"
    );
    report.copied_chunks += 1;

    let mut payload = Vec::new();
    let mut seen_idat = false;
    let mut next = cursor.next_header()?;
    while let Some(header) = next {
      if header.ty == ChunkTy::IDAT {
        if seen_idat {
          return Err(PngLevelError::WrongImageDataOrder);
        }
        seen_idat = true;
        next = self.recompress_idat_run(&mut cursor, header, &mut sink, &mut report)?;
      } else {
        copy_chunk(&mut cursor, header, &mut payload, &mut sink)?;
        report.copied_chunks += 1;
        next = cursor.next_header()?;
      }
    }
    sink.flush()?;

    if !seen_idat {
      debug!("no IDAT chunks in the input");
    }
    Ok(report)
  }

  /// Replaces the `IDAT` run starting at `first`, returning the header that
  /// followed the run.
  fn recompress_idat_run<R: Read, W: Write>(
    &self, cursor: &mut ChunkCursor<R>, first: ChunkHeader, sink: &mut W,
    report: &mut RecompressReport,
  ) -> PngResult<Option<ChunkHeader>> {
    let target_len = self.options.effective_idat_target_len();
    let mut run = IdatStream::new(cursor, first);
    let mut inflater = Inflater::new();
    let mut deflater = Deflater::new(self.options.level);
    let mut chunker = IdatChunker::new(target_len);
    let mut decoded = vec![0_u8; target_len.min(MAX_DECODE_WINDOW)];

    loop {
      let mut filled = 0;
      while filled < decoded.len() {
        let n = match inflater.read(&mut decoded[filled..], |buf| run.read(buf)) {
          Ok(n) => n,
          Err(PngLevelError::CorruptImageStream) if inflater.is_starved() => {
            let next = run.finish()?;
            return Err(if find_later_idat(cursor, next)? {
              PngLevelError::WrongImageDataOrder
            } else {
              PngLevelError::CorruptImageStream
            });
          }
          Err(e) => return Err(e),
        };
        if n == 0 {
          break;
        }
        filled += n;
      }
      if filled == 0 {
        break;
      }
      report.decoded += filled as u64;
      deflater.compress(&decoded[..filled], MZFlush::Sync, chunker.buffer_mut())?;
      chunker.emit_full(sink)?;
    }
    debug_assert!(inflater.is_finished());

    // every input CRC is checked before the last of the new data goes out
    let next = run.finish()?;
    report.idat_chunks_in = run.chunks();
    report.compressed_in = run.compressed_len();

    deflater.compress(&[], MZFlush::Finish, chunker.buffer_mut())?;
    chunker.emit_rest(sink)?;
    report.idat_chunks_out = chunker.chunks();
    report.compressed_out = chunker.compressed_len();

    debug!(
      level = self.options.level.get(),
      chunks_in = report.idat_chunks_in,
      chunks_out = report.idat_chunks_out,
      bytes_in = report.compressed_in,
      bytes_out = report.compressed_out,
      decoded = report.decoded,
      "recompressed IDAT run"
    );
    Ok(next)
  }
}

/// Reads, checks, and copies the `IHDR` chunk that must come first.
fn copy_ihdr<R: Read, W: Write>(cursor: &mut ChunkCursor<R>, sink: &mut W) -> PngResult<IHDR> {
  let header = match cursor.next_header()? {
    Some(header) if header.ty == ChunkTy::IHDR => header,
    _ => return Err(PngLevelError::MissingHeader),
  };
  if header.len() != IHDR::LEN {
    return Err(PngLevelError::BadHeaderLength(header.len()));
  }
  cursor.begin(header);
  let mut ihdr = IHDR::zeroed();
  cursor.read_payload_exact(bytemuck::bytes_of_mut(&mut ihdr))?;
  if ihdr.compression_method != IHDR::COMPRESSION_ZLIB {
    return Err(PngLevelError::UnsupportedCompressionMethod(ihdr.compression_method));
  }
  let crc = cursor.finish_chunk()?;
  if !crc.is_valid() {
    return Err(PngLevelError::ContainerCrcMismatch {
      ty: header.ty,
      declared: crc.declared,
      computed: crc.computed,
    });
  }
  sink.write_all(header.as_bytes())?;
  sink.write_all(bytemuck::bytes_of(&ihdr))?;
  sink.write_all(&crc.declared.to_be_bytes())?;
  Ok(ihdr)
}

/// Reads one chunk's data into `payload` and checks its CRC, giving back
/// the CRC.
fn read_checked<R: Read>(
  cursor: &mut ChunkCursor<R>, header: ChunkHeader, payload: &mut Vec<u8>,
) -> PngResult<u32> {
  cursor.begin(header);
  cursor.read_payload_to_end(payload)?;
  let crc = cursor.finish_chunk()?;
  if !crc.is_valid() {
    return Err(PngLevelError::ContainerCrcMismatch {
      ty: header.ty,
      declared: crc.declared,
      computed: crc.computed,
    });
  }
  Ok(crc.declared)
}

/// Copies one chunk through unchanged, once its CRC is confirmed.
fn copy_chunk<R: Read, W: Write>(
  cursor: &mut ChunkCursor<R>, header: ChunkHeader, payload: &mut Vec<u8>, sink: &mut W,
) -> PngResult<()> {
  trace!(ty = ?header.ty, len = header.len(), "copy");
  let crc = read_checked(cursor, header, payload)?;
  sink.write_all(header.as_bytes())?;
  sink.write_all(payload)?;
  sink.write_all(&crc.to_be_bytes())?;
  Ok(())
}

/// Walks the chunks after an `IDAT` run whose zlib stream came up short,
/// without writing anything. Gives `true` if another `IDAT` chunk turns up,
/// meaning the image data was split around other chunks.
fn find_later_idat<R: Read>(
  cursor: &mut ChunkCursor<R>, mut next: Option<ChunkHeader>,
) -> PngResult<bool> {
  let mut payload = Vec::new();
  while let Some(header) = next {
    if header.ty == ChunkTy::IDAT {
      debug!("IDAT run resumes after other chunks");
      return Ok(true);
    }
    read_checked(cursor, header, &mut payload)?;
    next = cursor.next_header()?;
  }
  Ok(false)
}

/// Recompresses the PNG in `source` at `level` into `sink`, with the
/// default `IDAT` chunk size.
///
/// ```no_run
/// # fn main() -> Result<(), png_relevel::PngLevelError> {
/// use png_relevel::{png::recompress, CompressionLevel};
/// let input = std::fs::File::open("in.png")?;
/// let output = std::io::BufWriter::new(std::fs::File::create("out.png")?);
/// let report = recompress(std::io::BufReader::new(input), output, CompressionLevel::BEST)?;
/// println!("{} -> {} bytes of image data", report.compressed_in, report.compressed_out);
/// # Ok(())
/// # }
/// ```
pub fn recompress<R: Read, W: Write>(
  source: R, sink: W, level: CompressionLevel,
) -> PngResult<RecompressReport> {
  Recompressor::new(RecompressOptions::default().with_level(level)).recompress(source, sink)
}
