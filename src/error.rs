use std::io;

use thiserror::Error;

use crate::png::ChunkTy;

/// An error from the `png_relevel` crate.
///
/// Every error is fatal to the recompression that produced it. Whatever was
/// already written to the output is not a usable PNG and should be discarded.
#[derive(Debug, Error)]
pub enum PngLevelError {
  /// The first eight bytes aren't the PNG signature.
  #[error("not a PNG file")]
  NotAPngFile,

  /// The first chunk after the signature isn't `IHDR` (or there's no chunk).
  #[error("missing IHDR chunk")]
  MissingHeader,

  /// The `IHDR` chunk doesn't hold exactly 13 bytes.
  #[error("incorrect IHDR length: {0}")]
  BadHeaderLength(u32),

  /// The `IHDR` chunk names a compression method other than zlib (0).
  #[error("unsupported compression method: {0}")]
  UnsupportedCompressionMethod(u8),

  /// A chunk declares a length over `2^31 - 1`.
  #[error("chunk is too big: {0} bytes")]
  ChunkTooLarge(u32),

  /// A non-image chunk's CRC didn't match its contents.
  #[error("invalid checksum of {ty:?} chunk: declared {declared:#010X}, computed {computed:#010X}")]
  ContainerCrcMismatch { ty: ChunkTy, declared: u32, computed: u32 },

  /// An `IDAT` chunk's CRC didn't match its contents.
  #[error("invalid checksum of IDAT chunk: declared {declared:#010X}, computed {computed:#010X}")]
  ImageDataCrcMismatch { declared: u32, computed: u32 },

  /// `IDAT` chunks showed up again after some other chunk ended the run.
  #[error("wrong IDAT order")]
  WrongImageDataOrder,

  /// The zlib data in the `IDAT` run couldn't be decoded.
  #[error("corrupt image data stream")]
  CorruptImageStream,

  /// The input ended in the middle of a signature, header, payload or CRC.
  #[error("unexpected end of input")]
  Truncated,

  /// The zlib encoder refused to make progress.
  #[error("zlib encoder failure")]
  Encoder,

  /// Any other failure of the underlying reader or writer.
  #[error("i/o error: {0}")]
  Io(io::Error),
}

impl From<io::Error> for PngLevelError {
  #[inline]
  fn from(e: io::Error) -> Self {
    match e.kind() {
      io::ErrorKind::UnexpectedEof => Self::Truncated,
      _ => Self::Io(e),
    }
  }
}

/// Alias for results using [`PngLevelError`].
pub type PngResult<T> = Result<T, PngLevelError>;
