use core::{fmt, str::FromStr};

use crate::png::MAX_CHUNK_LEN;

/// A zlib compression level.
///
/// The range is `0..=10`, following `miniz_oxide`: 0 stores the data
/// uncompressed, 9 is the usual "best", and 10 is miniz's extra slow "uber"
/// setting.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct CompressionLevel(u8);
impl CompressionLevel {
  /// No compression, the data goes into stored blocks.
  pub const NONE: Self = Self(0);
  /// Fastest compression.
  pub const FAST: Self = Self(1);
  /// zlib's default.
  pub const DEFAULT: Self = Self(6);
  /// Best compression in the classic zlib range.
  pub const BEST: Self = Self(9);
  /// The highest level that `miniz_oxide` accepts.
  pub const MAX: Self = Self(10);

  /// Makes a level, or `None` if `level` is over [`Self::MAX`].
  #[inline]
  #[must_use]
  pub const fn new(level: u8) -> Option<Self> {
    if level <= Self::MAX.0 {
      Some(Self(level))
    } else {
      None
    }
  }

  #[inline]
  #[must_use]
  pub const fn get(self) -> u8 {
    self.0
  }
}
impl Default for CompressionLevel {
  #[inline]
  fn default() -> Self {
    Self::DEFAULT
  }
}
impl fmt::Debug for CompressionLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "level {}", self.0)
  }
}
impl fmt::Display for CompressionLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}
impl TryFrom<u8> for CompressionLevel {
  type Error = InvalidCompressionLevel;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Self::new(value).ok_or(InvalidCompressionLevel)
  }
}
impl FromStr for CompressionLevel {
  type Err = InvalidCompressionLevel;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.trim().parse::<u8>().map_err(|_| InvalidCompressionLevel).and_then(Self::try_from)
  }
}

/// The value given isn't a compression level in `0..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("compression level must be a number from 0 to 10")]
pub struct InvalidCompressionLevel;

/// Settings for a [`Recompressor`](crate::png::Recompressor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecompressOptions {
  /// Level for the new zlib stream.
  pub level: CompressionLevel,
  /// Largest data length of an emitted `IDAT` chunk.
  ///
  /// Every `IDAT` chunk except the last one comes out at exactly this
  /// length. Values outside of `1..=MAX_CHUNK_LEN` are clamped.
  pub idat_target_len: u32,
}
impl RecompressOptions {
  /// The target used by [`Default`], 64k per `IDAT` chunk.
  pub const DEFAULT_IDAT_TARGET_LEN: u32 = 1 << 16;

  #[inline]
  #[must_use]
  pub const fn with_level(self, level: CompressionLevel) -> Self {
    Self { level, ..self }
  }

  #[inline]
  #[must_use]
  pub const fn with_idat_target_len(self, idat_target_len: u32) -> Self {
    Self { idat_target_len, ..self }
  }

  /// The chunk data length actually used, after clamping.
  #[inline]
  #[must_use]
  pub fn effective_idat_target_len(&self) -> usize {
    self.idat_target_len.clamp(1, MAX_CHUNK_LEN) as usize
  }
}
impl Default for RecompressOptions {
  #[inline]
  fn default() -> Self {
    Self { level: CompressionLevel::DEFAULT, idat_target_len: Self::DEFAULT_IDAT_TARGET_LEN }
  }
}
