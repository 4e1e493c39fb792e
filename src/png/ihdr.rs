use super::*;

/// Image Header payload.
///
/// Only the compression method matters for recompression, the other fields
/// are carried through untouched and exposed for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct IHDR {
  width: U32BE,
  height: U32BE,
  pub bit_depth: u8,
  pub color_type: u8,
  pub compression_method: u8,
  pub filter_method: u8,
  pub interlace_method: u8,
}
impl IHDR {
  /// Bytes of data in every valid `IHDR` chunk.
  pub const LEN: u32 = core::mem::size_of::<Self>() as u32;

  /// The one compression method PNG defines: zlib deflate.
  pub const COMPRESSION_ZLIB: u8 = 0;

  #[inline]
  #[must_use]
  pub const fn width(&self) -> u32 {
    self.width.to_u32()
  }

  #[inline]
  #[must_use]
  pub const fn height(&self) -> u32 {
    self.height.to_u32()
  }
}

#[test]
fn test_ihdr_layout() {
  assert_eq!(IHDR::LEN, 13);
  let bytes = [0, 0, 1, 0, 0, 0, 0, 2, 8, 6, 0, 0, 1];
  let ihdr: IHDR = bytemuck::pod_read_unaligned(&bytes);
  assert_eq!(ihdr.width(), 256);
  assert_eq!(ihdr.height(), 2);
  assert_eq!(ihdr.bit_depth, 8);
  assert_eq!(ihdr.color_type, 6);
  assert_eq!(ihdr.compression_method, IHDR::COMPRESSION_ZLIB);
  assert_eq!(ihdr.interlace_method, 1);
}
