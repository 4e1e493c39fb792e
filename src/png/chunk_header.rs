use super::*;

/// The 8 bytes in front of every chunk: data length, then type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct ChunkHeader {
  length: U32BE,
  pub ty: ChunkTy,
}
impl ChunkHeader {
  #[inline]
  #[must_use]
  pub const fn new(ty: ChunkTy, length: u32) -> Self {
    Self { length: U32BE::from_u32(length), ty }
  }

  /// The declared length of the chunk's data.
  #[inline]
  #[must_use]
  pub const fn len(&self) -> u32 {
    self.length.to_u32()
  }

  #[inline]
  #[must_use]
  pub const fn is_empty(&self) -> bool {
    self.len() == 0
  }

  #[inline]
  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    bytemuck::bytes_of(self)
  }
}

#[test]
fn test_chunk_header_layout() {
  assert_eq!(core::mem::size_of::<ChunkHeader>(), 8);
  let h = ChunkHeader::new(ChunkTy::IHDR, 13);
  assert_eq!(h.as_bytes(), b"\0\0\0\x0DIHDR");
  let back: ChunkHeader = bytemuck::pod_read_unaligned(b"\0\0\x01\0IDAT");
  assert_eq!(back.ty, ChunkTy::IDAT);
  assert_eq!(back.len(), 256);
}
