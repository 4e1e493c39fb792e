use super::*;

/// An unparsed chunk from in-memory PNG bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawPngChunk<'b> {
  pub(crate) ty: ChunkTy,
  pub(crate) data: &'b [u8],
  pub(crate) declared_crc: u32,
}
impl<'b> RawPngChunk<'b> {
  #[inline]
  #[must_use]
  pub const fn ty(&self) -> ChunkTy {
    self.ty
  }
  #[inline]
  #[must_use]
  pub const fn data(&self) -> &'b [u8] {
    self.data
  }
  #[inline]
  #[must_use]
  pub const fn declared_crc(&self) -> u32 {
    self.declared_crc
  }
  /// The CRC computed over the type and data.
  #[inline]
  #[must_use]
  pub fn actual_crc(&self) -> u32 {
    Crc32::chunk_crc(self.ty, self.data)
  }
  #[inline]
  #[must_use]
  pub fn is_crc_valid(&self) -> bool {
    self.actual_crc() == self.declared_crc
  }
}
impl Debug for RawPngChunk<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawPngChunk")
      .field("ty", &self.ty)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}

/// An iterator that produces successive raw chunks from PNG bytes.
///
/// Iteration just stops at the first chunk that doesn't fit in the remaining
/// bytes. Arbitrary input never panics the iterator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct RawPngChunkIter<'b>(&'b [u8]);
impl<'b> RawPngChunkIter<'b> {
  /// Pass the full PNG bytes, it will remove the PNG signature automatically.
  ///
  /// The signature isn't checked, use [`has_png_signature`] for that.
  #[inline]
  pub const fn new(bytes: &'b [u8]) -> Self {
    match bytes {
      [_, _, _, _, _, _, _, _, rest @ ..] => Self(rest),
      _ => Self(&[]),
    }
  }
}
impl<'b> Iterator for RawPngChunkIter<'b> {
  type Item = RawPngChunk<'b>;
  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    let (header, rest) = match self.0 {
      [a, b, c, d, e, f, g, h, rest @ ..] => {
        (ChunkHeader::new(ChunkTy([*e, *f, *g, *h]), u32::from_be_bytes([*a, *b, *c, *d])), rest)
      }
      _ => return None,
    };
    let len = header.len() as usize;
    if rest.len() < len || rest.len() - len < 4 {
      self.0 = &[];
      return None;
    }
    let (data, rest) = rest.split_at(len);
    let (crc_bytes, rest) = rest.split_at(4);
    let declared_crc = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    self.0 = rest;
    Some(RawPngChunk { ty: header.ty, data, declared_crc })
  }
}

/// Checks that the bytes begin with [`PNG_SIGNATURE`].
#[inline]
#[must_use]
pub fn has_png_signature(bytes: &[u8]) -> bool {
  bytes.starts_with(&PNG_SIGNATURE)
}

#[test]
fn test_raw_chunk_iter_stops_on_short_data() {
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend_from_slice(&[0, 0, 0, 0]);
  png.extend_from_slice(b"IEND");
  png.extend_from_slice(&0xAE42_6082_u32.to_be_bytes());
  png.extend_from_slice(&[0, 0, 0, 9, b't', b'E', b'X', b't', 1, 2]);
  let chunks: Vec<_> = RawPngChunkIter::new(&png).collect();
  assert_eq!(chunks.len(), 1);
  assert_eq!(chunks[0].ty(), ChunkTy::IEND);
  assert!(chunks[0].is_crc_valid());
  assert!(has_png_signature(&png));
  assert_eq!(RawPngChunkIter::new(&png[..3]).next(), None);
}
