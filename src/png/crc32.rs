use super::*;

const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut out = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      if (c & 1) != 0 {
        c = 0xEDB8_8320_u32 ^ (c >> 1);
      } else {
        c = c >> 1;
      }
      //
      k += 1;
    }
    out[n] = c;
    //
    n += 1;
  }
  out
}

/// Running CRC-32 (the IEEE variant PNG uses).
///
/// This is a plain value: [`reset`](Self::reset) puts it back in exactly the
/// state [`new`](Self::new) makes, so one accumulator can be reused chunk
/// after chunk with nothing carried over between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Crc32(u32);
impl Crc32 {
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self(u32::MAX)
  }

  #[inline]
  pub fn reset(&mut self) {
    *self = Self::new();
  }

  #[inline]
  pub fn update(&mut self, bytes: &[u8]) {
    let mut crc = self.0;
    for &byte in bytes {
      let i = (crc ^ u32::from(byte)) as u8 as usize;
      crc = CRC_TABLE[i] ^ (crc >> 8);
    }
    self.0 = crc;
  }

  /// The checksum of everything passed to `update` since the last reset.
  #[inline]
  #[must_use]
  pub const fn finish(self) -> u32 {
    self.0 ^ u32::MAX
  }

  /// One-shot checksum of some bytes.
  #[inline]
  #[must_use]
  pub fn checksum(bytes: &[u8]) -> u32 {
    let mut crc = Self::new();
    crc.update(bytes);
    crc.finish()
  }

  /// The CRC field value a chunk of this type and data should carry.
  #[inline]
  #[must_use]
  pub fn chunk_crc(ty: ChunkTy, data: &[u8]) -> u32 {
    let mut crc = Self::new();
    crc.update(&ty.0);
    crc.update(data);
    crc.finish()
  }
}
impl Default for Crc32 {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
