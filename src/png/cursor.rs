use super::*;

/// The declared and recomputed CRC of a chunk that was just read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkCrc {
  pub declared: u32,
  pub computed: u32,
}
impl ChunkCrc {
  #[inline]
  #[must_use]
  pub const fn is_valid(&self) -> bool {
    self.declared == self.computed
  }
}

/// Position within a PNG byte source.
///
/// This owns the source along with the state of the chunk being read: its
/// type, how many data bytes are left, and the running CRC. Every read of
/// chunk data goes through the cursor, so the CRC always covers exactly the
/// bytes consumed since [`begin`](Self::begin).
pub struct ChunkCursor<R> {
  source: R,
  ty: ChunkTy,
  remaining: u32,
  crc: Crc32,
}
impl<R: Read> ChunkCursor<R> {
  #[inline]
  pub fn new(source: R) -> Self {
    Self { source, ty: ChunkTy([0; 4]), remaining: 0, crc: Crc32::new() }
  }

  #[inline]
  pub fn into_inner(self) -> R {
    self.source
  }

  /// Type of the chunk most recently passed to `begin`.
  #[inline]
  #[must_use]
  pub const fn ty(&self) -> ChunkTy {
    self.ty
  }

  /// Data bytes of the current chunk not yet read.
  #[inline]
  #[must_use]
  pub const fn remaining(&self) -> u32 {
    self.remaining
  }

  pub fn read_signature(&mut self) -> PngResult<[u8; 8]> {
    let mut signature = [0_u8; 8];
    self.source.read_exact(&mut signature)?;
    Ok(signature)
  }

  /// Reads the next chunk header.
  ///
  /// Gives `Ok(None)` if the source ends cleanly right here, between chunks.
  /// Running out of bytes partway through the header is `Truncated`.
  pub fn next_header(&mut self) -> PngResult<Option<ChunkHeader>> {
    debug_assert_eq!(self.remaining, 0, "previous chunk was not fully read");
    let mut header = ChunkHeader::zeroed();
    let got = read_until_full(&mut self.source, bytemuck::bytes_of_mut(&mut header))?;
    match got {
      0 => Ok(None),
      8 if header.len() > MAX_CHUNK_LEN => Err(PngLevelError::ChunkTooLarge(header.len())),
      8 => Ok(Some(header)),
      _ => Err(PngLevelError::Truncated),
    }
  }

  /// Starts reading the data of the chunk with this header.
  #[inline]
  pub fn begin(&mut self, header: ChunkHeader) {
    self.ty = header.ty;
    self.remaining = header.len();
    self.crc.reset();
    self.crc.update(&header.ty.0);
  }

  /// Reads up to `buf.len()` bytes of the current chunk's data.
  ///
  /// Gives 0 once the chunk's data is used up (or if `buf` is empty). The
  /// source ending before the chunk's declared length is `Truncated`.
  pub fn read_payload(&mut self, buf: &mut [u8]) -> PngResult<usize> {
    let want = buf.len().min(self.remaining as usize);
    if want == 0 {
      return Ok(0);
    }
    let got = read_some(&mut self.source, &mut buf[..want])?;
    if got == 0 {
      return Err(PngLevelError::Truncated);
    }
    self.crc.update(&buf[..got]);
    self.remaining -= got as u32;
    Ok(got)
  }

  /// Fills all of `buf` from the current chunk's data.
  pub fn read_payload_exact(&mut self, buf: &mut [u8]) -> PngResult<()> {
    if buf.len() > self.remaining as usize {
      return Err(PngLevelError::Truncated);
    }
    let mut filled = 0;
    while filled < buf.len() {
      filled += self.read_payload(&mut buf[filled..])?;
    }
    Ok(())
  }

  /// Reads all of the current chunk's remaining data, replacing the
  /// contents of `out`.
  pub fn read_payload_to_end(&mut self, out: &mut Vec<u8>) -> PngResult<()> {
    out.clear();
    let want = u64::from(self.remaining);
    let got = (&mut self.source).take(want).read_to_end(out)?;
    if (got as u64) < want {
      return Err(PngLevelError::Truncated);
    }
    self.crc.update(out);
    self.remaining = 0;
    Ok(())
  }

  /// Reads the CRC field that ends the current chunk.
  ///
  /// All of the chunk's data must have been read first.
  pub fn finish_chunk(&mut self) -> PngResult<ChunkCrc> {
    debug_assert_eq!(self.remaining, 0, "chunk data was not fully read");
    let mut crc_bytes = [0_u8; 4];
    self.source.read_exact(&mut crc_bytes)?;
    Ok(ChunkCrc { declared: u32::from_be_bytes(crc_bytes), computed: self.crc.finish() })
  }
}
