use super::*;

/// Packs freshly compressed bytes into new `IDAT` chunks.
///
/// Compressed output collects in [`buffer_mut`](Self::buffer_mut). Each
/// [`emit_full`](Self::emit_full) writes out as many chunks of exactly the
/// target length as the buffer holds and keeps the remainder for later, and
/// [`emit_rest`](Self::emit_rest) writes that final short chunk. The CRC used
/// here is separate from the one checking the input.
pub struct IdatChunker {
  target_len: usize,
  pending: Vec<u8>,
  crc: Crc32,
  chunks: u32,
  bytes: u64,
}
impl IdatChunker {
  pub fn new(target_len: usize) -> Self {
    let target_len = target_len.clamp(1, MAX_CHUNK_LEN as usize);
    Self { target_len, pending: Vec::new(), crc: Crc32::new(), chunks: 0, bytes: 0 }
  }

  /// Where the encoder should append its output.
  #[inline]
  pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
    &mut self.pending
  }

  /// `IDAT` chunks written so far.
  #[inline]
  #[must_use]
  pub const fn chunks(&self) -> u32 {
    self.chunks
  }

  /// Data bytes written so far, not counting chunk framing.
  #[inline]
  #[must_use]
  pub const fn compressed_len(&self) -> u64 {
    self.bytes
  }

  /// Writes every full-length chunk currently buffered.
  pub fn emit_full<W: Write>(&mut self, sink: &mut W) -> PngResult<()> {
    let full = self.pending.len() / self.target_len * self.target_len;
    if full == 0 {
      return Ok(());
    }
    for i in (0..full).step_by(self.target_len) {
      let end = i + self.target_len;
      Self::write_chunk(&mut self.crc, sink, &self.pending[i..end])?;
      self.chunks += 1;
      self.bytes += self.target_len as u64;
    }
    self.pending.drain(..full);
    Ok(())
  }

  /// Writes everything still buffered, the last chunk possibly short.
  pub fn emit_rest<W: Write>(&mut self, sink: &mut W) -> PngResult<()> {
    self.emit_full(sink)?;
    if !self.pending.is_empty() {
      Self::write_chunk(&mut self.crc, sink, &self.pending)?;
      self.chunks += 1;
      self.bytes += self.pending.len() as u64;
      self.pending.clear();
    }
    Ok(())
  }

  fn write_chunk<W: Write>(crc: &mut Crc32, sink: &mut W, data: &[u8]) -> PngResult<()> {
    let header = ChunkHeader::new(ChunkTy::IDAT, data.len() as u32);
    crc.reset();
    crc.update(&header.ty.0);
    crc.update(data);
    trace!(len = data.len(), "new IDAT");
    sink.write_all(header.as_bytes())?;
    sink.write_all(data)?;
    sink.write_all(&crc.finish().to_be_bytes())?;
    Ok(())
  }
}
