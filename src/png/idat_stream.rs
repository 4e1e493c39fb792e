use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
  /// The header of the next `IDAT` chunk, read but not loaded yet.
  Pending(ChunkHeader),
  /// The run is over. Holds the header that ended it, which has already been
  /// taken off the source, or `None` if the source itself ended.
  Done(Option<ChunkHeader>),
}

/// All the `IDAT` chunks of a run, read as one continuous byte stream.
///
/// Chunk boundaries are invisible to the reader. Each chunk's data is loaded
/// whole and its CRC checked before any of it is handed out, so nothing read
/// from here is unverified. The first header of any other type ends the
/// stream, and it's kept so the caller can carry on from that chunk.
pub struct IdatStream<'c, R> {
  cursor: &'c mut ChunkCursor<R>,
  state: RunState,
  payload: Vec<u8>,
  pos: usize,
  chunks: u32,
  bytes: u64,
}
impl<'c, R: Read> IdatStream<'c, R> {
  /// Starts the run at an `IDAT` header the cursor just read.
  pub fn new(cursor: &'c mut ChunkCursor<R>, first: ChunkHeader) -> Self {
    debug_assert_eq!(first.ty, ChunkTy::IDAT);
    Self {
      cursor,
      state: RunState::Pending(first),
      payload: Vec::new(),
      pos: 0,
      chunks: 0,
      bytes: 0,
    }
  }

  /// How many `IDAT` chunks the run has had so far.
  #[inline]
  #[must_use]
  pub const fn chunks(&self) -> u32 {
    self.chunks
  }

  /// Total data length of those chunks.
  #[inline]
  #[must_use]
  pub const fn compressed_len(&self) -> u64 {
    self.bytes
  }

  /// Reads compressed bytes from the run. Gives 0 at the end of the run.
  pub fn read(&mut self, buf: &mut [u8]) -> PngResult<usize> {
    if buf.is_empty() {
      return Ok(0);
    }
    loop {
      let available = &self.payload[self.pos..];
      if !available.is_empty() {
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        return Ok(n);
      }
      match self.state {
        RunState::Done(_) => return Ok(0),
        RunState::Pending(header) => self.load(header)?,
      }
    }
  }

  /// Reads one `IDAT` chunk's data and CRC, then the header after it.
  fn load(&mut self, header: ChunkHeader) -> PngResult<()> {
    trace!(len = header.len(), "IDAT");
    self.state = RunState::Done(None);
    self.cursor.begin(header);
    self.cursor.read_payload_to_end(&mut self.payload)?;
    self.pos = 0;
    let crc = self.cursor.finish_chunk()?;
    if !crc.is_valid() {
      self.payload.clear();
      return Err(PngLevelError::ImageDataCrcMismatch {
        declared: crc.declared,
        computed: crc.computed,
      });
    }
    self.chunks += 1;
    self.bytes += u64::from(header.len());
    self.state = match self.cursor.next_header()? {
      Some(next) if next.ty == ChunkTy::IDAT => RunState::Pending(next),
      other => RunState::Done(other),
    };
    Ok(())
  }

  /// Ends the run, giving back the header of the chunk that follows it.
  ///
  /// Any chunks left in the run are still read and CRC checked, and their
  /// data is discarded. Calling this again gives the same header.
  pub fn finish(&mut self) -> PngResult<Option<ChunkHeader>> {
    let mut leftover = 0_u64;
    loop {
      leftover += (self.payload.len() - self.pos) as u64;
      self.pos = self.payload.len();
      match self.state {
        RunState::Done(next) => {
          if leftover > 0 {
            debug!(leftover, "ignored bytes after the end of the zlib stream");
          }
          return Ok(next);
        }
        RunState::Pending(header) => self.load(header)?,
      }
    }
  }
}
