use std::io::{self, Read};

/// Reads until `buf` is full or the source hits end of input.
///
/// Returns how many bytes were placed in `buf`, so a short count means the
/// source ended. `Interrupted` reads are retried.
pub(crate) fn read_until_full<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
  let mut filled = 0;
  while filled < buf.len() {
    match source.read(&mut buf[filled..]) {
      Ok(0) => break,
      Ok(n) => filled += n,
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      Err(e) => return Err(e),
    }
  }
  Ok(filled)
}

/// Does one read, retrying only on `Interrupted`.
pub(crate) fn read_some<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
  loop {
    match source.read(buf) {
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      other => return other,
    }
  }
}
