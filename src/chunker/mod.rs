use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// Read up to `max_len` bytes of `file` starting at `offset`.
/// Returns fewer bytes only at end of file.
pub fn read_chunk(file: &mut File, offset: u64, max_len: usize) -> io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; max_len];
    let mut filled = 0;

    // Read exactly max_len bytes (or until EOF)
    while filled < max_len {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break, // EOF
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    buf.truncate(filled);
    Ok(buf)
}

/// `Content-Range` value for a chunk of `len` bytes at `offset` in a `total`-byte upload.
pub fn content_range(offset: u64, len: usize, total: u64) -> String {
    if len == 0 {
        return format!("bytes */{}", total);
    }
    format!("bytes {}-{}/{}", offset, offset + len as u64 - 1, total)
}

/// Offset to resume from, given the `Range` header of a 308 reply.
///
/// `bytes=0-524287` means the first 524288 bytes were persisted. A missing
/// header means nothing was persisted.
pub fn resume_offset(range: Option<&str>) -> Option<u64> {
    let Some(range) = range else {
        return Some(0);
    };
    let (_, end) = range.trim().strip_prefix("bytes=")?.split_once('-')?;
    end.trim().parse::<u64>().ok().map(|last| last + 1)
}
