use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read a binary file using memory mapping for improved performance
/// This is more efficient for large files as it doesn't load the entire file into RAM
pub fn read_binary_file_mmap(path: impl AsRef<Path>) -> io::Result<Mmap> {
    let file = File::open(path)?;
    // Safety: The file is not modified while the mmap is active
    unsafe { Mmap::map(&file) }
}

/// Drain a reader into memory, for sources that cannot be mapped.
pub fn read_all<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}
