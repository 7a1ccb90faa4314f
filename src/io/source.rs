use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

/// Where the bytes of a package archive come from.
///
/// `zip::ZipArchive` needs `Read + Seek`; this unifies an on-disk file with
/// an in-memory buffer behind one concrete type.
#[derive(Debug)]
pub enum PackageSource {
    File(BufReader<File>),
    Memory(Cursor<Vec<u8>>),
}

impl PackageSource {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::File(BufReader::new(File::open(path)?)))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::Memory(Cursor::new(bytes))
    }
}

impl Read for PackageSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::File(f) => f.read(buf),
            Self::Memory(c) => c.read(buf),
        }
    }
}

impl Seek for PackageSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::File(f) => f.seek(pos),
            Self::Memory(c) => c.seek(pos),
        }
    }
}
