//! Memory-mapped readers for Fortran unformatted record streams.

use crate::{Error, Result};
use cerhist_core::record::{Record, RECORD_ELEMENT_MULTIPLE};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A memory-mapped file reader.
///
/// Uses memmap2 to access file contents without loading the entire file
/// into memory. The mapping is released when the reader is dropped.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

/// Sequential reader over the Fortran unformatted records of a CORSIKA
/// Cherenkov output file.
///
/// Each record is framed by a 4-byte little-endian length prefix and an
/// identical suffix, with a payload of 32-bit floats. The cursor only moves
/// forward; there is no seeking and no buffering beyond the current record.
pub struct RecordReader {
    reader: MappedFileReader,
    offset: usize,
    records_read: usize,
}

impl RecordReader {
    /// Opens a CORSIKA output file for sequential record reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            reader: MappedFileReader::open(path)?,
            offset: 0,
            records_read: 0,
        })
    }

    /// The path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.reader.path
    }

    /// Records successfully read so far.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Reads the next record, or `Ok(None)` at a clean end of the stream.
    ///
    /// # Errors
    /// Returns [`Error::MalformedRecord`] on framing violations: a truncated
    /// record, disagreeing length markers, a payload that is not whole
    /// 32-bit words, or an element count that does not fill 21 sub-blocks of
    /// 7-column rows.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let data = self.reader.as_bytes();
        if self.offset == data.len() {
            return Ok(None);
        }
        let index = self.records_read + 1;

        let byte_len = self
            .read_marker(self.offset)
            .ok_or_else(|| malformed(index, "truncated length prefix"))?;
        let payload_start = self.offset + 4;
        let payload_end = payload_start + byte_len;

        if byte_len == 0 || !byte_len.is_multiple_of(4) {
            return Err(malformed(
                index,
                format!("payload of {byte_len} bytes is not whole 32-bit words"),
            ));
        }
        if payload_end + 4 > data.len() {
            return Err(malformed(
                index,
                format!("payload of {byte_len} bytes runs past the end of the file"),
            ));
        }
        let suffix = self
            .read_marker(payload_end)
            .ok_or_else(|| malformed(index, "truncated length suffix"))?;
        if suffix != byte_len {
            return Err(malformed(
                index,
                format!("length suffix {suffix} disagrees with prefix {byte_len}"),
            ));
        }

        let count = byte_len / 4;
        if !count.is_multiple_of(RECORD_ELEMENT_MULTIPLE) {
            return Err(malformed(
                index,
                format!("element count {count} is not a multiple of {RECORD_ELEMENT_MULTIPLE}"),
            ));
        }

        // chunks_exact(4) guarantees each chunk converts; the unwrap cannot
        // fire.
        let elements: Vec<f32> = data[payload_start..payload_end]
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
            .collect();

        let record = Record::from_elements(elements)?;
        self.offset = payload_end + 4;
        self.records_read += 1;
        Ok(Some(record))
    }

    fn read_marker(&self, offset: usize) -> Option<usize> {
        let bytes: [u8; 4] = self
            .reader
            .as_bytes()
            .get(offset..offset + 4)?
            .try_into()
            .ok()?;
        Some(u32::from_le_bytes(bytes) as usize)
    }
}

fn malformed(record: usize, reason: impl Into<String>) -> Error {
    Error::MalformedRecord {
        record,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_record(out: &mut impl Write, elements: &[f32]) {
        let byte_len = u32::try_from(elements.len() * 4).unwrap();
        out.write_all(&byte_len.to_le_bytes()).unwrap();
        for value in elements {
            out.write_all(&value.to_le_bytes()).unwrap();
        }
        out.write_all(&byte_len.to_le_bytes()).unwrap();
    }

    #[test]
    fn test_mapped_file_reader() {
        let mut file = NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..64).collect();
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        let reader = MappedFileReader::open(file.path()).unwrap();
        assert_eq!(reader.len(), 64);
        assert!(!reader.is_empty());
        assert_eq!(reader.as_bytes(), &data[..]);
    }

    #[test]
    fn test_reads_records_then_clean_eof() {
        let mut file = NamedTempFile::new().unwrap();
        write_record(file.as_file_mut(), &[1.0; RECORD_ELEMENT_MULTIPLE]);
        write_record(file.as_file_mut(), &[2.0; RECORD_ELEMENT_MULTIPLE * 2]);
        file.flush().unwrap();

        let mut reader = RecordReader::open(file.path()).unwrap();
        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(first.rows(), 21);
        let second = reader.next_record().unwrap().unwrap();
        assert_eq!(second.rows(), 42);
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.records_read(), 2);
    }

    #[test]
    fn test_empty_file_is_clean_eof() {
        let file = NamedTempFile::new().unwrap();
        let mut reader = RecordReader::open(file.path()).unwrap();
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_rejects_bad_element_count() {
        let mut file = NamedTempFile::new().unwrap();
        write_record(file.as_file_mut(), &[1.0; 140]); // divisible by 7, not by 147
        file.flush().unwrap();

        let mut reader = RecordReader::open(file.path()).unwrap();
        assert!(matches!(
            reader.next_record(),
            Err(Error::MalformedRecord { record: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_disagreeing_markers() {
        let mut file = NamedTempFile::new().unwrap();
        let byte_len = u32::try_from(RECORD_ELEMENT_MULTIPLE * 4).unwrap();
        file.write_all(&byte_len.to_le_bytes()).unwrap();
        for _ in 0..RECORD_ELEMENT_MULTIPLE {
            file.write_all(&1.0f32.to_le_bytes()).unwrap();
        }
        file.write_all(&(byte_len + 4).to_le_bytes()).unwrap();
        file.flush().unwrap();

        let mut reader = RecordReader::open(file.path()).unwrap();
        assert!(matches!(
            reader.next_record(),
            Err(Error::MalformedRecord { record: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_truncated_payload() {
        let mut file = NamedTempFile::new().unwrap();
        let byte_len = u32::try_from(RECORD_ELEMENT_MULTIPLE * 4).unwrap();
        file.write_all(&byte_len.to_le_bytes()).unwrap();
        file.write_all(&1.0f32.to_le_bytes()).unwrap(); // then nothing
        file.flush().unwrap();

        let mut reader = RecordReader::open(file.path()).unwrap();
        assert!(matches!(
            reader.next_record(),
            Err(Error::MalformedRecord { record: 1, .. })
        ));
    }
}
