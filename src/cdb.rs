use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;
use winnow::binary::le_u32;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

use crate::error::{Error, Result};

/// Size of the fixed hash table at the start of a cdb file
/// (256 pairs of 32-bit words). Its first word is the offset at which the
/// record region ends.
const HEADER_SIZE: usize = 256 * 2 * 4;

/// One record of a cdb file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdbRecord<'a> {
    /// Record key, `name-version` for portage caches.
    pub key: &'a [u8],
    /// Record data, a pickled metadata dictionary for portage caches.
    pub data: &'a [u8],
}

impl CdbRecord<'_> {
    /// The key as text; invalid UTF-8 is replaced.
    pub fn key_str(&self) -> String {
        String::from_utf8_lossy(self.key).into_owned()
    }
}

/// Forward-only reader over the records of a memory-mapped cdb file.
///
/// Opening never fails outright: if the file cannot be read the reader is
/// simply not [ready](Cdb::is_ready) and yields no records. Every length
/// field is checked against the record region before it is used; a record
/// that does not fit ends the iteration with an error.
///
/// The lookup hash tables at the end of the file are not used, records are
/// only read sequentially.
#[derive(Debug)]
pub struct Cdb {
    path: PathBuf,
    map: Option<Mmap>,
    records_end: usize,
    cursor: usize,
    failure: Option<Error>,
}

impl Cdb {
    /// Map `path` read-only.
    pub fn open(path: impl AsRef<Path>) -> Cdb {
        let path = path.as_ref().to_path_buf();
        match map_records(&path) {
            Ok((map, records_end)) => {
                debug!(path = %path.display(), records_end, "mapped cache file");
                Cdb {
                    path,
                    map: Some(map),
                    records_end,
                    cursor: HEADER_SIZE,
                    failure: None,
                }
            }
            Err(e) => Cdb {
                path,
                map: None,
                records_end: 0,
                cursor: 0,
                failure: Some(e),
            },
        }
    }

    /// `true` if the file was mapped and its header is sane.
    pub fn is_ready(&self) -> bool {
        self.map.is_some()
    }

    /// Why the file could not be opened, if it could not.
    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    /// Take the open failure out of the reader.
    pub fn take_failure(&mut self) -> Option<Error> {
        self.failure.take()
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` once every record has been read (always for a reader that is
    /// not ready).
    pub fn end(&self) -> bool {
        self.map.is_none() || self.cursor >= self.records_end
    }

    /// Read the record at the cursor and advance past it.
    ///
    /// Returns [`Error::CacheRecord`] if the record's lengths run past the
    /// record region; the reader is then positioned at the end.
    pub fn get(&mut self) -> Result<CdbRecord<'_>> {
        let Some(map) = self.map.as_ref() else {
            return Err(Error::CacheRecord {
                path: self.path.clone(),
                offset: self.cursor,
            });
        };
        let offset = self.cursor;
        let region = map.get(offset..self.records_end).unwrap_or_default();
        let mut input = region;
        match record.parse_next(&mut input) {
            Ok((key, data)) => {
                self.cursor = offset + (region.len() - input.len());
                Ok(CdbRecord { key, data })
            }
            Err(_) => {
                self.cursor = self.records_end;
                Err(Error::CacheRecord {
                    path: self.path.clone(),
                    offset,
                })
            }
        }
    }
}

impl Iterator for Cdb {
    type Item = Result<(String, Vec<u8>)>;

    /// Owned variant of [`Cdb::get`], for callers that keep records around.
    fn next(&mut self) -> Option<Self::Item> {
        if self.end() {
            return None;
        }
        Some(self.get().map(|r| (r.key_str(), r.data.to_vec())))
    }
}

fn record<'a>(input: &mut &'a [u8]) -> ModalResult<(&'a [u8], &'a [u8])> {
    let key_len = le_u32.parse_next(input)?;
    let data_len = le_u32.parse_next(input)?;
    let key = take(key_len as usize).parse_next(input)?;
    let data = take(data_len as usize).parse_next(input)?;
    Ok((key, data))
}

fn map_records(path: &Path) -> Result<(Mmap, usize)> {
    let open_error = |source| Error::CacheOpen {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_error)?;
    // SAFETY: the map is read-only; portage replaces cache files instead of
    // rewriting them in place.
    let map = unsafe { Mmap::map(&file) }.map_err(open_error)?;

    let header_error = |reason: String| Error::CacheHeader {
        path: path.to_path_buf(),
        reason,
    };
    if map.len() < HEADER_SIZE {
        return Err(header_error(format!(
            "file has {} bytes, header needs {HEADER_SIZE}",
            map.len()
        )));
    }
    let mut header = &map[..4];
    let records_end = le_u32
        .parse_next(&mut header)
        .map_err(|e: ErrMode<ContextError>| header_error(e.to_string()))? as usize;
    if records_end < HEADER_SIZE || records_end > map.len() {
        return Err(header_error(format!(
            "record end {records_end} outside {HEADER_SIZE}..={}",
            map.len()
        )));
    }
    Ok((map, records_end))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    /// Build a cdb image with the given records and a dummy hash table.
    fn image(records: &[(&[u8], &[u8])]) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_SIZE];
        for (key, data) in records {
            out.extend_from_slice(&(key.len() as u32).to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(key);
            out.extend_from_slice(data);
        }
        let end = out.len() as u32;
        out[..4].copy_from_slice(&end.to_le_bytes());
        // hash tables live past the record region
        out.extend_from_slice(&[0xaa; 16]);
        out
    }

    fn write(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_all_records_in_order() {
        let file = write(&image(&[(b"vim-9.0", b"one"), (b"vim-9.1", b"")]));
        let mut cdb = Cdb::open(file.path());
        assert!(cdb.is_ready());
        assert!(cdb.failure().is_none());

        let first = cdb.get().unwrap();
        assert_eq!(first.key_str(), "vim-9.0");
        assert_eq!(first.data, b"one");
        assert!(!cdb.end());

        let second = cdb.get().unwrap();
        assert_eq!(second.key, b"vim-9.1");
        assert!(second.data.is_empty());
        assert!(cdb.end());
    }

    #[test]
    fn empty_record_region() {
        let file = write(&image(&[]));
        let cdb = Cdb::open(file.path());
        assert!(cdb.is_ready());
        assert!(cdb.end());
    }

    #[test]
    fn iterator_yields_owned_records() {
        let file = write(&image(&[(b"a-1", b"x"), (b"b-2", b"yz")]));
        let records: Vec<(String, Vec<u8>)> =
            Cdb::open(file.path()).map(|r| r.unwrap()).collect();
        assert_eq!(
            records,
            vec![
                ("a-1".to_string(), b"x".to_vec()),
                ("b-2".to_string(), b"yz".to_vec())
            ]
        );
    }

    #[test]
    fn missing_file_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let mut cdb = Cdb::open(dir.path().join("nope.cdb"));
        assert!(!cdb.is_ready());
        assert!(cdb.end());
        assert!(matches!(cdb.failure(), Some(Error::CacheOpen { .. })));
        assert!(cdb.get().is_err());
        assert_eq!(cdb.next().map(|r| r.is_ok()), None);
    }

    #[test]
    fn short_file_is_not_ready() {
        let file = write(&[0u8; 100]);
        let mut cdb = Cdb::open(file.path());
        assert!(!cdb.is_ready());
        assert!(matches!(cdb.take_failure(), Some(Error::CacheHeader { .. })));
        assert!(cdb.failure().is_none());
    }

    #[test]
    fn record_end_past_file_is_not_ready() {
        let mut bytes = image(&[(b"a-1", b"x")]);
        bytes[..4].copy_from_slice(&u32::MAX.to_le_bytes());
        let file = write(&bytes);
        assert!(!Cdb::open(file.path()).is_ready());
    }

    #[test]
    fn oversized_length_is_rejected() {
        let mut bytes = image(&[(b"a-1", b"x"), (b"b-2", b"y")]);
        // data length of the first record claims far more than is there
        bytes[HEADER_SIZE + 4..HEADER_SIZE + 8].copy_from_slice(&1_000_000u32.to_le_bytes());
        let file = write(&bytes);
        let mut cdb = Cdb::open(file.path());
        assert!(cdb.is_ready());
        match cdb.get() {
            Err(Error::CacheRecord { offset, .. }) => assert_eq!(offset, HEADER_SIZE),
            other => panic!("expected a record error, got {other:?}"),
        }
        assert!(cdb.end());
    }

    #[test]
    fn record_crossing_region_end_is_rejected() {
        let mut bytes = image(&[(b"a-1", b"xyz")]);
        // shrink the region so the record no longer fits, the file still does
        let end = (HEADER_SIZE + 8 + 3) as u32;
        bytes[..4].copy_from_slice(&end.to_le_bytes());
        let file = write(&bytes);
        let mut cdb = Cdb::open(file.path());
        assert!(cdb.get().is_err());
        assert!(cdb.end());
    }
}
