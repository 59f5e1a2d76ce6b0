use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::num::NonZeroUsize;
use std::path::Path;

// Upper bound on up-front allocation per batch; larger chunks grow on demand.
const PREALLOC_LIMIT: usize = 64 * 1024;

/// A contiguous run of raw lines from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 0-based position of the batch in the stream.
    pub index: usize,
    /// 1-based line number of `lines[0]`.
    pub first_line: u64,
    pub lines: Vec<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines paired with their 1-based line numbers.
    pub fn numbered(&self) -> impl Iterator<Item = (u64, &str)> {
        (self.first_line..).zip(self.lines.iter().map(String::as_str))
    }
}

/// Pulls at most `chunk_size` lines per batch from `reader`.
///
/// The sequence is finite and cannot be restarted. The reader is dropped as
/// soon as it reports end of input or an error. When a read fails part way
/// through a batch, the lines read so far are yielded first and the error on
/// the following call.
pub struct LineChunks<R> {
    reader: Option<R>,
    chunk_size: NonZeroUsize,
    next_line: u64,
    next_index: usize,
    pending_error: Option<std::io::Error>,
}

impl<R: BufRead> LineChunks<R> {
    pub fn new(reader: R, chunk_size: NonZeroUsize) -> Self {
        Self {
            reader: Some(reader),
            chunk_size,
            next_line: 1,
            next_index: 0,
            pending_error: None,
        }
    }
}

/// Opens `path` for chunked reading.
pub fn open_lines(
    path: impl AsRef<Path>,
    chunk_size: NonZeroUsize,
) -> Result<LineChunks<BufReader<File>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    Ok(LineChunks::new(BufReader::new(file), chunk_size))
}

impl<R: BufRead> Iterator for LineChunks<R> {
    type Item = std::io::Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending_error.take() {
            return Some(Err(err));
        }
        let reader = self.reader.as_mut()?;

        let mut lines = Vec::with_capacity(self.chunk_size.get().min(PREALLOC_LIMIT));
        let mut exhausted = false;
        let mut buf = Vec::new();
        while lines.len() < self.chunk_size.get() {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => {
                    exhausted = true;
                    break;
                }
                Ok(_) => lines.push(decode_line(&buf)),
                Err(err) => {
                    exhausted = true;
                    self.pending_error = Some(err);
                    break;
                }
            }
        }
        if exhausted {
            self.reader = None;
        }

        if lines.is_empty() {
            return self.pending_error.take().map(Err);
        }

        let batch = Batch {
            index: self.next_index,
            first_line: self.next_line,
            lines,
        };
        self.next_index += 1;
        self.next_line += batch.lines.len() as u64;
        Some(Ok(batch))
    }
}

// Invalid UTF-8 is replaced so it surfaces later as a malformed record.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Returns `data`, then fails every later read.
#[cfg(test)]
pub(crate) struct FailingReader {
    data: std::io::Cursor<Vec<u8>>,
}

#[cfg(test)]
impl FailingReader {
    pub(crate) fn new(data: &[u8]) -> Self {
        Self {
            data: std::io::Cursor::new(data.to_vec()),
        }
    }
}

#[cfg(test)]
impl std::io::Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match std::io::Read::read(&mut self.data, buf)? {
            0 => Err(std::io::Error::other("disk gone")),
            n => Ok(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn chunk(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_batches_partition_input() {
        let input = Cursor::new("0 1\n1 2\n2 3\n3 4\n4 5\n");
        let batches = LineChunks::new(input, chunk(2))
            .collect::<std::io::Result<Vec<_>>>()
            .unwrap();

        assert_eq!(3, batches.len());
        assert_eq!(vec!["0 1", "1 2"], batches[0].lines);
        assert_eq!(vec!["2 3", "3 4"], batches[1].lines);
        assert_eq!(vec!["4 5"], batches[2].lines);
        assert_eq!(
            vec![(0, 1), (1, 3), (2, 5)],
            batches
                .iter()
                .map(|b| (b.index, b.first_line))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_exact_multiple_has_no_empty_batch() {
        let input = Cursor::new("a\nb\nc\nd\n");
        let batches = LineChunks::new(input, chunk(2)).count();
        assert_eq!(2, batches);
    }

    #[test]
    fn test_empty_input() {
        let mut chunks = LineChunks::new(Cursor::new(""), chunk(3));
        assert!(chunks.next().is_none());
        assert!(chunks.next().is_none());
    }

    #[test]
    fn test_missing_trailing_newline_and_crlf() {
        let input = Cursor::new("0 1\r\n2 3");
        let batch = LineChunks::new(input, chunk(10)).next().unwrap().unwrap();
        assert_eq!(vec!["0 1", "2 3"], batch.lines);
        assert_eq!(
            vec![(1, "0 1"), (2, "2 3")],
            batch.numbered().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_invalid_utf8_is_kept_as_a_line() {
        let input = Cursor::new(b"0 1\n\xff 2\n".to_vec());
        let batch = LineChunks::new(input, chunk(10)).next().unwrap().unwrap();
        assert_eq!(2, batch.len());
        assert!(batch.lines[1].contains('\u{fffd}'));
    }

    #[test]
    fn test_partial_batch_before_error() {
        let reader = BufReader::new(FailingReader::new(b"0 1\n1 2\n2 3\n"));
        let mut chunks = LineChunks::new(reader, chunk(2));

        assert_eq!(vec!["0 1", "1 2"], chunks.next().unwrap().unwrap().lines);
        assert_eq!(vec!["2 3"], chunks.next().unwrap().unwrap().lines);
        assert!(chunks.next().unwrap().is_err());
        assert!(chunks.next().is_none());
    }

    #[test]
    fn test_open_missing_file() {
        let result = open_lines("/definitely/not/here.txt", chunk(1));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
