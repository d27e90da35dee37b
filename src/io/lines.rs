//! Pull-based line source.
//!
//! [`LineSource`] yields the trimmed, non-empty lines of an input file in
//! order. Blank lines never reach the caller, so they can become neither the
//! header nor a data row. Each call to [`LineSource::open`] starts a fresh
//! pass over the file.
//!
//! Lines end at `\n`, `\r\n` or a lone `\r`. Bytes that are not valid UTF-8
//! are replaced with U+FFFD rather than failing the read.

use crate::error::{IngestError, IngestResult};
use crate::io::compression::auto_detect_reader;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::warn;

const BOM: char = '\u{feff}';

/// Iterator over the meaningful lines of one input file.
///
/// A read failure is yielded once as an error, after which the sequence ends.
pub struct LineSource<'a> {
    path: PathBuf,
    reader: Option<Box<dyn BufRead + 'a>>,
    buf: Vec<u8>,
    after_cr: bool,
    line_no: usize,
}

impl LineSource<'static> {
    /// Open `path`, decompressing transparently when needed.
    ///
    /// # Errors
    /// Returns [`IngestError::Io`] if the file cannot be opened or its
    /// compression header cannot be read.
    pub fn open(path: impl AsRef<Path>) -> IngestResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| IngestError::io_at("open", path, e))?;
        let reader = auto_detect_reader(file, path)
            .map_err(|e| IngestError::io_at("setup decompression for", path, e))?;
        Ok(Self::from_reader(reader, path))
    }
}

impl<'a> LineSource<'a> {
    /// Read lines from an already-open stream. `label` names it in errors.
    pub fn from_reader(reader: Box<dyn BufRead + 'a>, label: impl Into<PathBuf>) -> Self {
        Self {
            path: label.into(),
            reader: Some(reader),
            buf: Vec::new(),
            after_cr: false,
            line_no: 0,
        }
    }

    /// One-based number of the last physical line read, blank lines included.
    #[must_use]
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

/// Read one physical line into `buf`, without its terminator.
///
/// `after_cr` carries a trailing `\r` across calls so the `\n` of a `\r\n`
/// pair is swallowed instead of producing an empty line. Returns `false` at
/// end of input.
fn read_physical_line(
    reader: &mut dyn BufRead,
    buf: &mut Vec<u8>,
    after_cr: &mut bool,
) -> std::io::Result<bool> {
    buf.clear();
    let mut read_any = false;
    loop {
        let (used, done) = {
            let available = match reader.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(read_any);
            }
            if std::mem::take(after_cr) && available[0] == b'\n' {
                (1, false)
            } else {
                read_any = true;
                match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                    Some(end) => {
                        *after_cr = available[end] == b'\r';
                        buf.extend_from_slice(&available[..end]);
                        (end + 1, true)
                    }
                    None => {
                        buf.extend_from_slice(available);
                        (available.len(), false)
                    }
                }
            }
        };
        reader.consume(used);
        if done {
            return Ok(true);
        }
    }
}

impl Iterator for LineSource<'_> {
    type Item = IngestResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;
        loop {
            match read_physical_line(&mut **reader, &mut self.buf, &mut self.after_cr) {
                Ok(true) => {}
                Ok(false) => {
                    self.reader = None;
                    return None;
                }
                Err(e) => {
                    self.reader = None;
                    return Some(Err(IngestError::io(
                        format!("read line {} in {}", self.line_no + 1, self.path.display()),
                        e,
                    )));
                }
            }
            self.line_no += 1;

            let decoded = String::from_utf8_lossy(&self.buf);
            if let Cow::Owned(_) = decoded {
                warn!(line = self.line_no, path = %self.path.display(), "invalid UTF-8 replaced");
            }
            let text = if self.line_no == 1 {
                decoded.trim_start_matches(BOM)
            } else {
                &*decoded
            };
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return Some(Ok(trimmed.to_string()));
            }
        }
    }
}
