use anyhow::Result;
use rowbeam::testing::CsvFixture;
use rowbeam::{IngestError, LineSource};
use std::io::{self, BufReader, Cursor, Read};

fn collect(source: LineSource<'_>) -> Result<Vec<String>> {
    Ok(source.collect::<Result<Vec<_>, _>>()?)
}

#[test]
fn skips_blank_lines_and_trims() -> Result<()> {
    let text = "  a,b  \n\n   \r\n1,2\r\n\t\n3,4";
    let source = LineSource::from_reader(Box::new(Cursor::new(text)), "inline");
    assert_eq!(collect(source)?, vec!["a,b", "1,2", "3,4"]);
    Ok(())
}

#[test]
fn strips_leading_byte_order_mark() -> Result<()> {
    let fx = CsvFixture::new("")?;
    fx.write_bytes("\u{feff}name.firstName,age\nJane,30\n".as_bytes())?;
    let lines = collect(LineSource::open(fx.input())?)?;
    assert_eq!(lines, vec!["name.firstName,age", "Jane,30"]);
    Ok(())
}

#[test]
fn line_numbers_count_blank_lines() -> Result<()> {
    let mut source = LineSource::from_reader(Box::new(Cursor::new("\n\nh\n\nr\n")), "inline");
    assert_eq!(source.next().transpose()?.as_deref(), Some("h"));
    assert_eq!(source.line_no(), 3);
    assert_eq!(source.next().transpose()?.as_deref(), Some("r"));
    assert_eq!(source.line_no(), 5);
    assert!(source.next().is_none());
    Ok(())
}

#[test]
fn every_open_starts_a_fresh_pass() -> Result<()> {
    let fx = CsvFixture::new("h")?.row("r1").row("r2").write()?;
    let first = collect(LineSource::open(fx.input())?)?;
    let second = collect(LineSource::open(fx.input())?)?;
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let err = LineSource::open(tmp.path().join("absent.csv"))
        .err()
        .expect("open should fail");
    assert!(matches!(err, IngestError::Io { .. }));
    assert!(err.to_string().contains("absent.csv"), "{err}");
}

#[test]
fn invalid_utf8_is_replaced_not_fatal() -> Result<()> {
    let bytes: &[u8] = b"name.firstName,age\nJos\xe9,40\nAnn,50\n";
    let source = LineSource::from_reader(Box::new(BufReader::new(bytes)), "inline");
    assert_eq!(
        collect(source)?,
        vec!["name.firstName,age", "Jos\u{fffd},40", "Ann,50"]
    );
    Ok(())
}

#[test]
fn lone_carriage_return_ends_a_line() -> Result<()> {
    let source = LineSource::from_reader(Box::new(Cursor::new("h\rr1\rr2\r")), "inline");
    assert_eq!(collect(source)?, vec!["h", "r1", "r2"]);
    Ok(())
}

#[test]
fn mixed_terminators_count_one_line_each() -> Result<()> {
    let mut source = LineSource::from_reader(Box::new(Cursor::new("a\r\nb\rc\n\r\nd")), "inline");
    assert_eq!(source.next().transpose()?.as_deref(), Some("a"));
    assert_eq!(source.line_no(), 1);
    assert_eq!(source.next().transpose()?.as_deref(), Some("b"));
    assert_eq!(source.line_no(), 2);
    assert_eq!(source.next().transpose()?.as_deref(), Some("c"));
    assert_eq!(source.line_no(), 3);
    assert_eq!(source.next().transpose()?.as_deref(), Some("d"));
    assert_eq!(source.line_no(), 5);
    assert!(source.next().is_none());
    Ok(())
}

#[test]
fn crlf_split_across_reads_is_one_terminator() -> Result<()> {
    // a one-byte buffer puts the \r and \n of each pair in separate reads
    let reader = BufReader::with_capacity(1, Cursor::new("h\r\nr1\r\nr2"));
    let mut source = LineSource::from_reader(Box::new(reader), "inline");
    let mut lines = Vec::new();
    for line in source.by_ref() {
        lines.push(line?);
    }
    assert_eq!(lines, vec!["h", "r1", "r2"]);
    assert_eq!(source.line_no(), 3);
    Ok(())
}

/// Yields `head`, then fails every read after it.
struct BrokenAfter {
    head: Cursor<&'static [u8]>,
}

impl Read for BrokenAfter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.head.read(buf)? {
            0 => Err(io::Error::other("device gone")),
            n => Ok(n),
        }
    }
}

#[test]
fn read_failure_ends_the_sequence_with_an_error() {
    let reader = BufReader::new(BrokenAfter {
        head: Cursor::new(&b"ok\n"[..]),
    });
    let mut source = LineSource::from_reader(Box::new(reader), "inline");
    assert_eq!(source.next().and_then(Result::ok).as_deref(), Some("ok"));
    match source.next() {
        Some(Err(err @ IngestError::Io { .. })) => {
            assert!(err.to_string().contains("read line 2 in inline"), "{err}");
        }
        other => panic!("expected a read error, got {other:?}"),
    }
    assert!(source.next().is_none());
}

#[cfg(feature = "compression-gzip")]
mod gzip {
    use super::collect;
    use anyhow::Result;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use rowbeam::testing::CsvFixture;
    use rowbeam::LineSource;
    use std::io::Write;

    fn gzip(text: &str) -> Result<Vec<u8>> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(text.as_bytes())?;
        Ok(enc.finish()?)
    }

    #[test]
    fn reads_gzip_by_extension() -> Result<()> {
        let fx = CsvFixture::new("")?.file_name("people.csv.gz");
        fx.write_bytes(&gzip("age\n30\n\n41\n")?)?;
        assert_eq!(collect(LineSource::open(fx.input())?)?, vec!["age", "30", "41"]);
        Ok(())
    }

    #[test]
    fn reads_gzip_by_magic_bytes() -> Result<()> {
        let fx = CsvFixture::new("")?;
        fx.write_bytes(&gzip("age\n30\n")?)?;
        assert_eq!(collect(LineSource::open(fx.input())?)?, vec!["age", "30"]);
        Ok(())
    }
}
