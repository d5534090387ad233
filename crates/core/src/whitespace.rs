use std::io::{self, BufRead};

use once_cell::sync::Lazy;
use regex::bytes::Regex;

static TRAILING_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\x0C\r]+$").expect("trailing whitespace pattern is valid"));

/// True when the line (without its `\n`) ends in blanks or holds a tab anywhere.
pub fn line_has_bad_whitespace(line: &[u8]) -> bool {
    line.contains(&b'\t') || TRAILING_WHITESPACE.is_match(line)
}

/// Streams `reader` line by line and stops at the first offending line.
pub fn contains_bad_whitespace<R: BufRead>(mut reader: R) -> io::Result<bool> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(false);
        }
        if line_has_bad_whitespace(strip_terminator(&line)) {
            return Ok(true);
        }
    }
}

pub(crate) fn strip_terminator(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\n").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use std::io::{self, BufRead, Cursor, Read};

    use super::{contains_bad_whitespace, line_has_bad_whitespace};

    #[test]
    fn flags_trailing_blanks_of_every_kind() {
        assert!(line_has_bad_whitespace(b"code   "));
        assert!(line_has_bad_whitespace(b"code\x0C"));
        assert!(line_has_bad_whitespace(b"code\r"));
        assert!(!line_has_bad_whitespace(b"code"));
        assert!(!line_has_bad_whitespace(b""));
        assert!(!line_has_bad_whitespace(b"  indented"));
    }

    #[test]
    fn any_tab_is_bad_even_mid_line() {
        assert!(line_has_bad_whitespace(b"a\tb"));
        assert!(line_has_bad_whitespace(b"\tindented"));
    }

    #[test]
    fn clean_content_passes() {
        let content = "fn main() {\n    println!(\"hi\");\n}\n";
        assert!(!contains_bad_whitespace(Cursor::new(content)).expect("scan"));
        assert!(!contains_bad_whitespace(Cursor::new("")).expect("scan"));
    }

    #[test]
    fn detects_dirty_line_and_crlf() {
        assert!(contains_bad_whitespace(Cursor::new("ok\nbad  \nok\n")).expect("scan"));
        assert!(contains_bad_whitespace(Cursor::new("dos\r\n")).expect("scan"));
        assert!(contains_bad_whitespace(Cursor::new("last line \t")).expect("scan"));
    }

    /// Fails the test if the scanner reads past the first dirty line.
    struct Tripwire<R> {
        inner: R,
        limit: usize,
        consumed: usize,
    }

    impl<R: Read> Read for Tripwire<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl<R: BufRead> BufRead for Tripwire<R> {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            if self.consumed >= self.limit {
                panic!("scanner read past the first dirty line");
            }
            self.inner.fill_buf()
        }

        fn consume(&mut self, amt: usize) {
            self.consumed += amt;
            self.inner.consume(amt);
        }
    }

    #[test]
    fn stops_at_first_match() {
        let content = "dirty\t\nclean\n";
        let reader = Tripwire {
            inner: Cursor::new(content),
            limit: "dirty\t\n".len(),
            consumed: 0,
        };
        assert!(contains_bad_whitespace(reader).expect("scan"));
    }
}
