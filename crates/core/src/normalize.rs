use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::error::{PruneError, Result};
use crate::whitespace::strip_terminator;

const TAB_REPLACEMENT: &[u8] = b"    ";

static TAB_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+").expect("tab run pattern is valid"));

/// Replaces each run of tabs with four spaces and strips trailing blanks.
pub fn normalize_line(line: &[u8]) -> Vec<u8> {
    let trimmed = trim_trailing(line);
    TAB_RUN.replace_all(trimmed, TAB_REPLACEMENT).into_owned()
}

fn trim_trailing(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|byte| !matches!(byte, b' ' | b'\t' | b'\x0C' | b'\r'))
        .map_or(0, |index| index + 1);
    &line[..end]
}

/// Copies `reader` to `writer` one normalized line at a time, terminating
/// every line (the last one included) with a single `\n`.
pub fn write_normalized<R: BufRead, W: Write>(mut reader: R, mut writer: W) -> io::Result<u64> {
    let mut line = Vec::new();
    let mut lines = 0_u64;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        writer.write_all(&normalize_line(strip_terminator(&line)))?;
        writer.write_all(b"\n")?;
        lines += 1;
    }
    writer.flush()?;
    Ok(lines)
}

/// Sibling scratch path: `<dir>/.<name>_tmp`.
pub fn temp_path_for(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(name);
    temp_name.push("_tmp");
    Some(match path.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    })
}

/// Rewrites `path` through a sibling temp file that is renamed over the
/// original only once it is fully written and synced.
pub fn rewrite_in_place(path: &Path) -> Result<u64> {
    let temp_path = temp_path_for(path).ok_or_else(|| {
        PruneError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;

    let source = File::open(path).map_err(|err| PruneError::io(path, err))?;
    let permissions = source
        .metadata()
        .map_err(|err| PruneError::io(path, err))?
        .permissions();

    let lines = match write_temp(BufReader::new(source), &temp_path, permissions) {
        Ok(lines) => lines,
        Err(err) => {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }
    };

    if let Err(source) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(PruneError::Rename {
            from: temp_path,
            to: path.to_path_buf(),
            source,
        });
    }

    Ok(lines)
}

fn write_temp<R: BufRead>(
    reader: R,
    temp_path: &Path,
    permissions: fs::Permissions,
) -> Result<u64> {
    let io_err = |err: io::Error| PruneError::io(temp_path, err);

    let temp = File::create(temp_path).map_err(io_err)?;
    let mut writer = BufWriter::new(temp);
    let lines = write_normalized(reader, &mut writer).map_err(io_err)?;
    let temp = writer
        .into_inner()
        .map_err(|err| io_err(err.into_error()))?;
    temp.sync_all().map_err(io_err)?;
    fs::set_permissions(temp_path, permissions).map_err(io_err)?;
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;
    use std::path::{Path, PathBuf};

    use super::{normalize_line, rewrite_in_place, temp_path_for, write_normalized};
    use crate::whitespace::contains_bad_whitespace;

    fn normalize(content: &str) -> String {
        let mut out = Vec::new();
        write_normalized(Cursor::new(content), &mut out).expect("normalize");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn tab_runs_collapse_to_four_spaces() {
        assert_eq!(normalize_line(b"a\t\tb"), b"a    b");
        assert_eq!(normalize_line(b"\t\t\tx\ty"), b"    x    y");
    }

    #[test]
    fn trailing_blanks_are_stripped() {
        assert_eq!(normalize_line(b"line1   "), b"line1");
        assert_eq!(normalize_line(b"code \t\x0C\r"), b"code");
        assert_eq!(normalize_line(b"   "), b"");
    }

    #[test]
    fn every_line_gets_one_terminator() {
        assert_eq!(normalize("a\r\nb\r\n"), "a\nb\n");
        assert_eq!(normalize("no newline at end  "), "no newline at end\n");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("\n\n"), "\n\n");
    }

    #[test]
    fn normalizing_twice_is_a_fixed_point() {
        let once = normalize("x\t\ty  \n\tz\r\nlast \t");
        assert!(!contains_bad_whitespace(Cursor::new(once.as_str())).expect("scan"));
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn line_count_and_content_are_preserved() {
        let input = "alpha\t beta  \n gamma\n\ndelta\t";
        let mut out = Vec::new();
        let lines = write_normalized(Cursor::new(input), &mut out).expect("normalize");
        assert_eq!(lines, 4);

        let output = String::from_utf8(out).expect("utf8");
        let words = |text: &str| text.split_whitespace().map(str::to_string).collect::<Vec<_>>();
        assert_eq!(words(input), words(&output));
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn temp_path_is_a_hidden_sibling() {
        assert_eq!(
            temp_path_for(Path::new("src/main.c")),
            Some(PathBuf::from("src/.main.c_tmp"))
        );
        assert_eq!(
            temp_path_for(Path::new("main.c")),
            Some(PathBuf::from(".main.c_tmp"))
        );
        assert_eq!(temp_path_for(Path::new("/")), None);
    }

    #[test]
    fn rewrite_replaces_content_and_leaves_no_temp() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("notes.txt");
        fs::write(&file, "line1   \nline2\n").expect("write");

        let lines = rewrite_in_place(&file).expect("rewrite");

        assert_eq!(lines, 2);
        assert_eq!(fs::read_to_string(&file).expect("read"), "line1\nline2\n");
        assert!(!dir.path().join(".notes.txt_tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_keeps_permission_bits() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\n\techo hi\n").expect("write");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");

        rewrite_in_place(&script).expect("rewrite");

        let mode = fs::metadata(&script).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
        assert_eq!(
            fs::read_to_string(&script).expect("read"),
            "#!/bin/sh\n    echo hi\n"
        );
    }

    #[test]
    fn rewrite_of_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(rewrite_in_place(&dir.path().join("gone.txt")).is_err());
        assert!(!dir.path().join(".gone.txt_tmp").exists());
    }
}
