//! External tabular tool used to read headers and columns and to perform
//! the final column projection.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::columns::ColumnSpec;
use crate::{Error, Result};

/// Operations the selection engine needs from a tabular-data tool.
pub trait TableTool {
    /// Header row of `source`.
    fn get_headers(&self, source: &Path, delimiter: char) -> Result<Vec<String>>;

    /// Values of `column` in `source`, header excluded.
    fn select_column_values(
        &self,
        source: &Path,
        column: &str,
        delimiter: char,
    ) -> Result<Vec<String>>;

    /// Write the columns named by `spec` from `source` to `destination`.
    fn extract_columns(
        &self,
        source: &Path,
        spec: &ColumnSpec,
        delimiter: char,
        destination: &Path,
    ) -> Result<()>;
}

/// [`TableTool`] backed by the `xsv` command-line program.
#[derive(Debug, Clone)]
pub struct Xsv {
    program: PathBuf,
}

impl Xsv {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run the program with `args`, returning stdout on success.
    fn exec<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        debug!(command = ?cmd, "running tabular tool");

        let program = self.program.display().to_string();
        let output = cmd.output().map_err(|e| Error::ExternalTool {
            program: program.clone(),
            status: "could not start".to_string(),
            stderr: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(Error::ExternalTool {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for Xsv {
    fn default() -> Self {
        Self::new("xsv")
    }
}

impl TableTool for Xsv {
    fn get_headers(&self, source: &Path, delimiter: char) -> Result<Vec<String>> {
        let delimiter = delimiter.to_string();
        let stdout = self.exec([
            OsStr::new("headers"),
            OsStr::new("-j"),
            OsStr::new("-d"),
            OsStr::new(&delimiter),
            source.as_os_str(),
        ])?;
        Ok(stdout.lines().map(str::to_string).collect())
    }

    fn select_column_values(
        &self,
        source: &Path,
        column: &str,
        delimiter: char,
    ) -> Result<Vec<String>> {
        let delimiter = delimiter.to_string();
        let selector = quote_selector(column);
        let stdout = self.exec([
            OsStr::new("select"),
            OsStr::new("-d"),
            OsStr::new(&delimiter),
            OsStr::new(&selector),
            source.as_os_str(),
        ])?;
        // xsv writes comma-separated output whatever the input delimiter
        let mut reader = csv::Reader::from_reader(stdout.as_bytes());
        let mut values = Vec::new();
        for record in reader.records() {
            let record = record?;
            values.push(record.get(0).unwrap_or_default().to_string());
        }
        Ok(values)
    }

    fn extract_columns(
        &self,
        source: &Path,
        spec: &ColumnSpec,
        delimiter: char,
        destination: &Path,
    ) -> Result<()> {
        let delimiter = delimiter.to_string();
        let spec = spec.to_string();
        self.exec([
            OsStr::new("select"),
            OsStr::new("-d"),
            OsStr::new(&delimiter),
            OsStr::new(&spec),
            source.as_os_str(),
            OsStr::new("-o"),
            destination.as_os_str(),
        ])?;
        Ok(())
    }
}

/// Quote a column name so the selector reads it as a name, never as an
/// index or range.
fn quote_selector(column: &str) -> String {
    format!("\"{}\"", column.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::ColumnRef;
    use std::fs;
    use tempfile::TempDir;

    /// Write a stand-in for xsv that records its arguments in `args.txt`,
    /// writes `extracted` to any `-o` path and prints `stdout`.
    #[cfg(unix)]
    fn fake_xsv(dir: &Path, stdout: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-xsv");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\n\
                 dir=$(dirname \"$0\")\n\
                 printf '%s\\n' \"$@\" > \"$dir/args.txt\"\n\
                 prev=\n\
                 for arg in \"$@\"; do\n\
                 \x20 if [ \"$prev\" = \"-o\" ]; then printf 'extracted\\n' > \"$arg\"; fi\n\
                 \x20 prev=$arg\n\
                 done\n\
                 cat <<'OUT'\n\
                 {stdout}OUT\n"
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    fn recorded_args(dir: &Path) -> Vec<String> {
        fs::read_to_string(dir.join("args.txt"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_quote_selector() {
        assert_eq!(quote_selector("col1"), "\"col1\"");
        assert_eq!(quote_selector("1-4"), "\"1-4\"");
        assert_eq!(quote_selector("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_missing_program() {
        let tool = Xsv::new("/nonexistent/bin/xsv");
        let err = tool.get_headers(Path::new("data.csv"), ',').unwrap_err();
        assert!(matches!(
            &err,
            Error::ExternalTool { program, status, .. }
                if program == "/nonexistent/bin/xsv" && status == "could not start"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_captures_stderr() {
        // `sh headers ...` fails: the shell cannot open a script named "headers"
        let tool = Xsv::new("sh");
        let err = tool.get_headers(Path::new("data.csv"), ',').unwrap_err();
        match err {
            Error::ExternalTool { program, stderr, .. } => {
                assert_eq!(program, "sh");
                assert!(stderr.contains("headers"), "stderr was: {stderr}");
            }
            other => panic!("Expected ExternalTool, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_headers_command_line() {
        let tmp = TempDir::new().unwrap();
        let tool = Xsv::new(fake_xsv(tmp.path(), "id\ncol1\ncol 2\n"));
        let source = tmp.path().join("meta.csv");

        let headers = tool.get_headers(&source, ';').unwrap();

        assert_eq!(headers, vec!["id", "col1", "col 2"]);
        assert_eq!(
            recorded_args(tmp.path()),
            vec!["headers", "-j", "-d", ";", source.to_str().unwrap()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_column_values_with_embedded_newline() {
        let tmp = TempDir::new().unwrap();
        let tool = Xsv::new(fake_xsv(tmp.path(), "note\n\"a\nb\"\nc\n"));
        let source = tmp.path().join("meta.csv");

        let values = tool.select_column_values(&source, "note", ',').unwrap();

        assert_eq!(values, vec!["a\nb", "c"]);
        assert_eq!(
            recorded_args(tmp.path()),
            vec!["select", "-d", ",", "\"note\"", source.to_str().unwrap()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_column_values_unescape_quotes() {
        let tmp = TempDir::new().unwrap();
        let output = "col 4\n\"some,text\"\n\"say \"\"hi\"\"\"\nwow\n";
        let tool = Xsv::new(fake_xsv(tmp.path(), output));
        let source = tmp.path().join("meta.tsv");

        let values = tool.select_column_values(&source, "col 4", '\t').unwrap();

        assert_eq!(values, vec!["some,text", "say \"hi\"", "wow"]);
        assert_eq!(
            recorded_args(tmp.path()),
            vec!["select", "-d", "\t", "\"col 4\"", source.to_str().unwrap()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_command_line() {
        let tmp = TempDir::new().unwrap();
        let tool = Xsv::new(fake_xsv(tmp.path(), ""));
        let source = tmp.path().join("target.csv");
        let destination = tmp.path().join("out.csv");
        let spec = ColumnSpec::from_columns(&[
            ColumnRef::Position(2),
            ColumnRef::Position(4),
            ColumnRef::Position(5),
            ColumnRef::Position(6),
        ]);

        tool.extract_columns(&source, &spec, ',', &destination).unwrap();

        assert_eq!(
            recorded_args(tmp.path()),
            vec![
                "select",
                "-d",
                ",",
                "2,4-6",
                source.to_str().unwrap(),
                "-o",
                destination.to_str().unwrap(),
            ]
        );
        assert_eq!(fs::read_to_string(&destination).unwrap(), "extracted\n");
    }
}
