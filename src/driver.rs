//! File driver around [`canonicalize`].
//!
//! Each unit of content is read completely before it is transformed. On
//! success the file is rewritten (or the result printed); on failure the
//! file is left alone, the error is recorded, and the batch moves on.
//! Check mode never writes anything.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::canonicalize::canonicalize;
use crate::error::{SortError, SortResult};
use crate::options::Options;

/// Where canonical output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Replace the file's contents
    #[default]
    InPlace,
    /// Write to the supplied writer, leaving files untouched
    Stdout,
}

/// What happened to one successfully processed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Already canonical; nothing written
    Unchanged,
    /// File rewritten with canonical content
    Rewritten,
    /// Canonical content written to the output stream
    Printed,
    /// Check mode: key order is canonical
    Sorted,
}

/// Outcome for one file of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    /// Path as given
    pub path: PathBuf,
    /// Status or the error that stopped this file
    pub result: SortResult<FileStatus>,
}

impl FileOutcome {
    /// Returns true if the file was processed without error.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Results of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per input path, in order
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    /// Number of files attempted.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if no file failed.
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::is_ok)
    }

    /// Failed files with their errors.
    pub fn failures(&self) -> Vec<(&Path, &SortError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.path.as_path(), e)))
            .collect()
    }

    /// Number of files with the given status.
    pub fn count(&self, status: FileStatus) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, Ok(s) if s == status))
            .count()
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        format!(
            "{} files: {} rewritten, {} unchanged, {} sorted, {} printed, {} failed",
            self.total(),
            self.count(FileStatus::Rewritten),
            self.count(FileStatus::Unchanged),
            self.count(FileStatus::Sorted),
            self.count(FileStatus::Printed),
            self.failures().len()
        )
    }
}

/// Applies one set of options to files or streams.
#[derive(Debug, Clone)]
pub struct Driver {
    options: Options,
    mode: WriteMode,
}

impl Driver {
    /// Create a driver that rewrites files in place.
    pub fn new(options: Options) -> Self {
        Self {
            options,
            mode: WriteMode::InPlace,
        }
    }

    /// Set the write mode.
    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shared options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Process one file. `out` receives the output in [`WriteMode::Stdout`].
    ///
    /// # Errors
    ///
    /// Any canonicalization error, or `Io` if the file cannot be read or
    /// written. The file is not modified on error.
    pub fn process_path<W: Write>(&self, path: &Path, out: &mut W) -> SortResult<FileStatus> {
        let options = self.options.for_file(path);
        let input = fs::read(path).map_err(|source| SortError::Io {
            filename: options.display_filename().to_string(),
            source,
        })?;
        let output = canonicalize(&input, &options)?;

        if options.check_ordered {
            return Ok(FileStatus::Sorted);
        }
        match self.mode {
            WriteMode::Stdout => {
                write_all(out, &output, &options)?;
                Ok(FileStatus::Printed)
            }
            WriteMode::InPlace if output == input => Ok(FileStatus::Unchanged),
            WriteMode::InPlace => {
                fs::write(path, &output).map_err(|source| SortError::Io {
                    filename: options.display_filename().to_string(),
                    source,
                })?;
                info!(file = %path.display(), bytes = output.len(), "rewrote file");
                Ok(FileStatus::Rewritten)
            }
        }
    }

    /// Process a stream, buffering it completely first. Output goes to
    /// `out` unless in check mode.
    ///
    /// # Errors
    ///
    /// Any canonicalization error, or `Io` if reading or writing fails.
    pub fn process_reader<R: Read, W: Write>(
        &self,
        mut reader: R,
        out: &mut W,
    ) -> SortResult<FileStatus> {
        let mut input = Vec::new();
        reader
            .read_to_end(&mut input)
            .map_err(|source| SortError::Io {
                filename: self.options.display_filename().to_string(),
                source,
            })?;
        let output = canonicalize(&input, &self.options)?;

        if self.options.check_ordered {
            return Ok(FileStatus::Sorted);
        }
        write_all(out, &output, &self.options)?;
        Ok(FileStatus::Printed)
    }

    /// Process every path, continuing past failures.
    pub fn process_all<W: Write>(&self, paths: &[PathBuf], out: &mut W) -> BatchReport {
        let mut report = BatchReport::default();
        for path in paths {
            let result = self.process_path(path, out);
            if let Err(e) = &result {
                warn!(file = %path.display(), kind = %e.kind(), error = %e, "file failed");
            }
            report.outcomes.push(FileOutcome {
                path: path.clone(),
                result,
            });
        }
        report
    }
}

fn write_all<W: Write>(out: &mut W, bytes: &[u8], options: &Options) -> SortResult<()> {
    out.write_all(bytes)
        .and_then(|()| out.flush())
        .map_err(|source| SortError::Io {
            filename: options.display_filename().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_process_reader_prints() {
        let driver = Driver::new(Options::default());
        let mut out = Vec::new();
        let status = driver.process_reader(&b"b: 1\na: 2\n"[..], &mut out).unwrap();
        assert_eq!(status, FileStatus::Printed);
        assert_eq!(out, b"a: 2\nb: 1\n");
    }

    #[test]
    fn test_process_reader_check_writes_nothing() {
        let driver = Driver::new(Options::check());
        let mut out = Vec::new();
        let status = driver.process_reader(&b"a: 1\nb: 2\n"[..], &mut out).unwrap();
        assert_eq!(status, FileStatus::Sorted);
        assert!(out.is_empty());

        let err = driver
            .process_reader(&b"b: 1\na: 2\n"[..], &mut out)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSorted);
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let driver = Driver::new(Options::default());
        let path = Path::new("does/not/exist.yml");
        let err = driver.process_path(path, &mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.filename(), Some("does/not/exist.yml"));
    }

    #[test]
    fn test_report_summary() {
        let report = BatchReport {
            outcomes: vec![
                FileOutcome {
                    path: "a.yml".into(),
                    result: Ok(FileStatus::Rewritten),
                },
                FileOutcome {
                    path: "b.yml".into(),
                    result: Err(SortError::EmptyInput {
                        filename: "b.yml".into(),
                    }),
                },
            ],
        };
        assert!(!report.all_succeeded());
        assert_eq!(report.failures().len(), 1);
        assert_eq!(
            report.summary(),
            "2 files: 1 rewritten, 0 unchanged, 0 sorted, 0 printed, 1 failed"
        );
    }
}
