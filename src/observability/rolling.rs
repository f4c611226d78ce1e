//! Day-partitioned, size-capped log file sink.
//!
//! The active file is `<prefix>-YYYY-MM-DD.log`. It is rotated when the local
//! date changes or when the next record would push it past the size cap; the
//! rotated file is gzip-compressed to `<prefix>-YYYY-MM-DD.N.log.gz`. Files
//! older than the retention window are deleted on startup and on every
//! rotation.
//!
//! Sink failures are reported on stderr and swallowed: `write` always reports
//! the whole buffer as written so the logging pipeline never sees an error.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use flate2::write::GzEncoder;
use flate2::Compression;

struct ActiveFile {
    date: NaiveDate,
    file: File,
    size: u64,
}

/// Rotating file writer, driven by the `tracing-appender` worker thread.
pub struct RollingFileWriter {
    dir: PathBuf,
    prefix: String,
    max_bytes: u64,
    retention_days: u32,
    active: Option<ActiveFile>,
}

impl RollingFileWriter {
    /// Create the writer, making `dir` if needed and sweeping stale files.
    pub fn new(
        dir: impl AsRef<Path>,
        prefix: impl Into<String>,
        max_bytes: u64,
        retention_days: u32,
    ) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let writer = Self {
            dir,
            prefix: prefix.into(),
            max_bytes,
            retention_days,
            active: None,
        };
        writer.sweep(today())?;
        Ok(writer)
    }

    /// Path of the uncompressed file for `date`.
    pub fn active_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}-{}.log", self.prefix, date))
    }

    fn write_record(&mut self, buf: &[u8], date: NaiveDate) -> io::Result<()> {
        let len = buf.len() as u64;
        let needs_rotation = self.active.as_ref().is_some_and(|active| {
            active.date != date || (active.size > 0 && active.size + len > self.max_bytes)
        });

        if needs_rotation {
            self.rotate(date)?;
        }

        if self.active.is_none() {
            self.active = Some(self.open(date)?);
        }
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };

        match active.file.write_all(buf) {
            Ok(()) => {
                active.size += len;
                Ok(())
            }
            Err(e) => {
                // Reopen on the next record.
                self.active = None;
                Err(e)
            }
        }
    }

    fn open(&self, date: NaiveDate) -> io::Result<ActiveFile> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.active_path(date))?;
        let size = file.metadata()?.len();
        Ok(ActiveFile { date, file, size })
    }

    fn rotate(&mut self, today: NaiveDate) -> io::Result<()> {
        if let Some(mut active) = self.active.take() {
            active.file.flush()?;
            drop(active.file);
            self.archive(&self.active_path(active.date), active.date)?;
        }
        self.sweep(today)
    }

    fn archive(&self, src: &Path, date: NaiveDate) -> io::Result<()> {
        let dest = self.next_archive_path(date);
        let mut input = File::open(src)?;
        let mut encoder = GzEncoder::new(File::create(&dest)?, Compression::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.sync_all()?;
        fs::remove_file(src)
    }

    fn next_archive_path(&self, date: NaiveDate) -> PathBuf {
        let mut n = 1;
        loop {
            let candidate = self
                .dir
                .join(format!("{}-{}.{}.log.gz", self.prefix, date, n));
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Delete expired files and compress uncompressed files left from earlier days.
    fn sweep(&self, today: NaiveDate) -> io::Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(date) = self.file_date(name) else {
                continue;
            };

            let age_days = (today - date).num_days();
            if age_days >= i64::from(self.retention_days) {
                fs::remove_file(&path)?;
            } else if date != today && name == format!("{}-{}.log", self.prefix, date) {
                self.archive(&path, date)?;
            }
        }
        Ok(())
    }

    /// Parse the date out of a file name produced by this writer.
    fn file_date(&self, name: &str) -> Option<NaiveDate> {
        let rest = name.strip_prefix(&self.prefix)?.strip_prefix('-')?;
        let stamp = rest.get(..10)?;
        NaiveDate::parse_from_str(stamp, "%Y-%m-%d").ok()
    }
}

impl Write for RollingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Err(e) = self.write_record(buf, today()) {
            eprintln!("log file sink error in {}: {}", self.dir.display(), e);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(active) = self.active.as_mut() {
            if let Err(e) = active.file.flush() {
                eprintln!("log file sink flush error: {}", e);
            }
        }
        Ok(())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
