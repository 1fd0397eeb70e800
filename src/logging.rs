use crate::error::LoggingError;

use log::{LevelFilter, Metadata, Record};
use once_cell::sync::OnceCell;
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "log.txt";

#[derive(Debug)]
struct FileLogger {
    log_file: PathBuf,
    level: LevelFilter,
}

static LOGGER: OnceCell<FileLogger> = OnceCell::new();

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let log_entry = format!(
                "{} {} [{}] {}\n",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            );

            // Write failures are dropped.
            if let Ok(mut file) = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_file)
            {
                let _ = file.write_all(log_entry.as_bytes());
            }
        }
    }

    fn flush(&self) {}
}

// Installs the file logger writing to `<data_dir>/log.txt`.
pub fn init(data_dir: &Path, debug: bool) -> Result<(), LoggingError> {
    create_dir_all(data_dir)?;

    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    LOGGER
        .set(FileLogger {
            log_file: data_dir.join(LOG_FILE_NAME),
            level,
        })
        .map_err(|_| LoggingError::AlreadySet)?;

    let logger = LOGGER.get().ok_or(LoggingError::AlreadySet)?;
    log::set_logger(logger).map_err(|e| LoggingError::SetLogger(e.to_string()))?;
    log::set_max_level(level);
    Ok(())
}
