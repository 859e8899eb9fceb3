//! Run-scoped file logging behind the `log` facade: one timestamped line per
//! record, written to the run's log file. The process installs this once at
//! startup; everything else just uses the `log` macros.

use log::{LevelFilter, Log, Metadata, Record};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

struct FileLog {
    file: Mutex<File>,
}

impl Log for FileLog {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(
                file,
                "{}.{:03} {} {} {}",
                now.as_secs(),
                now.subsec_millis(),
                record.target(),
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Creates the log file and installs the sink at debug level. Fails if a
/// logger is already installed.
pub fn init(path: impl AsRef<Path>) -> io::Result<()> {
    let file = File::create(path)?;
    log::set_boxed_logger(Box::new(FileLog {
        file: Mutex::new(file),
    }))
    .map_err(|err| io::Error::new(io::ErrorKind::AlreadyExists, err.to_string()))?;
    log::set_max_level(LevelFilter::Debug);
    Ok(())
}
