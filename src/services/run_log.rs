use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;

/// Append-only per-run log file. Every line is timestamped in the file and
/// echoed through `log::info!`, so the file is the durable record and the
/// console follows the env_logger filter. The handle is passed explicitly to
/// whoever needs to write diagnostics.
pub struct RunLog {
    file: Mutex<File>,
    pub path: PathBuf,
}

impl RunLog {
    /// Creates the log directory on demand and opens a fresh timestamped file.
    pub fn create(log_dir: &str) -> anyhow::Result<RunLog> {
        fs::create_dir_all(log_dir)?;
        let name = format!("log_{}.txt", Local::now().format("%Y%m%d_%H%M%S"));
        let path = Path::new(log_dir).join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(RunLog {
            file: Mutex::new(file),
            path,
        })
    }

    pub fn line(&self, message: &str) {
        log::info!("{}", message);

        let stamped = format!(
            "{} - {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            message
        );
        if let Ok(mut file) = self.file.lock() {
            if let Err(e) = file.write_all(stamped.as_bytes()) {
                log::error!("Failed to append to run log: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RunLog;

    #[test]
    fn lines_are_timestamped_and_appended() {
        let dir = std::env::temp_dir().join("raspador_run_log_test");
        let _ = std::fs::remove_dir_all(&dir);

        let log = RunLog::create(dir.to_str().unwrap()).unwrap();
        log.line("first entry");
        log.line("second entry");

        let contents = std::fs::read_to_string(&log.path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - first entry"));
        assert!(lines[1].ends_with(" - second entry"));
    }
}
