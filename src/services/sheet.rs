use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use crate::{
    domain::item_record::{ItemRecord, SHEET_HEADER},
    services::RunLog,
};

/// CSV sheet sink. Created with the fixed header row on first use, opened in
/// append mode afterwards, and recreated fresh if the existing file cannot be
/// opened. One flush per page batch; a row that fails to serialize is logged
/// and skipped.
pub struct SheetSink {
    path: PathBuf,
}

impl SheetSink {
    pub fn new(path: impl Into<PathBuf>) -> SheetSink {
        SheetSink { path: path.into() }
    }

    pub fn append_batch(&mut self, records: &[ItemRecord], log: &RunLog) -> anyhow::Result<()> {
        let mut writer = match self.open_for_append(log) {
            Ok(writer) => writer,
            Err(e) => {
                log.line(&format!(
                    "Failed to open sheet {}: {:?}. Creating a fresh one.",
                    self.path.display(),
                    e
                ));
                self.create_with_header(log)?
            }
        };

        for record in records {
            if let Err(e) = writer.serialize(record) {
                log.line(&format!(
                    "Failed to append row {:?} to the sheet: {:?}",
                    record, e
                ));
            }
        }
        writer.flush()?;
        log.line(&format!("Data saved to {}.", self.path.display()));

        Ok(())
    }

    fn open_for_append(&self, log: &RunLog) -> anyhow::Result<csv::Writer<File>> {
        if !self.path.exists() {
            return self.create_with_header(log);
        }

        let file = OpenOptions::new().append(true).open(&self.path)?;
        log.line(&format!("Opening existing sheet: {}.", self.path.display()));

        Ok(csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file))
    }

    fn create_with_header(&self, log: &RunLog) -> anyhow::Result<csv::Writer<File>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&self.path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(SHEET_HEADER)?;
        log.line(&format!(
            "Created new sheet {} with headers.",
            self.path.display()
        ));

        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::SheetSink;
    use crate::domain::item_record::ItemRecord;
    use crate::services::RunLog;

    fn record(description: &str) -> ItemRecord {
        ItemRecord {
            dispense_number: "111/2025".to_string(),
            opening_date: "30/05/2025".to_string(),
            description: description.to_string(),
            state_code: "BA".to_string(),
            winner: "Vendor X".to_string(),
            brand: "BrandY".to_string(),
            quantity: 10.0,
            unit_price: 5.0,
            total_price: 50.0,
            item_status: "Concluído".to_string(),
        }
    }

    fn setup(name: &str) -> (SheetSink, RunLog, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("raspador_sheet_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        let log = RunLog::create(dir.to_str().unwrap()).unwrap();
        let sheet_path = dir.join("planilha.csv");
        (SheetSink::new(sheet_path.clone()), log, sheet_path)
    }

    #[test]
    fn creates_sheet_with_header_row() {
        let (mut sink, log, path) = setup("create");

        sink.append_batch(&[record("Item A")], &log).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Number,Opening Date,Description,State,Winner,Brand,Quantity,Unit Price,Total Price,Item Status"
        );
        assert!(lines[1].starts_with("111/2025,30/05/2025,Item A,BA,"));
    }

    #[test]
    fn appends_across_batches_without_duplicating_header() {
        let (mut sink, log, path) = setup("append");

        sink.append_batch(&[record("Item A")], &log).unwrap();
        sink.append_batch(&[record("Item B"), record("Item C")], &log)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines.iter().filter(|l| l.starts_with("Number,")).count(), 1);
        assert!(lines[2].contains("Item B"));
        assert!(lines[3].contains("Item C"));
    }

    #[test]
    fn unopenable_sheet_recreates_fresh_without_panicking() {
        let (mut sink, log, path) = setup("unopenable");
        // Occupy the sheet path with a directory so both the append open and
        // the immediate recreate attempt fail
        std::fs::create_dir_all(&path).unwrap();

        let result = sink.append_batch(&[record("Item A")], &log);

        assert!(result.is_err());
        let diagnostics = std::fs::read_to_string(&log.path).unwrap();
        assert!(diagnostics.contains("Creating a fresh one"));

        // Once the path is usable again, the next batch starts a fresh sheet
        std::fs::remove_dir_all(&path).unwrap();
        sink.append_batch(&[record("Item B")], &log).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Number,"));
        assert!(lines[1].contains("Item B"));
    }

    #[test]
    fn empty_batch_still_persists_cleanly() {
        let (mut sink, log, path) = setup("empty");

        sink.append_batch(&[], &log).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
