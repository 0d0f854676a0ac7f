//! FileStore - appends readings to JSON-lines and CSV files

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use contracts::{round_tenth, ContractError, ReadingStore, Reading};
use serde::Serialize;
use tracing::{debug, instrument};

pub const JSONL_FILE: &str = "readings.jsonl";
pub const CSV_FILE: &str = "readings.csv";
pub const CSV_HEADER: &str = "id,temperature,humidity,heat_index,air_quality,recorded_at";

/// One persisted row
#[derive(Debug, Serialize)]
struct StoredReading {
    id: u64,
    temperature: f64,
    humidity: f64,
    heat_index: Option<f64>,
    air_quality: Option<f64>,
    recorded_at: String,
}

impl StoredReading {
    fn from_reading(id: u64, reading: &Reading) -> Self {
        Self {
            id,
            temperature: round_tenth(reading.temperature),
            humidity: round_tenth(reading.humidity),
            heat_index: reading.heat_index.map(round_tenth),
            air_quality: reading.air_quality.map(round_tenth),
            recorded_at: reading.timestamp.to_rfc3339(),
        }
    }

    fn csv_row(&self) -> String {
        let opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        format!(
            "{},{},{},{},{},{}",
            self.id,
            self.temperature,
            self.humidity,
            opt(self.heat_index),
            opt(self.air_quality),
            self.recorded_at
        )
    }
}

/// Store that appends every reading to disk
pub struct FileStore {
    name: String,
    base_path: PathBuf,
    next_id: u64,
}

impl FileStore {
    /// Open (or create) the store directory
    ///
    /// Ids continue from the number of lines already in `readings.jsonl`.
    pub fn new(name: impl Into<String>, base_path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        let existing = count_lines(&base_path.join(JSONL_FILE))?;

        let csv_path = base_path.join(CSV_FILE);
        if !csv_path.exists() {
            let mut file = File::create(&csv_path)?;
            writeln!(file, "{CSV_HEADER}")?;
        }

        Ok(Self {
            name: name.into(),
            base_path,
            next_id: existing + 1,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn append(&self, file: &str, line: &str) -> std::io::Result<()> {
        let mut handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.base_path.join(file))?;
        writeln!(handle, "{line}")
    }

    fn write_reading(&mut self, reading: &Reading) -> std::io::Result<u64> {
        let row = StoredReading::from_reading(self.next_id, reading);
        let json = serde_json::to_string(&row)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        self.append(JSONL_FILE, &json)?;
        self.append(CSV_FILE, &row.csv_row())?;

        self.next_id += 1;
        Ok(row.id)
    }
}

fn count_lines(path: &Path) -> std::io::Result<u64> {
    if !path.exists() {
        return Ok(0);
    }

    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;
    for line in reader.lines() {
        if !line?.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

impl ReadingStore for FileStore {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "file_store_insert", skip(self, reading), fields(store = %self.name))]
    async fn insert_reading(&mut self, reading: &Reading) -> Result<u64, ContractError> {
        let id = self
            .write_reading(reading)
            .map_err(|e| ContractError::storage(&self.name, e.to_string()))?;
        debug!(id, "Reading stored");
        Ok(id)
    }

    async fn reading_count(&self) -> Result<u64, ContractError> {
        count_lines(&self.base_path.join(JSONL_FILE))
            .map_err(|e| ContractError::storage(&self.name, e.to_string()))
    }
}
