use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::Context;
use serde::de::DeserializeOwned;

/// Reads every record of a GTFS text file.
pub fn read_records<T: DeserializeOwned, R: Read>(rdr: R) -> anyhow::Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(rdr);

    let mut records = vec![];
    for (i, row) in reader.deserialize().enumerate() {
        // Row 1 is the header
        let record = row.with_context(|| format!("Malformed row {}", i + 2))?;
        records.push(record);
    }

    Ok(records)
}

pub fn read_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<T>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    read_records(BufReader::new(f)).with_context(|| format!("Failed to read {}", path.display()))
}
