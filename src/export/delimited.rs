//! CSV出力

use crate::error::Result;
use crate::pipeline::NormalizedRecord;
use std::path::Path;

pub fn write_records(records: &[NormalizedRecord], columns: &[String], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns)?;

    for record in records {
        writer.write_record(columns.iter().map(|c| record.value(c).render()))?;
    }

    writer.flush()?;
    Ok(())
}
