//! CSV export of visit records.
//!
//! Columns: `id, timestamp, patient_id, gender, birth_date, age, panel`, then one
//! `count:<cell>` column per cell type seen in any exported record (canonical order),
//! then `morphology:<feature>` for all nineteen features, then `comment`.

use crate::error::ExportResult;
use cellcount_core::record::StoredAge;
use cellcount_core::{CellType, MorphologyFeature, StoredRecord, VisitRecord};
use std::collections::BTreeSet;
use std::io::Write;

fn count_columns(records: &[VisitRecord]) -> Vec<CellType> {
    let seen: BTreeSet<CellType> = records
        .iter()
        .flat_map(|record| record.counts().keys().copied())
        .collect();
    seen.into_iter().collect()
}

pub fn write_records_csv<W: Write>(records: &[VisitRecord], writer: W) -> ExportResult<()> {
    let cells = count_columns(records);
    let mut out = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = [
        "id",
        "timestamp",
        "patient_id",
        "gender",
        "birth_date",
        "age",
        "panel",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    header.extend(cells.iter().map(|cell| format!("count:{}", cell.name())));
    header.extend(
        MorphologyFeature::ALL
            .iter()
            .map(|feature| format!("morphology:{}", feature.name())),
    );
    header.push("comment".to_string());
    out.write_record(&header)?;

    for record in records {
        let stored = StoredRecord::from(record);
        let age = match &stored.age {
            StoredAge::Years(years) => years.to_string(),
            StoredAge::Text(text) => text.clone(),
        };

        let mut row = vec![
            stored.id.clone(),
            stored.timestamp.clone(),
            stored.patient_id.clone(),
            stored.gender.clone(),
            stored.birth_date.clone(),
            age,
            stored.panel.clone(),
        ];
        row.extend(cells.iter().map(|cell| {
            record
                .counts()
                .get(cell)
                .map(u32::to_string)
                .unwrap_or_default()
        }));
        row.extend(
            MorphologyFeature::ALL
                .iter()
                .map(|feature| record.morphology().get(*feature).name().to_string()),
        );
        row.push(stored.comment.clone());
        out.write_record(&row)?;
    }

    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// All records as one CSV document.
pub fn records_to_csv(records: &[VisitRecord]) -> ExportResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_records_csv(records, &mut buf)?;
    tracing::debug!(records = records.len(), bytes = buf.len(), "Exported CSV");
    Ok(buf)
}
