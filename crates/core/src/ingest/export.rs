use crate::domain::record::Record;
use anyhow::Context;
use serde_json::{Map, Value};
use std::io::Read;

/// Read a CSV export. The header row supplies raw column names; every cell stays text.
pub fn read_csv_records<R: Read>(reader: R) -> anyhow::Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("failed to read CSV header row")?.clone();

    let mut out = Vec::new();
    for (idx, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("malformed CSV row {}", idx + 2))?;
        let mut fields = Map::new();
        for (column, cell) in headers.iter().zip(row.iter()) {
            if column.is_empty() {
                continue;
            }
            fields.insert(column.to_string(), Value::String(cell.to_string()));
        }
        out.push(Record::new(fields));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_export_with_formatted_numbers() {
        let data = "Ad ID, Spend ,CTR %,ROAS\nad_001,\"1,500\",1.6%,1.8\nad_002,2000,0.67,\n";
        let records = read_csv_records(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].number("Spend"), 1500.0);
        assert_eq!(records[0].number("CTR %"), 1.6);
        assert_eq!(records[1].number("ROAS"), 0.0);
        assert_eq!(records[1].get("Ad ID"), Some(&Value::String("ad_002".into())));
    }

    #[test]
    fn short_rows_leave_fields_missing() {
        let data = "Ad ID,Spend,ROAS\nad_001,10\n";
        let records = read_csv_records(data.as_bytes()).unwrap();
        assert_eq!(records[0].get("ROAS"), None);
    }

    #[test]
    fn columns_follow_header_order() {
        let records = read_csv_records("Spend,Ad ID,Zeta,Alpha\n1,a,2,3\n".as_bytes()).unwrap();
        let columns: Vec<&str> = records[0].columns().collect();
        assert_eq!(columns, vec!["Spend", "Ad ID", "Zeta", "Alpha"]);
    }

    #[test]
    fn header_only_file_is_empty() {
        let records = read_csv_records("Ad ID,Spend\n".as_bytes()).unwrap();
        assert!(records.is_empty());
    }
}
