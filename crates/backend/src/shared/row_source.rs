//! Raw rows for data sources
//!
//! The engine only consumes plain records keyed by catalog field id; this is
//! the boundary where they are fetched.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use contracts::shared::tableau_widget::{
    CellValue, DataSource, Row, SoftwareDef, TableDef, TableauWidgetConfig,
};

use super::tableau_widget::catalog_registry::{find_software, find_table};

/// Supplies the raw rows of one data source
pub trait RowSource: Send + Sync {
    fn rows_for(&self, data_source: &DataSource) -> anyhow::Result<Vec<Row>>;
}

/// Rows read from `{root}/{software_id}/{table_id}.json` or `.csv`
///
/// Only catalog tables are read; paths are built from the catalog's ids.
pub struct FileRowSource {
    root: PathBuf,
}

impl FileRowSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn table_path(&self, software: &SoftwareDef, table: &TableDef, extension: &str) -> PathBuf {
        self.root
            .join(software.id)
            .join(format!("{}.{}", table.id, extension))
    }
}

impl RowSource for FileRowSource {
    fn rows_for(&self, data_source: &DataSource) -> anyhow::Result<Vec<Row>> {
        let software = find_software(&data_source.software_id);
        let table = find_table(&data_source.software_id, &data_source.table_id);
        let (Some(software), Some(table)) = (software, table) else {
            tracing::warn!(
                "Data source {} names no catalog table ({}/{}), no rows",
                data_source.id,
                data_source.software_id,
                data_source.table_id
            );
            return Ok(Vec::new());
        };

        let json_path = self.table_path(software, table, "json");
        if json_path.exists() {
            let contents = std::fs::read_to_string(&json_path)
                .with_context(|| format!("reading {}", json_path.display()))?;
            let rows: Vec<Row> = serde_json::from_str(&contents)
                .with_context(|| format!("parsing {}", json_path.display()))?;
            return Ok(rows);
        }

        let csv_path = self.table_path(software, table, "csv");
        if csv_path.exists() {
            let reader = csv::Reader::from_path(&csv_path)
                .with_context(|| format!("opening {}", csv_path.display()))?;
            return read_csv_rows(reader);
        }

        tracing::warn!(
            "No rows for {}/{} under {}",
            data_source.software_id,
            data_source.table_id,
            self.root.display()
        );
        Ok(Vec::new())
    }
}

/// CSV cells that look numeric become numbers, empty cells become null
fn read_csv_rows<R: std::io::Read>(mut reader: csv::Reader<R>) -> anyhow::Result<Vec<Row>> {
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, raw)| (header.to_string(), csv_cell(raw)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn csv_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        CellValue::Null
    } else if let Ok(i) = trimmed.parse::<i64>() {
        CellValue::Integer(i)
    } else if let Ok(n) = trimmed.parse::<f64>() {
        if n.is_finite() {
            CellValue::Number(n)
        } else {
            CellValue::Text(raw.to_string())
        }
    } else {
        CellValue::Text(raw.to_string())
    }
}

/// Rows of every data source of the widget, keyed by data source id
///
/// Only a failure on the primary source is an error; the other sources are not shaped,
/// so their failures are logged and the source is left out.
pub fn rows_by_source(
    config: &TableauWidgetConfig,
    source: &dyn RowSource,
) -> anyhow::Result<HashMap<String, Vec<Row>>> {
    let mut result = HashMap::new();
    for (index, data_source) in config.data_sources.iter().enumerate() {
        let rows = match source.rows_for(data_source) {
            Ok(rows) => rows,
            Err(e) if index > 0 => {
                tracing::warn!("Skipping rows of data source {}: {:#}", data_source.id, e);
                continue;
            }
            Err(e) => return Err(e),
        };
        tracing::debug!("Loaded {} rows for data source {}", rows.len(), data_source.id);
        result.insert(data_source.id.clone(), rows);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_source(software_id: &str, table_id: &str) -> DataSource {
        DataSource {
            id: format!("{}-{}", software_id, table_id),
            software_id: software_id.to_string(),
            table_id: table_id.to_string(),
            alias: None,
        }
    }

    #[test]
    fn test_csv_cells_are_typed() {
        let data = "type,value,note\nA,10,\nB,2.5,text\n";
        let rows = read_csv_rows(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["value"], CellValue::Integer(10));
        assert_eq!(rows[0]["note"], CellValue::Null);
        assert_eq!(rows[1]["value"], CellValue::Number(2.5));
        assert_eq!(rows[1]["note"], CellValue::from("text"));
        assert_eq!(csv_cell("NaN"), CellValue::from("NaN"));
    }

    #[test]
    fn test_file_row_source_reads_json_and_csv() {
        let root = std::env::temp_dir().join(format!("row-source-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(root.join("sales")).unwrap();
        std::fs::write(
            root.join("sales").join("sales_summary.json"),
            r#"[{"type": "A", "value": 10}, {"type": "B", "value": 20}]"#,
        )
        .unwrap();
        std::fs::write(root.join("sales").join("sales_invoices.csv"), "branch,amount\nNorth,5\n")
            .unwrap();

        let source = FileRowSource::new(&root);
        let summary = source.rows_for(&data_source("sales", "sales_summary")).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[1]["value"], CellValue::Integer(20));

        let invoices = source.rows_for(&data_source("sales", "sales_invoices")).unwrap();
        assert_eq!(invoices[0]["branch"], CellValue::from("North"));

        assert!(source.rows_for(&data_source("crm", "customers")).unwrap().is_empty());

        let mut config = TableauWidgetConfig::new("Both");
        config.data_sources.push(data_source("sales", "sales_summary"));
        config.data_sources.push(data_source("crm", "customers"));
        let by_source = rows_by_source(&config, &source).unwrap();
        assert_eq!(by_source.len(), 2);
        assert_eq!(by_source["sales-sales_summary"].len(), 2);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_uncatalogued_tables_are_never_read() {
        let base = std::env::temp_dir().join(format!("row-source-{}", uuid::Uuid::new_v4()));
        let root = base.join("rows");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(base.join("secret.json"), r#"[{"password": "hunter2"}]"#).unwrap();

        let source = FileRowSource::new(&root);
        let escape = data_source("..", "secret");
        assert!(source.rows_for(&escape).unwrap().is_empty());
        assert!(source.rows_for(&data_source("sales", "../../secret")).unwrap().is_empty());

        std::fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_broken_secondary_source_is_skipped() {
        let root = std::env::temp_dir().join(format!("row-source-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(root.join("sales")).unwrap();
        std::fs::create_dir_all(root.join("crm")).unwrap();
        std::fs::write(
            root.join("sales").join("sales_summary.json"),
            r#"[{"type": "A", "value": 10}]"#,
        )
        .unwrap();
        std::fs::write(root.join("crm").join("customers.json"), "{not json").unwrap();
        let source = FileRowSource::new(&root);

        let mut config = TableauWidgetConfig::new("Broken join partner");
        config.data_sources.push(data_source("sales", "sales_summary"));
        config.data_sources.push(data_source("crm", "customers"));
        let by_source = rows_by_source(&config, &source).unwrap();
        assert_eq!(by_source.len(), 1);
        assert_eq!(by_source["sales-sales_summary"].len(), 1);

        config.data_sources.reverse();
        assert!(rows_by_source(&config, &source).is_err());

        std::fs::remove_dir_all(&root).unwrap();
    }
}
