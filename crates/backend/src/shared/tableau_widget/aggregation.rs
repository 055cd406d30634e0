use std::collections::{HashMap, HashSet};

use contracts::shared::tableau_widget::{cell, AggregateFunction, CellValue, DroppedField, Row};

/// One measure of a grouped row
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureColumn {
    /// Row key the values are read from
    pub source_key: String,
    /// Key the aggregate is written under, unique within the output row
    pub output_key: String,
    pub function: AggregateFunction,
}

/// Output columns for the measures on a shelf.
///
/// The first placement of a row key keeps the key itself. A repeated placement is written
/// under `{key}_{function}` (e.g. `value_count`), then `{key}_{function}_2` and so on.
pub fn measure_columns(y_fields: &[DroppedField], x_key: &str) -> Vec<MeasureColumn> {
    let mut taken: HashSet<String> = HashSet::from([x_key.to_string()]);
    y_fields
        .iter()
        .map(|dropped| {
            let source_key = dropped.field.row_key().to_string();
            let function = dropped.aggregation.unwrap_or_default();
            let base = format!("{}_{}", source_key, function_key(function));
            let mut output_key = source_key.clone();
            let mut attempt = 1;
            while taken.contains(&output_key) {
                output_key = match attempt {
                    1 => base.clone(),
                    n => format!("{}_{}", base, n),
                };
                attempt += 1;
            }
            taken.insert(output_key.clone());
            MeasureColumn {
                source_key,
                output_key,
                function,
            }
        })
        .collect()
}

fn function_key(function: AggregateFunction) -> &'static str {
    match function {
        AggregateFunction::Sum => "sum",
        AggregateFunction::Avg => "avg",
        AggregateFunction::Count => "count",
        AggregateFunction::Min => "min",
        AggregateFunction::Max => "max",
        AggregateFunction::CountDistinct => "countDistinct",
    }
}

/// Groups rows by the x key and reduces each measure with its aggregate function
pub struct GroupAggregator {
    /// Row key of the category axis
    x_key: String,
    measures: Vec<MeasureColumn>,
}

impl GroupAggregator {
    pub fn new(x_key: String, measures: Vec<MeasureColumn>) -> Self {
        Self { x_key, measures }
    }

    /// One output row per distinct stringified x value, in first-seen order
    pub fn build(&self, rows: &[Row]) -> Vec<Row> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&Row>> = HashMap::new();
        for row in rows {
            let key = cell(row, &self.x_key).as_text();
            groups
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(row);
        }

        order
            .iter()
            .filter_map(|key| groups.get(key))
            .map(|group_rows| {
                let mut values = Row::new();
                values.insert(
                    self.x_key.clone(),
                    cell(group_rows[0], &self.x_key).clone(),
                );
                for measure in &self.measures {
                    values.insert(
                        measure.output_key.clone(),
                        aggregate(group_rows, &measure.source_key, measure.function),
                    );
                }
                values
            })
            .collect()
    }
}

/// Reduce one column of a group
pub fn aggregate(rows: &[&Row], column: &str, function: AggregateFunction) -> CellValue {
    match function {
        AggregateFunction::Count => CellValue::Integer(rows.len() as i64),
        AggregateFunction::CountDistinct => {
            let distinct: HashSet<String> = rows
                .iter()
                .map(|row| cell(row, column))
                .filter(|value| !value.is_null())
                .map(CellValue::as_text)
                .collect();
            CellValue::Integer(distinct.len() as i64)
        }
        AggregateFunction::Sum => numeric(rows, column)
            .reduce(|a, b| a + b)
            .map_or(CellValue::Null, CellValue::Number),
        AggregateFunction::Avg => {
            let (sum, count) =
                numeric(rows, column).fold((0.0, 0usize), |(s, c), n| (s + n, c + 1));
            if count > 0 {
                CellValue::Number(sum / count as f64)
            } else {
                CellValue::Null
            }
        }
        AggregateFunction::Min => numeric(rows, column)
            .reduce(f64::min)
            .map_or(CellValue::Null, CellValue::Number),
        AggregateFunction::Max => numeric(rows, column)
            .reduce(f64::max)
            .map_or(CellValue::Null, CellValue::Number),
    }
}

/// Numeric values of a column, skipping anything that is not a number
fn numeric<'a>(rows: &'a [&'a Row], column: &'a str) -> impl Iterator<Item = f64> + 'a {
    rows.iter()
        .map(move |row| cell(row, column).as_number())
        .filter(|n| !n.is_nan())
}
