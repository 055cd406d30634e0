//! Shaping pipeline
//!
//! Turns a widget configuration plus raw rows into the flat structure the
//! chart renderer consumes. Every "cannot chart" condition yields `None`.

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use contracts::shared::tableau_widget::{
    ChartData, DroppedField, FieldKind, Row, TableauWidgetConfig,
};

use super::aggregation::{measure_columns, GroupAggregator};
use super::filter_evaluator::apply_filters;

/// Shape against the current local day
pub fn shape(
    config: &TableauWidgetConfig,
    rows_by_source: &HashMap<String, Vec<Row>>,
) -> Option<ChartData> {
    shape_at(config, rows_by_source, Local::now().date_naive())
}

/// Shape with date presets resolved against `today`
pub fn shape_at(
    config: &TableauWidgetConfig,
    rows_by_source: &HashMap<String, Vec<Row>>,
    today: NaiveDate,
) -> Option<ChartData> {
    let Some(primary) = config.primary_data_source() else {
        tracing::debug!("Widget {}: no data sources, no chart", config.id);
        return None;
    };
    if config.data_sources.len() > 1 {
        tracing::debug!(
            "Widget {}: {} data sources, shaping primary source {} only",
            config.id,
            config.data_sources.len(),
            primary.id
        );
    }

    let rows = match rows_by_source.get(&primary.id) {
        Some(rows) if !rows.is_empty() => rows.clone(),
        _ => {
            tracing::debug!("Widget {}: no rows for source {}", config.id, primary.id);
            return None;
        }
    };

    let filtered_rows = apply_filters(rows, &config.active_filters_snapshot, today);

    let Some(x_field) = first_dimension(&config.columns).or_else(|| first_dimension(&config.rows))
    else {
        tracing::debug!("Widget {}: no dimension on columns or rows", config.id);
        return None;
    };

    let y_fields: Vec<DroppedField> = config
        .values
        .iter()
        .filter(|d| d.field.kind == FieldKind::Measure)
        .cloned()
        .collect();
    if y_fields.is_empty() {
        tracing::debug!("Widget {}: no measure on values", config.id);
        return None;
    }

    let x_key = x_field.field.row_key().to_string();
    let (data, y_keys) = if config.group_by_x {
        let measures = measure_columns(&y_fields, &x_key);
        let y_keys = measures.iter().map(|m| m.output_key.clone()).collect();
        let grouped = GroupAggregator::new(x_key.clone(), measures).build(&filtered_rows);
        (grouped, y_keys)
    } else {
        let y_keys = y_fields
            .iter()
            .map(|d| d.field.row_key().to_string())
            .collect();
        (filtered_rows, y_keys)
    };

    Some(ChartData {
        data,
        x_key,
        y_keys,
        y_measure_fields: y_fields,
        color_key: config
            .color_by
            .as_ref()
            .map(|d| d.field.row_key().to_string()),
        size_key: config
            .size_by
            .as_ref()
            .map(|d| d.field.row_key().to_string()),
    })
}

fn first_dimension(shelf: &[DroppedField]) -> Option<&DroppedField> {
    shelf.iter().find(|d| d.field.kind == FieldKind::Dimension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::tableau_widget::{
        ActiveFilter, AggregateFunction, CellValue, DataSource, FilterMode, NumOperator,
    };

    use crate::shared::tableau_widget::catalog_registry::fields_for_data_source;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    fn sales_rows() -> Vec<Row> {
        vec![
            Row::from([
                ("type".to_string(), CellValue::from("A")),
                ("value".to_string(), CellValue::Integer(10)),
            ]),
            Row::from([
                ("type".to_string(), CellValue::from("B")),
                ("value".to_string(), CellValue::Integer(20)),
            ]),
        ]
    }

    /// `sales_summary` with `type` on columns and `sum(value)` on values
    fn scenario() -> (TableauWidgetConfig, HashMap<String, Vec<Row>>) {
        let data_source = DataSource {
            id: "ds-1".to_string(),
            software_id: "sales".to_string(),
            table_id: "sales_summary".to_string(),
            alias: None,
        };
        let fields = fields_for_data_source(&data_source);
        let mut config = TableauWidgetConfig::new("Sales by type");
        config.data_sources.push(data_source);
        config.columns.push(DroppedField::new(fields[0].clone()));
        config.values.push(DroppedField::new(fields[1].clone()));
        let rows = HashMap::from([("ds-1".to_string(), sales_rows())]);
        (config, rows)
    }

    #[test]
    fn test_scenario_without_filters() {
        let (config, rows) = scenario();
        let chart = shape_at(&config, &rows, today()).unwrap();
        assert_eq!(chart.data, sales_rows());
        assert_eq!(chart.x_key, "type");
        assert_eq!(chart.y_keys, vec!["value"]);
        assert_eq!(chart.y_measure_fields.len(), 1);
        assert_eq!(
            chart.y_measure_fields[0].aggregation,
            Some(AggregateFunction::Sum)
        );
        assert_eq!(chart.color_key, None);
    }

    #[test]
    fn test_scenario_with_values_filter() {
        let (mut config, rows) = scenario();
        let field = config.columns[0].field.clone();
        config
            .active_filters_snapshot
            .push(ActiveFilter::new(field, vec!["A".to_string()]));
        let chart = shape_at(&config, &rows, today()).unwrap();
        assert_eq!(chart.data, vec![sales_rows()[0].clone()]);
    }

    #[test]
    fn test_scenario_with_between_filter() {
        let (mut config, rows) = scenario();
        let mut filter = ActiveFilter::new(config.values[0].field.clone(), vec![]);
        filter.mode = FilterMode::NumCondition;
        filter.num_operator = Some(NumOperator::Between);
        filter.num_value = Some(CellValue::Integer(15));
        filter.num_value2 = Some(CellValue::Integer(25));
        config.active_filters_snapshot.push(filter);
        let chart = shape_at(&config, &rows, today()).unwrap();
        assert_eq!(chart.data, vec![sales_rows()[1].clone()]);
    }

    #[test]
    fn test_no_data_sources_gives_no_chart() {
        let (mut config, rows) = scenario();
        config.data_sources.clear();
        assert!(shape_at(&config, &rows, today()).is_none());
    }

    #[test]
    fn test_missing_or_empty_rows_give_no_chart() {
        let (config, _) = scenario();
        assert!(shape_at(&config, &HashMap::new(), today()).is_none());
        let empty = HashMap::from([("ds-1".to_string(), Vec::new())]);
        assert!(shape_at(&config, &empty, today()).is_none());
    }

    #[test]
    fn test_no_dimension_gives_no_chart() {
        let (mut config, rows) = scenario();
        config.columns.clear();
        assert!(shape_at(&config, &rows, today()).is_none());
    }

    #[test]
    fn test_no_measure_gives_no_chart() {
        let (mut config, rows) = scenario();
        config.values.clear();
        assert!(shape_at(&config, &rows, today()).is_none());
    }

    #[test]
    fn test_rows_shelf_supplies_x_when_columns_have_no_dimension() {
        let (mut config, rows) = scenario();
        let dimension = config.columns.remove(0);
        config.columns.push(config.values[0].clone());
        config.rows.push(dimension);
        let chart = shape_at(&config, &rows, today()).unwrap();
        assert_eq!(chart.x_key, "type");
    }

    #[test]
    fn test_filters_that_hide_everything_still_chart() {
        let (mut config, rows) = scenario();
        let field = config.columns[0].field.clone();
        config.active_filters_snapshot.push(ActiveFilter::new(field, vec![]));
        let chart = shape_at(&config, &rows, today()).unwrap();
        assert!(chart.data.is_empty());
    }

    #[test]
    fn test_only_primary_source_is_shaped() {
        let (mut config, mut rows) = scenario();
        config.data_sources.push(DataSource {
            id: "ds-2".to_string(),
            software_id: "crm".to_string(),
            table_id: "customers".to_string(),
            alias: None,
        });
        rows.insert(
            "ds-2".to_string(),
            vec![Row::from([("city".to_string(), CellValue::from("Tabriz"))])],
        );
        let chart = shape_at(&config, &rows, today()).unwrap();
        assert_eq!(chart.data, sales_rows());
    }

    #[test]
    fn test_group_by_x_aggregates_measures() {
        let (mut config, mut rows) = scenario();
        config.group_by_x = true;
        config.values[0].aggregation = Some(AggregateFunction::Avg);
        rows.get_mut("ds-1").unwrap().push(Row::from([
            ("type".to_string(), CellValue::from("A")),
            ("value".to_string(), CellValue::Integer(30)),
        ]));
        let chart = shape_at(&config, &rows, today()).unwrap();
        assert_eq!(chart.data.len(), 2);
        assert_eq!(chart.data[0]["type"], CellValue::from("A"));
        assert_eq!(chart.data[0]["value"], CellValue::Number(20.0));
        assert_eq!(chart.data[1]["value"], CellValue::Number(20.0));
    }

    #[test]
    fn test_same_measure_twice_keeps_both_aggregates() {
        let (mut config, mut rows) = scenario();
        config.group_by_x = true;
        let mut count = config.values[0].clone();
        count.aggregation = Some(AggregateFunction::Count);
        config.values.push(count);
        rows.insert(
            "ds-1".to_string(),
            vec![
                Row::from([
                    ("type".to_string(), CellValue::from("A")),
                    ("value".to_string(), CellValue::Integer(10)),
                ]),
                Row::from([
                    ("type".to_string(), CellValue::from("A")),
                    ("value".to_string(), CellValue::Integer(30)),
                ]),
            ],
        );
        let chart = shape_at(&config, &rows, today()).unwrap();
        assert_eq!(chart.y_keys, vec!["value", "value_count"]);
        assert_eq!(chart.data.len(), 1);
        assert_eq!(chart.data[0]["value"], CellValue::Number(40.0));
        assert_eq!(chart.data[0]["value_count"], CellValue::Integer(2));
        assert_eq!(chart.y_measure_fields.len(), 2);
    }

    #[test]
    fn test_color_and_size_keys() {
        let (mut config, rows) = scenario();
        config.color_by = Some(config.columns[0].clone());
        config.size_by = Some(config.values[0].clone());
        let chart = shape_at(&config, &rows, today()).unwrap();
        assert_eq!(chart.color_key.as_deref(), Some("type"));
        assert_eq!(chart.size_key.as_deref(), Some("value"));
    }
}
