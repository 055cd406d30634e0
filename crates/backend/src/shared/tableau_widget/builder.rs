//! Widget builder
//!
//! Owns one widget configuration and applies the builder's edits to it:
//! data sources and joins, shelf placements, filters and calculated fields.
//! No edit may leave a shelf or filter pointing at a field that no longer exists.

use contracts::shared::tableau_widget::{
    ActiveFilter, AggregateFunction, CalculatedField, ChartType, DataSource, DroppedField, Field,
    FieldKind, JoinConfig, Row, Shelf, TableauWidgetConfig,
};
use thiserror::Error;

use super::catalog_registry::{available_fields, find_table};
use super::filter_evaluator::distinct_values;

/// Rejected builder edits
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuilderError {
    #[error("Unknown data source: {0}")]
    UnknownDataSource(String),

    #[error("Unknown table {software_id}/{table_id}")]
    UnknownTable {
        software_id: String,
        table_id: String,
    },

    #[error("Field {0} does not belong to this widget")]
    UnknownField(String),

    #[error("Shelf {shelf:?} does not accept {kind:?} fields")]
    ShelfRejected { shelf: Shelf, kind: FieldKind },

    #[error("No field at index {index} on shelf {shelf:?}")]
    IndexOutOfRange { shelf: Shelf, index: usize },

    #[error("Aggregation applies to measures only")]
    AggregationOnDimension,

    #[error("Invalid join: {0}")]
    InvalidJoin(String),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Field {0} is already filtered")]
    DuplicateFilter(String),

    #[error("Unknown calculated field: {0}")]
    UnknownCalculatedField(String),
}

pub type BuilderResult<T> = Result<T, BuilderError>;

/// Editable widget configuration
#[derive(Debug, Clone)]
pub struct WidgetBuilder {
    config: TableauWidgetConfig,
}

impl WidgetBuilder {
    /// Start a new widget
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            config: TableauWidgetConfig::new(title),
        }
    }

    /// Continue editing a stored widget
    pub fn from_config(config: TableauWidgetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TableauWidgetConfig {
        &self.config
    }

    pub fn into_config(self) -> TableauWidgetConfig {
        self.config
    }

    // ------------------------------------------------------------------
    // Data sources & joins
    // ------------------------------------------------------------------

    /// Add an instance of a catalog table
    pub fn add_data_source(
        &mut self,
        software_id: &str,
        table_id: &str,
    ) -> BuilderResult<DataSource> {
        if find_table(software_id, table_id).is_none() {
            return Err(BuilderError::UnknownTable {
                software_id: software_id.to_string(),
                table_id: table_id.to_string(),
            });
        }
        let data_source = DataSource {
            id: uuid::Uuid::new_v4().to_string(),
            software_id: software_id.to_string(),
            table_id: table_id.to_string(),
            alias: None,
        };
        tracing::info!(
            "Widget {}: added data source {} ({}/{})",
            self.config.id,
            data_source.id,
            software_id,
            table_id
        );
        self.config.data_sources.push(data_source.clone());
        Ok(data_source)
    }

    /// Remove a data source together with every placement, filter and join using it
    pub fn remove_data_source(&mut self, id: &str) -> BuilderResult<DataSource> {
        let position = self
            .config
            .data_sources
            .iter()
            .position(|ds| ds.id == id)
            .ok_or_else(|| BuilderError::UnknownDataSource(id.to_string()))?;
        let removed = self.config.data_sources.remove(position);

        self.retain_fields(|field| !field.belongs_to(id));
        self.config.joins.retain(|join| !join.references(id));

        tracing::info!("Widget {}: removed data source {}", self.config.id, id);
        Ok(removed)
    }

    pub fn set_data_source_alias(
        &mut self,
        id: &str,
        alias: Option<String>,
    ) -> BuilderResult<()> {
        let data_source = self
            .config
            .data_sources
            .iter_mut()
            .find(|ds| ds.id == id)
            .ok_or_else(|| BuilderError::UnknownDataSource(id.to_string()))?;
        data_source.alias = alias;
        Ok(())
    }

    /// Replace the declared joins; each one links adjacent data sources on catalog keys
    pub fn set_joins(&mut self, joins: Vec<JoinConfig>) -> BuilderResult<()> {
        for join in &joins {
            check_join(&self.config, join)?;
        }
        self.config.joins = joins;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shelves
    // ------------------------------------------------------------------

    /// Place a field on a shelf; color and size hold a single field
    pub fn drop_field(&mut self, shelf: Shelf, field: Field) -> BuilderResult<()> {
        let field = self.resolve_field(&field)?;
        if !shelf.accepts(field.kind) {
            tracing::warn!(
                "Widget {}: rejected {:?} field {} on {:?}",
                self.config.id,
                field.kind,
                field.id,
                shelf
            );
            return Err(BuilderError::ShelfRejected {
                shelf,
                kind: field.kind,
            });
        }

        let dropped = DroppedField::new(field);
        match shelf {
            Shelf::Columns => self.config.columns.push(dropped),
            Shelf::Rows => self.config.rows.push(dropped),
            Shelf::Values => self.config.values.push(dropped),
            Shelf::Color => self.config.color_by = Some(dropped),
            Shelf::Size => self.config.size_by = Some(dropped),
        }
        Ok(())
    }

    pub fn remove_field(&mut self, shelf: Shelf, index: usize) -> BuilderResult<DroppedField> {
        let out_of_range = BuilderError::IndexOutOfRange { shelf, index };
        let list = match shelf {
            Shelf::Columns => &mut self.config.columns,
            Shelf::Rows => &mut self.config.rows,
            Shelf::Values => &mut self.config.values,
            Shelf::Color | Shelf::Size => {
                let slot = if shelf == Shelf::Color {
                    &mut self.config.color_by
                } else {
                    &mut self.config.size_by
                };
                return match index {
                    0 => slot.take().ok_or(out_of_range),
                    _ => Err(out_of_range),
                };
            }
        };
        if index >= list.len() {
            return Err(out_of_range);
        }
        Ok(list.remove(index))
    }

    pub fn clear_shelf(&mut self, shelf: Shelf) {
        match shelf {
            Shelf::Columns => self.config.columns.clear(),
            Shelf::Rows => self.config.rows.clear(),
            Shelf::Values => self.config.values.clear(),
            Shelf::Color => self.config.color_by = None,
            Shelf::Size => self.config.size_by = None,
        }
    }

    pub fn update_aggregation(
        &mut self,
        shelf: Shelf,
        index: usize,
        aggregation: AggregateFunction,
    ) -> BuilderResult<()> {
        let placement = self.placement_mut(shelf, index)?;
        match placement.field.kind {
            FieldKind::Measure => {
                placement.aggregation = Some(aggregation);
                Ok(())
            }
            FieldKind::Dimension => Err(BuilderError::AggregationOnDimension),
        }
    }

    pub fn set_alias(
        &mut self,
        shelf: Shelf,
        index: usize,
        alias: Option<String>,
    ) -> BuilderResult<()> {
        self.placement_mut(shelf, index)?.alias = alias;
        Ok(())
    }

    fn placement_mut(&mut self, shelf: Shelf, index: usize) -> BuilderResult<&mut DroppedField> {
        let placement = match shelf {
            Shelf::Columns => self.config.columns.get_mut(index),
            Shelf::Rows => self.config.rows.get_mut(index),
            Shelf::Values => self.config.values.get_mut(index),
            Shelf::Color if index == 0 => self.config.color_by.as_mut(),
            Shelf::Size if index == 0 => self.config.size_by.as_mut(),
            Shelf::Color | Shelf::Size => None,
        };
        placement.ok_or(BuilderError::IndexOutOfRange { shelf, index })
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    /// Filter a field, starting fully open over the sample rows
    ///
    /// A field has at most one filter: filtering it again returns the existing one.
    pub fn add_filter(
        &mut self,
        field: Field,
        sample_rows: &[Row],
    ) -> BuilderResult<&ActiveFilter> {
        let field = self.resolve_field(&field)?;
        let filters = &mut self.config.active_filters_snapshot;
        let index = match filters.iter().position(|f| f.field.id == field.id) {
            Some(existing) => existing,
            None => {
                let selected = distinct_values(sample_rows, field.row_key());
                filters.push(ActiveFilter::new(field, selected));
                filters.len() - 1
            }
        };
        Ok(&filters[index])
    }

    /// Replace a filter's settings, matched by id
    ///
    /// The filter may move to another field of the widget, as long as that field is not
    /// filtered yet.
    pub fn update_filter(&mut self, mut filter: ActiveFilter) -> BuilderResult<()> {
        filter.field = self.resolve_field(&filter.field)?;
        let taken = self
            .config
            .active_filters_snapshot
            .iter()
            .any(|f| f.id != filter.id && f.field.id == filter.field.id);
        if taken {
            return Err(BuilderError::DuplicateFilter(filter.field.id.clone()));
        }

        let slot = self
            .config
            .active_filters_snapshot
            .iter_mut()
            .find(|f| f.id == filter.id)
            .ok_or_else(|| BuilderError::UnknownFilter(filter.id.clone()))?;
        *slot = filter;
        Ok(())
    }

    pub fn remove_filter(&mut self, id: &str) -> BuilderResult<ActiveFilter> {
        let filters = &mut self.config.active_filters_snapshot;
        let position = filters
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| BuilderError::UnknownFilter(id.to_string()))?;
        Ok(filters.remove(position))
    }

    pub fn clear_filters(&mut self) {
        self.config.active_filters_snapshot.clear();
    }

    // ------------------------------------------------------------------
    // Calculated fields
    // ------------------------------------------------------------------

    pub fn add_calculated_field(
        &mut self,
        name: impl Into<String>,
        formula: impl Into<String>,
        kind: FieldKind,
    ) -> CalculatedField {
        let calculated = CalculatedField {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            formula: formula.into(),
            kind,
        };
        self.config.calculated_fields.push(calculated.clone());
        calculated
    }

    /// Remove a calculated field and every placement or filter using it
    pub fn remove_calculated_field(&mut self, id: &str) -> BuilderResult<CalculatedField> {
        let position = self
            .config
            .calculated_fields
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| BuilderError::UnknownCalculatedField(id.to_string()))?;
        let removed = self.config.calculated_fields.remove(position);
        self.retain_fields(|field| !field.is_calculated_field(id));
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Presentation
    // ------------------------------------------------------------------

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.config.title = title.into();
    }

    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        self.config.chart_type = chart_type;
    }

    pub fn set_colors(&mut self, colors: Vec<String>) {
        self.config.colors = colors;
    }

    pub fn set_show_legend(&mut self, show: bool) {
        self.config.show_legend = show;
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.config.show_grid = show;
    }

    pub fn set_group_by_x(&mut self, group: bool) {
        self.config.group_by_x = group;
    }

    // ------------------------------------------------------------------

    /// The widget's own copy of a field; kind and data type must match the catalog
    fn resolve_field(&self, field: &Field) -> BuilderResult<Field> {
        available_fields(&self.config)
            .into_iter()
            .find(|f| f.id == field.id && f.kind == field.kind && f.data_type == field.data_type)
            .ok_or_else(|| {
                tracing::warn!(
                    "Widget {}: field {} is not one of its fields",
                    self.config.id,
                    field.id
                );
                BuilderError::UnknownField(field.id.clone())
            })
    }

    /// Drop every placement and filter whose field fails `keep`
    fn retain_fields(&mut self, keep: impl Fn(&Field) -> bool) {
        let config = &mut self.config;
        config.columns.retain(|d| keep(&d.field));
        config.rows.retain(|d| keep(&d.field));
        config.values.retain(|d| keep(&d.field));
        if config.color_by.as_ref().is_some_and(|d| !keep(&d.field)) {
            config.color_by = None;
        }
        if config.size_by.as_ref().is_some_and(|d| !keep(&d.field)) {
            config.size_by = None;
        }
        config.active_filters_snapshot.retain(|f| keep(&f.field));
        config.filters.retain(|f| keep(&f.field));
    }
}

/// Check a join links two adjacent data sources of the config on catalog keys
pub fn check_join(config: &TableauWidgetConfig, join: &JoinConfig) -> BuilderResult<()> {
    let position = |id: &str| config.data_sources.iter().position(|ds| ds.id == id);
    let left = position(&join.left_source)
        .ok_or_else(|| BuilderError::UnknownDataSource(join.left_source.clone()))?;
    let right = position(&join.right_source)
        .ok_or_else(|| BuilderError::UnknownDataSource(join.right_source.clone()))?;

    if left.abs_diff(right) != 1 {
        return Err(BuilderError::InvalidJoin(format!(
            "{} and {} are not adjacent data sources",
            join.left_source, join.right_source
        )));
    }

    for (index, key) in [(left, &join.left_key), (right, &join.right_key)] {
        let ds = &config.data_sources[index];
        let has_key = find_table(&ds.software_id, &ds.table_id)
            .is_some_and(|table| table.fields.iter().any(|f| f.id == key.as_str()));
        if !has_key {
            return Err(BuilderError::InvalidJoin(format!(
                "key '{}' is not a field of {}/{}",
                key, ds.software_id, ds.table_id
            )));
        }
    }
    Ok(())
}
