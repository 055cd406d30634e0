//! Dashboard widget store
//!
//! Holds the dashboard's widget list with an explicit lifecycle:
//! `load` from a [`WidgetStorage`], mutate in memory, `persist` back.

pub mod storage;

use chrono::Utc;
use contracts::shared::tableau_widget::{DashboardWidget, TableauWidgetConfig, WidgetSize};
use thiserror::Error;

use crate::shared::tableau_widget::builder::check_join;
use crate::shared::tableau_widget::catalog_registry::{available_fields, find_table};

pub use storage::{JsonFileStorage, MemoryStorage, WidgetStorage};

/// Pre-save checks on a widget
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetValidationError {
    #[error("Widget title is required")]
    MissingTitle,

    #[error("Widget needs at least one data source")]
    NoDataSources,

    #[error("Unknown table {software_id}/{table_id}")]
    UnknownTable {
        software_id: String,
        table_id: String,
    },

    #[error("Field {0} does not belong to this widget")]
    UnknownField(String),

    #[error("Invalid join: {0}")]
    InvalidJoin(String),
}

/// Widget store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage format error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Widget not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] WidgetValidationError),

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Check a widget can be saved
pub fn validate_widget(config: &TableauWidgetConfig) -> Result<(), WidgetValidationError> {
    if config.title.trim().is_empty() {
        return Err(WidgetValidationError::MissingTitle);
    }
    if config.data_sources.is_empty() {
        return Err(WidgetValidationError::NoDataSources);
    }
    if let Some(ds) = config
        .data_sources
        .iter()
        .find(|ds| find_table(&ds.software_id, &ds.table_id).is_none())
    {
        return Err(WidgetValidationError::UnknownTable {
            software_id: ds.software_id.clone(),
            table_id: ds.table_id.clone(),
        });
    }

    // every shelf and filter field must be one of the widget's own fields
    let fields = available_fields(config);
    let dangling = config
        .referenced_fields()
        .chain(config.filters.iter().map(|f| &f.field))
        .find(|field| {
            !fields.iter().any(|f| {
                f.id == field.id && f.kind == field.kind && f.data_type == field.data_type
            })
        });
    if let Some(field) = dangling {
        return Err(WidgetValidationError::UnknownField(field.id.clone()));
    }

    for join in &config.joins {
        check_join(config, join)
            .map_err(|e| WidgetValidationError::InvalidJoin(e.to_string()))?;
    }
    Ok(())
}

/// The dashboard's widgets, in display order
#[derive(Debug, Clone, Default)]
pub struct DashboardStore {
    widgets: Vec<DashboardWidget>,
}

impl DashboardStore {
    pub fn load(storage: &dyn WidgetStorage) -> Result<Self, StoreError> {
        let mut widgets = storage.load()?;
        widgets.sort_by_key(|w| w.order);
        tracing::info!("Widget store: loaded {} widgets", widgets.len());
        let mut store = Self { widgets };
        store.renumber();
        Ok(store)
    }

    pub fn persist(&self, storage: &dyn WidgetStorage) -> Result<(), StoreError> {
        storage.persist(&self.widgets)?;
        tracing::debug!("Widget store: persisted {} widgets", self.widgets.len());
        Ok(())
    }

    pub fn list(&self) -> &[DashboardWidget] {
        &self.widgets
    }

    pub fn get(&self, id: &str) -> Option<&DashboardWidget> {
        self.widgets.iter().find(|w| w.config.id == id)
    }

    /// Insert or replace a widget; new widgets go to the end of the dashboard
    pub fn save(
        &mut self,
        mut config: TableauWidgetConfig,
    ) -> Result<&DashboardWidget, StoreError> {
        validate_widget(&config)?;
        if config.id.trim().is_empty() {
            config.id = uuid::Uuid::new_v4().to_string();
        }
        let now = Utc::now().to_rfc3339();

        let index = match self.widgets.iter().position(|w| w.config.id == config.id) {
            Some(index) => {
                let widget = &mut self.widgets[index];
                widget.config = config;
                widget.updated_at = now;
                index
            }
            None => {
                self.widgets.push(DashboardWidget {
                    config,
                    size: WidgetSize::default(),
                    order: self.widgets.len(),
                    created_at: now.clone(),
                    updated_at: now,
                });
                self.widgets.len() - 1
            }
        };
        Ok(&self.widgets[index])
    }

    pub fn remove(&mut self, id: &str) -> Result<DashboardWidget, StoreError> {
        let index = self.index_of(id)?;
        let removed = self.widgets.remove(index);
        self.renumber();
        Ok(removed)
    }

    pub fn resize(&mut self, id: &str, size: WidgetSize) -> Result<(), StoreError> {
        let index = self.index_of(id)?;
        self.widgets[index].size = size;
        Ok(())
    }

    /// Move the listed widgets to the front in the given order; the rest keep their order
    pub fn reorder(&mut self, ids: &[String]) -> Result<(), StoreError> {
        for id in ids {
            self.index_of(id)?;
        }
        let mut ordered = Vec::with_capacity(self.widgets.len());
        for id in ids {
            if let Some(index) = self.widgets.iter().position(|w| &w.config.id == id) {
                ordered.push(self.widgets.remove(index));
            }
        }
        ordered.append(&mut self.widgets);
        self.widgets = ordered;
        self.renumber();
        Ok(())
    }

    fn index_of(&self, id: &str) -> Result<usize, StoreError> {
        self.widgets
            .iter()
            .position(|w| w.config.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn renumber(&mut self) {
        for (order, widget) in self.widgets.iter_mut().enumerate() {
            widget.order = order;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::tableau_widget::{
        ActiveFilter, DataSource, DroppedField, FieldKind, JoinConfig, JoinType,
    };

    use crate::shared::tableau_widget::catalog_registry::fields_for_data_source;

    fn widget(title: &str) -> TableauWidgetConfig {
        let mut config = TableauWidgetConfig::new(title);
        config.data_sources.push(DataSource {
            id: format!("ds-{}", title),
            software_id: "sales".to_string(),
            table_id: "sales_summary".to_string(),
            alias: None,
        });
        config
    }

    fn ids(store: &DashboardStore) -> Vec<String> {
        store.list().iter().map(|w| w.config.title.clone()).collect()
    }

    #[test]
    fn test_save_requires_title_and_data_source() {
        let mut store = DashboardStore::default();
        let untitled = widget("  ");
        assert!(matches!(
            store.save(untitled),
            Err(StoreError::Validation(WidgetValidationError::MissingTitle))
        ));
        let mut no_sources = widget("Sales");
        no_sources.data_sources.clear();
        assert!(matches!(
            store.save(no_sources),
            Err(StoreError::Validation(WidgetValidationError::NoDataSources))
        ));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_save_rejects_uncatalogued_tables() {
        let mut store = DashboardStore::default();
        let mut config = widget("Escape");
        config.data_sources[0].software_id = "..".to_string();
        config.data_sources[0].table_id = "secret".to_string();
        assert!(matches!(
            store.save(config),
            Err(StoreError::Validation(WidgetValidationError::UnknownTable { .. }))
        ));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_save_rejects_fields_of_missing_sources() {
        let mut store = DashboardStore::default();
        let config = widget("Sales");
        let ghost = DataSource {
            id: "ghost".to_string(),
            software_id: "sales".to_string(),
            table_id: "sales_summary".to_string(),
            alias: None,
        };
        let ghost_type = fields_for_data_source(&ghost).remove(0);

        let mut on_shelf = config.clone();
        on_shelf.columns.push(DroppedField::new(ghost_type.clone()));
        assert!(matches!(
            store.save(on_shelf),
            Err(StoreError::Validation(WidgetValidationError::UnknownField(_)))
        ));

        let mut filtered = config.clone();
        filtered
            .active_filters_snapshot
            .push(ActiveFilter::new(ghost_type.clone(), vec![]));
        assert!(matches!(
            store.save(filtered),
            Err(StoreError::Validation(WidgetValidationError::UnknownField(_)))
        ));

        let mut relabeled = config.clone();
        let mut value = fields_for_data_source(&relabeled.data_sources[0]).remove(1);
        value.kind = FieldKind::Dimension;
        relabeled.color_by = Some(DroppedField::new(value));
        assert!(store.save(relabeled).is_err());

        let mut valid = config;
        let own_type = fields_for_data_source(&valid.data_sources[0]).remove(0);
        valid.columns.push(DroppedField::new(own_type));
        assert!(store.save(valid).is_ok());
    }

    #[test]
    fn test_save_rejects_invalid_joins() {
        let mut store = DashboardStore::default();
        let mut config = widget("Joined");
        config.data_sources.push(DataSource {
            id: "ds-customers".to_string(),
            software_id: "crm".to_string(),
            table_id: "customers".to_string(),
            alias: None,
        });
        let join = JoinConfig {
            left_source: config.data_sources[0].id.clone(),
            right_source: "ds-customers".to_string(),
            left_key: "type".to_string(),
            right_key: "customer_id".to_string(),
            join_type: JoinType::Inner,
        };

        let mut bad_key = config.clone();
        bad_key.joins.push(JoinConfig {
            right_key: "nope".to_string(),
            ..join.clone()
        });
        assert!(matches!(
            store.save(bad_key),
            Err(StoreError::Validation(WidgetValidationError::InvalidJoin(_)))
        ));

        let mut unknown_side = config.clone();
        unknown_side.joins.push(JoinConfig {
            right_source: "ghost".to_string(),
            ..join.clone()
        });
        assert!(store.save(unknown_side).is_err());

        config.joins.push(join);
        assert!(store.save(config).is_ok());
    }

    #[test]
    fn test_save_inserts_then_replaces() {
        let mut store = DashboardStore::default();
        let mut config = widget("Sales");
        config.id = String::new();
        let id = store.save(config).unwrap().config.id.clone();
        assert!(!id.is_empty());

        let mut updated = store.get(&id).unwrap().config.clone();
        updated.title = "Sales by branch".to_string();
        store.save(updated).unwrap();
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.get(&id).unwrap().config.title, "Sales by branch");
    }

    #[test]
    fn test_resize_remove_and_reorder() {
        let mut store = DashboardStore::default();
        let a = store.save(widget("a")).unwrap().config.id.clone();
        let b = store.save(widget("b")).unwrap().config.id.clone();
        let c = store.save(widget("c")).unwrap().config.id.clone();

        store
            .resize(&b, WidgetSize { width: 12, height: 8 })
            .unwrap();
        assert_eq!(store.get(&b).unwrap().size.width, 12);

        store.reorder(&[c.clone(), a.clone()]).unwrap();
        assert_eq!(ids(&store), vec!["c", "a", "b"]);
        assert_eq!(store.get(&b).unwrap().order, 2);

        assert!(matches!(
            store.reorder(&["missing".to_string()]),
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(ids(&store), vec!["c", "a", "b"]);

        store.remove(&a).unwrap();
        assert_eq!(ids(&store), vec!["c", "b"]);
        assert_eq!(store.get(&b).unwrap().order, 1);
        assert!(matches!(store.remove(&a), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_load_mutate_persist_with_memory_storage() {
        let storage = MemoryStorage::new();
        let mut store = DashboardStore::load(&storage).unwrap();
        store.save(widget("Sales")).unwrap();
        store.persist(&storage).unwrap();

        let reloaded = DashboardStore::load(&storage).unwrap();
        assert_eq!(reloaded.list(), store.list());
    }

    #[test]
    fn test_json_file_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!("widget-store-{}", uuid::Uuid::new_v4()));
        let storage = JsonFileStorage::new(dir.join("nested").join("widgets.json"));

        let mut store = DashboardStore::load(&storage).unwrap();
        assert!(store.list().is_empty());
        store.save(widget("Sales")).unwrap();
        store.save(widget("Stock")).unwrap();
        store.persist(&storage).unwrap();

        let reloaded = DashboardStore::load(&storage).unwrap();
        assert_eq!(ids(&reloaded), vec!["Sales", "Stock"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
