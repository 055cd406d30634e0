use std::path::{Path, PathBuf};
use std::sync::Mutex;

use contracts::shared::tableau_widget::DashboardWidget;

use super::StoreError;

/// Backing storage of the dashboard's widget list
pub trait WidgetStorage: Send + Sync {
    fn load(&self) -> Result<Vec<DashboardWidget>, StoreError>;
    fn persist(&self, widgets: &[DashboardWidget]) -> Result<(), StoreError>;
}

/// Widgets kept as a pretty-printed JSON array on disk
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WidgetStorage for JsonFileStorage {
    fn load(&self) -> Result<Vec<DashboardWidget>, StoreError> {
        if !self.path.exists() {
            tracing::info!(
                "Widget storage {} not found, starting with an empty dashboard",
                self.path.display()
            );
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn persist(&self, widgets: &[DashboardWidget]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(widgets)?;
        // Write next to the target first so a failed write keeps the old file
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// In-process storage
#[derive(Default)]
pub struct MemoryStorage {
    widgets: Mutex<Vec<DashboardWidget>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WidgetStorage for MemoryStorage {
    fn load(&self) -> Result<Vec<DashboardWidget>, StoreError> {
        Ok(self
            .widgets
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .clone())
    }

    fn persist(&self, widgets: &[DashboardWidget]) -> Result<(), StoreError> {
        *self.widgets.lock().map_err(|_| StoreError::Poisoned)? = widgets.to_vec();
        Ok(())
    }
}
