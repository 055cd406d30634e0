use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use contracts::shared::tableau_widget::{
    AddFilterRequest, AddFilterResponse, DashboardWidget, DeleteWidgetResponse, FieldSource,
    ListWidgetsResponse, ReorderWidgetsRequest, ResizeWidgetRequest, Row, SaveWidgetResponse,
    ShapeRequest, ShapeResponse, TableauWidgetConfig,
};

use crate::api::state::AppState;
use crate::shared::row_source::rows_by_source;
use crate::shared::tableau_widget::{available_fields, render_payload, shape, WidgetBuilder};
use crate::shared::widget_store::StoreError;

fn status_for(error: &StoreError) -> StatusCode {
    match error {
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Io(_)
        | StoreError::Serde(_)
        | StoreError::Poisoned
        | StoreError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn log_failure(action: &str, error: &StoreError) -> StatusCode {
    let status = status_for(error);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Widgets: Failed to {}: {}", action, error);
    } else {
        tracing::warn!("Widgets: Failed to {}: {}", action, error);
    }
    status
}

fn shape_response(config: &TableauWidgetConfig, rows: &HashMap<String, Vec<Row>>) -> ShapeResponse {
    let chart = shape(config, rows);
    let payload = chart
        .as_ref()
        .map(|chart| render_payload(config.chart_type, chart));
    ShapeResponse { chart, payload }
}

/// POST /api/widgets/shape
/// Shape a configuration against rows supplied in the request
pub async fn shape_widget(Json(request): Json<ShapeRequest>) -> Json<ShapeResponse> {
    tracing::info!(
        "Widgets: Shaping widget {} ({} row sets)",
        request.config.id,
        request.rows.len()
    );
    Json(shape_response(&request.config, &request.rows))
}

/// POST /api/widgets/filters
/// Filter a field, seeding the selectable values from its data source's rows
pub async fn add_filter(
    State(state): State<AppState>,
    Json(request): Json<AddFilterRequest>,
) -> Result<Json<AddFilterResponse>, StatusCode> {
    let AddFilterRequest { config, field_id } = request;
    tracing::info!("Widgets: Adding filter on {} to widget {}", field_id, config.id);

    let Some(field) = available_fields(&config)
        .into_iter()
        .find(|f| f.id == field_id)
    else {
        tracing::warn!("Widgets: Field {} is not available in widget {}", field_id, config.id);
        return Err(StatusCode::BAD_REQUEST);
    };

    // calculated fields have no rows to sample
    let data_source = match &field.source {
        FieldSource::Catalog { data_source_id, .. } => config.data_source(data_source_id).cloned(),
        FieldSource::Calculated { .. } => None,
    };
    let sample = match data_source {
        Some(data_source) => {
            let source = state.rows();
            tokio::task::spawn_blocking(move || source.rows_for(&data_source))
                .await
                .map_err(|e| {
                    tracing::error!("Widgets: Sample rows task failed: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR
                })?
                .map_err(|e| {
                    tracing::error!("Widgets: Failed to load sample rows: {:#}", e);
                    StatusCode::INTERNAL_SERVER_ERROR
                })?
        }
        None => Vec::new(),
    };

    let mut builder = WidgetBuilder::from_config(config);
    let filter_id = builder
        .add_filter(field, &sample)
        .map(|filter| filter.id.clone())
        .map_err(|e| {
            tracing::warn!("Widgets: Failed to add filter: {}", e);
            StatusCode::BAD_REQUEST
        })?;

    Ok(Json(AddFilterResponse {
        config: builder.into_config(),
        filter_id,
    }))
}

/// GET /api/widgets
/// List the dashboard's widgets in display order
pub async fn list_widgets(
    State(state): State<AppState>,
) -> Result<Json<ListWidgetsResponse>, StatusCode> {
    let widgets = state
        .read(|store| store.list().to_vec())
        .map_err(|e| log_failure("list widgets", &e))?;
    tracing::info!("Widgets: Returning {} widgets", widgets.len());
    Ok(Json(ListWidgetsResponse { widgets }))
}

/// GET /api/widgets/:id
pub async fn get_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DashboardWidget>, StatusCode> {
    tracing::info!("Widgets: Getting widget: {}", id);
    state
        .read(|store| store.get(&id).cloned())
        .map_err(|e| log_failure("get widget", &e))?
        .map(Json)
        .ok_or_else(|| {
            tracing::warn!("Widgets: Widget not found: {}", id);
            StatusCode::NOT_FOUND
        })
}

/// POST /api/widgets
/// Save a new widget (or replace the one with the same id)
pub async fn save_widget(
    State(state): State<AppState>,
    Json(config): Json<TableauWidgetConfig>,
) -> Result<Json<SaveWidgetResponse>, StatusCode> {
    tracing::info!("Widgets: Saving widget: {}", config.title);
    let id = state
        .edit(move |store| store.save(config).map(|w| w.config.id.clone()))
        .await
        .map_err(|e| log_failure("save widget", &e))?;
    tracing::info!("Widgets: Saved widget with ID: {}", id);
    Ok(Json(SaveWidgetResponse {
        id,
        message: "Widget saved successfully".to_string(),
    }))
}

/// PUT /api/widgets/:id
pub async fn update_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut config): Json<TableauWidgetConfig>,
) -> Result<Json<SaveWidgetResponse>, StatusCode> {
    tracing::info!("Widgets: Updating widget: {}", id);
    config.id = id.clone();
    let target = id.clone();
    state
        .edit(move |store| {
            if store.get(&target).is_none() {
                return Err(StoreError::NotFound(target));
            }
            store.save(config).map(|_| ())
        })
        .await
        .map_err(|e| log_failure("update widget", &e))?;
    Ok(Json(SaveWidgetResponse {
        id,
        message: "Widget updated successfully".to_string(),
    }))
}

/// DELETE /api/widgets/:id
pub async fn delete_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteWidgetResponse>, StatusCode> {
    tracing::info!("Widgets: Deleting widget: {}", id);
    state
        .edit(move |store| store.remove(&id).map(|_| ()))
        .await
        .map_err(|e| log_failure("delete widget", &e))?;
    Ok(Json(DeleteWidgetResponse {
        success: true,
        message: "Widget deleted successfully".to_string(),
    }))
}

/// PUT /api/widgets/:id/size
pub async fn resize_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ResizeWidgetRequest>,
) -> Result<StatusCode, StatusCode> {
    tracing::info!(
        "Widgets: Resizing widget {} to {}x{}",
        id,
        request.size.width,
        request.size.height
    );
    state
        .edit(move |store| store.resize(&id, request.size))
        .await
        .map_err(|e| log_failure("resize widget", &e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/widgets/order
pub async fn reorder_widgets(
    State(state): State<AppState>,
    Json(request): Json<ReorderWidgetsRequest>,
) -> Result<StatusCode, StatusCode> {
    tracing::info!("Widgets: Reordering {} widgets", request.ids.len());
    state
        .edit(move |store| store.reorder(&request.ids))
        .await
        .map_err(|e| log_failure("reorder widgets", &e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/widgets/:id/chart
/// Load the rows of a stored widget's data sources and shape them
pub async fn widget_chart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ShapeResponse>, StatusCode> {
    tracing::info!("Widgets: Building chart for widget: {}", id);
    let config = state
        .read(|store| store.get(&id).map(|w| w.config.clone()))
        .map_err(|e| log_failure("read widget", &e))?
        .ok_or(StatusCode::NOT_FOUND)?;

    let source = state.rows();
    let response = tokio::task::spawn_blocking(move || {
        rows_by_source(&config, source.as_ref()).map(|rows| shape_response(&config, &rows))
    })
    .await
    .map_err(|e| {
        tracing::error!("Widgets: Chart task failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        tracing::error!("Widgets: Failed to load rows for widget {}: {:#}", id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(response))
}
