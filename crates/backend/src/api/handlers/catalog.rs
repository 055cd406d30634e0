use axum::Json;
use contracts::shared::tableau_widget::{
    AvailableFieldsRequest, AvailableFieldsResponse, ListSoftwaresResponse,
};

use crate::shared::tableau_widget::{available_fields, list_softwares};

/// GET /api/catalog/softwares
/// List the softwares, tables and fields widgets can be built from
pub async fn list_catalog() -> Json<ListSoftwaresResponse> {
    tracing::info!("Catalog: Listing softwares");
    Json(ListSoftwaresResponse {
        softwares: list_softwares(),
    })
}

/// POST /api/widgets/fields
/// Fields selectable in a widget configuration
pub async fn list_available_fields(
    Json(request): Json<AvailableFieldsRequest>,
) -> Json<AvailableFieldsResponse> {
    let fields = available_fields(&request.config);
    tracing::info!(
        "Catalog: {} fields available for widget {}",
        fields.len(),
        request.config.id
    );
    Json(AvailableFieldsResponse { fields })
}
