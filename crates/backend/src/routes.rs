use axum::{
    routing::{get, post, put},
    Router,
};

use crate::api::handlers::{catalog, tableau_widget};
use crate::api::state::AppState;

/// All application routes
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // Catalog
        .route("/api/catalog/softwares", get(catalog::list_catalog))
        .route("/api/widgets/fields", post(catalog::list_available_fields))
        // Shaping
        .route("/api/widgets/shape", post(tableau_widget::shape_widget))
        .route("/api/widgets/filters", post(tableau_widget::add_filter))
        // Dashboard widgets
        .route(
            "/api/widgets",
            get(tableau_widget::list_widgets).post(tableau_widget::save_widget),
        )
        .route("/api/widgets/order", put(tableau_widget::reorder_widgets))
        .route(
            "/api/widgets/:id",
            get(tableau_widget::get_widget)
                .put(tableau_widget::update_widget)
                .delete(tableau_widget::delete_widget),
        )
        .route("/api/widgets/:id/size", put(tableau_widget::resize_widget))
        .route("/api/widgets/:id/chart", get(tableau_widget::widget_chart))
        .with_state(state)
}
