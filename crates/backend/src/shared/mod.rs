pub mod config;
pub mod row_source;
pub mod tableau_widget;
pub mod widget_store;
