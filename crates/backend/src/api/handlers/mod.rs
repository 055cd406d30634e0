pub mod catalog;
pub mod tableau_widget;
