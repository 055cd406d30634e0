pub mod tableau_widget;
