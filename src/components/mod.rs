pub mod hierarchy_view;
