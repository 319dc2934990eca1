pub mod app;
pub mod dialog;
pub mod footer;
pub mod header;
pub mod login;
pub mod plugin_list;
pub mod plugin_setting;
