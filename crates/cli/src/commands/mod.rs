pub mod ask;
pub mod ask_marker;
pub mod config_cmd;
pub mod health;
pub mod render;
