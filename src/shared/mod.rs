pub mod attempts;
pub mod config;
pub mod dirs;
pub mod env_var;
pub mod json;
pub mod logging;
pub mod output;
pub mod table;
pub mod time;
