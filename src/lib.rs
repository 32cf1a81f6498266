pub mod checker;
pub mod config;
pub mod external_data;
pub mod logging;
pub mod manifest;
pub mod runner;
pub mod version;
