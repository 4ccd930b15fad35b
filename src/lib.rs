mod acquisition;
mod cache;
pub mod datalog;
mod db;
mod hub;
pub mod models;
pub mod parser;
mod pipeline;
pub mod settings;
mod status;

pub use datalog::LogInfo;
pub use hub::SensorHub;
pub use models::{ConnectionStatus, Provenance, Reading, Sample};
pub use settings::Settings;
pub use status::StatusSink;
