pub mod commands;
pub mod models;
pub mod params;
pub mod settings;
