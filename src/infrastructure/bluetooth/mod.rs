//! Bluetooth Module
//!
//! Provides BLE communication with the Granite Grinder peripheral.
//!
//! ## Modules
//!
//! - [`protocol`] - GATT register layout; UUID parsing and override resolution
//! - [`scanner`] - BLE device discovery by advertised name
//! - [`connection`] - Device connection and characteristic resolution
//! - [`service`] - Main service coordinator; executes write plans

pub mod connection;
pub mod protocol;
pub mod scanner;
pub mod service;

// Re-export main service for convenience
pub use service::BluetoothService;
