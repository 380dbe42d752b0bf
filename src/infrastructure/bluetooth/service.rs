//! Bluetooth Service Module
//!
//! Main service that coordinates scanning, connection, and write-plan
//! execution for the Granite Grinder. The service is owned by a single
//! worker thread; every device write funnels through [`execute`], one plan
//! at a time, last write wins.
//!
//! [`execute`]: BluetoothService::execute

use crate::domain::commands::{GrinderCharacteristic, WriteOp, WritePlan};
use crate::domain::models::{AppEvent, ConnectionStatus, MessageSeverity, StatusMessage};
use crate::domain::settings::SettingsService;
use crate::infrastructure::bluetooth::{
    connection::{BleConnection, CharacteristicSet, ConnectionResult},
    protocol,
    scanner::BleScanner,
};
use anyhow::Result;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use windows::Devices::Bluetooth::GenericAttributeProfile::{GattCommunicationStatus, GattSession};
use windows::Devices::Bluetooth::{BluetoothConnectionStatus, BluetoothLEDevice};
use windows::Foundation::TypedEventHandler;
use windows::Storage::Streams::DataWriter;

/// Main Bluetooth service coordinating all BLE operations
pub struct BluetoothService {
    device: Option<BluetoothLEDevice>,
    session: Option<GattSession>,
    characteristics: Option<CharacteristicSet>,
    scanner: BleScanner,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    settings: Arc<Mutex<SettingsService>>,
}

impl BluetoothService {
    pub fn new(
        event_sender: mpsc::UnboundedSender<AppEvent>,
        settings: Arc<Mutex<SettingsService>>,
    ) -> Self {
        Self {
            device: None,
            session: None,
            characteristics: None,
            scanner: BleScanner::new(event_sender.clone()),
            event_sender,
            settings,
        }
    }

    /// Start scanning for the grinder
    pub fn start_scan(&mut self) -> Result<()> {
        let (device_name, show_all) = {
            let settings = self
                .settings
                .lock()
                .map_err(|_| anyhow::anyhow!("Lock error"))?;
            let s = settings.get();
            (s.device_name.clone(), s.debug_show_all_devices)
        };

        self.scanner.start(&device_name, show_all)
    }

    /// Stop scanning
    pub fn stop_scan(&mut self) -> Result<()> {
        self.scanner.stop()
    }

    /// Connect to a device by address, resolving the registers against the
    /// configured UUID table.
    pub async fn connect(&mut self, address: u64) -> Result<()> {
        let registers = {
            let settings = self
                .settings
                .lock()
                .map_err(|_| anyhow::anyhow!("Lock error"))?;
            protocol::register_table(&settings.get().register_uuids)?
        };

        let connection = BleConnection::new(self.event_sender.clone());
        let result = connection.connect(address, &registers).await?;

        self.setup_status_handler(&result)?;

        self.device = Some(result.device);
        self.session = result.session;
        self.characteristics = Some(result.characteristics);

        let _ = self
            .event_sender
            .send(AppEvent::ConnectionStatus(ConnectionStatus::Connected));

        Ok(())
    }

    /// Register the connection status change handler
    fn setup_status_handler(&self, result: &ConnectionResult) -> Result<()> {
        let sender = self.event_sender.clone();
        let status_handler =
            TypedEventHandler::new(move |dev: windows::core::Ref<BluetoothLEDevice>, _| {
                if let Some(dev) = dev.as_ref() {
                    if let Ok(status) = dev.ConnectionStatus() {
                        let app_status = match status {
                            BluetoothConnectionStatus::Connected => ConnectionStatus::Connected,
                            BluetoothConnectionStatus::Disconnected => {
                                ConnectionStatus::Disconnected
                            }
                            _ => ConnectionStatus::Error,
                        };
                        let _ = sender.send(AppEvent::ConnectionStatus(app_status));
                    }
                }
                Ok(())
            });
        result.device.ConnectionStatusChanged(&status_handler)?;

        Ok(())
    }

    /// Execute a write plan, one operation at a time. Failed writes are
    /// logged and the rest of the plan still runs (log-and-continue, no
    /// retries).
    pub async fn execute(&self, plan: WritePlan) {
        if self.characteristics.is_none() {
            warn!("Dropping write plan: not connected");
            let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
                message: "Not connected to grinder".to_string(),
                severity: MessageSeverity::Warning,
            }));
            return;
        }

        for op in plan {
            match op {
                WriteOp::Write { target, value } => {
                    if let Err(e) = self.write_byte(target, value).await {
                        warn!("Write to {:?} failed: {}", target, e);
                        let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
                            message: format!("Write to {:?} failed: {}", target, e),
                            severity: MessageSeverity::Error,
                        }));
                    }
                }
                WriteOp::Pause(duration) => {
                    tokio::time::sleep(duration).await;
                }
            }
        }
    }

    /// Write a single raw byte to one grinder register.
    async fn write_byte(&self, target: GrinderCharacteristic, value: u8) -> Result<()> {
        let characteristics = self
            .characteristics
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Not connected"))?;
        let characteristic = characteristics
            .get(target)
            .ok_or_else(|| anyhow::anyhow!("{:?} characteristic not resolved", target))?;

        debug!("Writing {} to {:?}", value, target);

        let writer = DataWriter::new()?;
        writer.WriteByte(value)?;
        let buffer = writer.DetachBuffer()?;

        let status = characteristic.WriteValueAsync(&buffer)?.await?;
        if status != GattCommunicationStatus::Success {
            anyhow::bail!("GATT write returned {:?}", status);
        }
        Ok(())
    }

    /// Disconnect from the current device. Idempotent; disconnecting an
    /// already-closed handle only logs.
    pub fn disconnect(&mut self) {
        if self.device.is_none() {
            debug!("Disconnect requested but no device handle is open");
            return;
        }

        // Release the keep-alive session before closing the device handle
        if let Some(session) = self.session.take() {
            if let Err(e) = session.Close() {
                debug!("GattSession already closed: {}", e);
            }
        }

        if let Some(device) = self.device.take() {
            if let Err(e) = device.Close() {
                info!("Connection already terminated: {}", e);
            }
        }
        self.characteristics = None;

        info!("Disconnected from grinder");
        let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
            message: "Disconnected from grinder".to_string(),
            severity: MessageSeverity::Info,
        }));
        let _ = self
            .event_sender
            .send(AppEvent::ConnectionStatus(ConnectionStatus::Disconnected));
    }
}
