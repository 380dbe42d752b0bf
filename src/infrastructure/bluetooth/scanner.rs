//! BLE Scanner Module
//!
//! Handles Bluetooth LE device discovery. The grinder firmware does not
//! advertise its service UUID, so discovery matches on the advertised local
//! name instead.

use crate::domain::models::{AppEvent, MessageSeverity, ScannedDevice, StatusMessage};
use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;
use windows::Devices::Bluetooth::Advertisement::{
    BluetoothLEAdvertisementReceivedEventArgs, BluetoothLEAdvertisementWatcher,
    BluetoothLEScanningMode,
};
use windows::Foundation::TypedEventHandler;

/// BLE scanner for discovering the grinder controller
pub struct BleScanner {
    watcher: Option<BluetoothLEAdvertisementWatcher>,
    event_sender: mpsc::UnboundedSender<AppEvent>,
}

impl BleScanner {
    pub fn new(event_sender: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            watcher: None,
            event_sender,
        }
    }

    /// Start scanning for BLE devices
    ///
    /// # Arguments
    /// * `device_name` - The advertised local name to filter for
    /// * `show_all_devices` - If true, report every BLE device regardless of name
    pub fn start(&mut self, device_name: &str, show_all_devices: bool) -> Result<()> {
        // Stop any existing scan
        self.stop()?;

        info!("Starting BLE scan for device name: {:?}", device_name);
        let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
            message: format!("Scanning for {}...", device_name),
            severity: MessageSeverity::Info,
        }));

        let watcher = BluetoothLEAdvertisementWatcher::new()?;
        watcher.SetScanningMode(BluetoothLEScanningMode::Active)?;

        let sender = self.event_sender.clone();
        let target_name = device_name.to_string();

        let handler = TypedEventHandler::new(
            move |_: windows::core::Ref<BluetoothLEAdvertisementWatcher>,
                  args: windows::core::Ref<BluetoothLEAdvertisementReceivedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let adv = args.Advertisement()?;
                    let name = adv.LocalName()?.to_string();

                    if show_all_devices || name == target_name {
                        let address = args.BluetoothAddress()?;
                        let rssi = args.RawSignalStrengthInDBm()?;

                        let device = ScannedDevice {
                            name: if name.is_empty() {
                                "Unknown".to_string()
                            } else {
                                name
                            },
                            address,
                            signal_strength: rssi,
                        };

                        let _ = sender.send(AppEvent::DeviceFound(device));
                    }
                }
                Ok(())
            },
        );

        watcher.Received(&handler)?;
        watcher.Start()?;
        self.watcher = Some(watcher);

        Ok(())
    }

    /// Stop scanning
    pub fn stop(&mut self) -> Result<()> {
        if let Some(watcher) = self.watcher.take() {
            info!("Stopping BLE scan...");
            let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
                message: "Scan stopped.".to_string(),
                severity: MessageSeverity::Info,
            }));
            watcher.Stop()?;
        }
        Ok(())
    }
}

impl Drop for BleScanner {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
