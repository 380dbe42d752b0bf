//! BLE Connection Module
//!
//! Handles device connection and resolution of the grinder's writable
//! registers into a [`CharacteristicSet`].

use std::collections::HashMap;

use crate::domain::commands::GrinderCharacteristic;
use crate::domain::models::{AppEvent, MessageSeverity, StatusMessage};
use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};
use windows::core::GUID;
use windows::Devices::Bluetooth::BluetoothLEDevice;
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattCommunicationStatus, GattDeviceService, GattSession,
};

/// The resolved characteristic handles, one per grinder register.
pub struct CharacteristicSet {
    characteristics: HashMap<GrinderCharacteristic, GattCharacteristic>,
}

impl CharacteristicSet {
    pub fn get(&self, role: GrinderCharacteristic) -> Option<&GattCharacteristic> {
        self.characteristics.get(&role)
    }
}

/// Result of a successful connection. The session must stay alive for as
/// long as the connection is held; it is released on disconnect.
pub struct ConnectionResult {
    pub device: BluetoothLEDevice,
    pub session: Option<GattSession>,
    pub characteristics: CharacteristicSet,
}

/// BLE Connection handler
pub struct BleConnection {
    event_sender: mpsc::UnboundedSender<AppEvent>,
}

impl BleConnection {
    pub fn new(event_sender: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { event_sender }
    }

    /// Connect to a device by Bluetooth address and resolve all eight
    /// grinder registers against the given UUID table.
    pub async fn connect(
        &self,
        address: u64,
        registers: &[(GrinderCharacteristic, GUID); 8],
    ) -> Result<ConnectionResult> {
        info!("Connecting to Bluetooth device: {:#X}", address);
        self.send_log("Connecting to grinder...", MessageSeverity::Info);

        // Step 1: Connect to BLE device
        let device = BluetoothLEDevice::FromBluetoothAddressAsync(address)?.await?;
        info!("Device connected: {:?}", device.Name()?);

        // Step 2: Create GattSession to maintain connection
        let session = match self.create_gatt_session(&device).await {
            Ok(session) => {
                info!("GattSession created, MaintainConnection set to true");
                Some(session)
            }
            Err(e) => {
                warn!("Failed to create GattSession, continuing anyway: {}", e);
                None
            }
        };

        // Step 3: Find the grinder service and resolve its registers
        let speed_uuid = registers
            .iter()
            .find(|(role, _)| *role == GrinderCharacteristic::Speed)
            .map(|(_, uuid)| *uuid)
            .ok_or_else(|| anyhow::anyhow!("Register table is missing the Speed role"))?;
        let service = self.find_grinder_service(&device, speed_uuid).await?;
        let characteristics = self.resolve_registers(&service, registers).await?;

        self.send_log("Connection established!", MessageSeverity::Success);

        Ok(ConnectionResult {
            device,
            session,
            characteristics,
        })
    }

    /// Create a GattSession to maintain the BLE connection
    async fn create_gatt_session(&self, device: &BluetoothLEDevice) -> Result<GattSession> {
        let device_id = device.BluetoothDeviceId()?;
        let session = GattSession::FromDeviceIdAsync(&device_id)?.await?;
        session.SetMaintainConnection(true)?;
        Ok(session)
    }

    /// The firmware does not advertise a stable service UUID, so the grinder
    /// service is identified as the one carrying the Speed register.
    async fn find_grinder_service(
        &self,
        device: &BluetoothLEDevice,
        speed_uuid: GUID,
    ) -> Result<GattDeviceService> {
        let services_result = device.GetGattServicesAsync()?.await?;

        if services_result.Status()? != GattCommunicationStatus::Success {
            anyhow::bail!("Failed to get GATT services");
        }

        let services = services_result.Services()?;
        info!("Found {} services", services.Size()?);

        for i in 0..services.Size()? {
            let service = services.GetAt(i)?;
            let chars_result = service.GetCharacteristicsForUuidAsync(speed_uuid)?.await?;
            if chars_result.Status()? == GattCommunicationStatus::Success
                && chars_result.Characteristics()?.Size()? > 0
            {
                info!("Found grinder service");

                // Request access before enumerating the rest of the registers
                let access_status = service.RequestAccessAsync()?.await?;
                info!("Service access status: {:?}", access_status);

                return Ok(service);
            }
        }

        anyhow::bail!("Grinder service not found on device")
    }

    /// Resolve all eight registers from the grinder service.
    async fn resolve_registers(
        &self,
        service: &GattDeviceService,
        registers: &[(GrinderCharacteristic, GUID); 8],
    ) -> Result<CharacteristicSet> {
        let chars_result = service.GetCharacteristicsAsync()?.await?;
        if chars_result.Status()? != GattCommunicationStatus::Success {
            anyhow::bail!("Failed to get characteristics");
        }

        let characteristics = chars_result.Characteristics()?;
        info!("Found {} characteristics", characteristics.Size()?);

        let mut resolved = HashMap::new();
        for i in 0..characteristics.Size()? {
            let c = characteristics.GetAt(i)?;
            let uuid = c.Uuid()?;
            if let Some((role, _)) = registers.iter().find(|(_, u)| *u == uuid) {
                resolved.insert(*role, c);
            }
        }

        for (role, _) in registers {
            if !resolved.contains_key(role) {
                anyhow::bail!("{:?} characteristic not found", role);
            }
        }

        Ok(CharacteristicSet {
            characteristics: resolved,
        })
    }

    fn send_log(&self, message: &str, severity: MessageSeverity) {
        let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
            message: message.to_string(),
            severity,
        }));
    }
}
