//! Granite Grinder GATT layout.
//!
//! The firmware exposes eight writable single-byte registers as
//! characteristics with 16-bit aliases expanded onto the Bluetooth SIG base
//! UUID. The UUIDs default to the firmware's fixed aliases but can be
//! overridden per register in the app settings.

use anyhow::Result;
use windows::core::GUID;

use crate::domain::commands::GrinderCharacteristic;
use crate::domain::settings::RegisterUuids;

/// Parse a UUID string into a Windows GUID
pub fn parse_uuid(uuid_str: &str) -> Result<GUID> {
    let uuid_str = uuid_str.replace('-', "");

    if uuid_str.len() != 32 {
        return Err(anyhow::anyhow!("Invalid UUID format"));
    }

    let d1 = u32::from_str_radix(&uuid_str[0..8], 16)?;
    let d2 = u16::from_str_radix(&uuid_str[8..12], 16)?;
    let d3 = u16::from_str_radix(&uuid_str[12..16], 16)?;

    let mut d4 = [0u8; 8];
    for i in 0..8 {
        d4[i] = u8::from_str_radix(&uuid_str[16 + i * 2..18 + i * 2], 16)?;
    }

    Ok(GUID {
        data1: d1,
        data2: d2,
        data3: d3,
        data4: d4,
    })
}

/// Resolve the configured UUID strings into the register table used for
/// characteristic lookup. Fails naming the register whose override does not
/// parse, before any connection is attempted.
pub fn register_table(uuids: &RegisterUuids) -> Result<[(GrinderCharacteristic, GUID); 8]> {
    let mut table = [(GrinderCharacteristic::Speed, GUID::zeroed()); 8];
    for (slot, role) in table.iter_mut().zip(GrinderCharacteristic::ALL) {
        let raw = uuids.get(role);
        let guid = parse_uuid(raw)
            .map_err(|e| anyhow::anyhow!("{:?} UUID override {:?} is invalid: {}", role, raw, e))?;
        *slot = (role, guid);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_expands_aliases_onto_sig_base() {
        let table = register_table(&RegisterUuids::default()).unwrap();
        // 0x1111 -> 00001111-0000-1000-8000-00805f9b34fb
        let (role, guid) = table[0];
        assert_eq!(role, GrinderCharacteristic::Speed);
        assert_eq!(guid.data1, 0x0000_1111);
        assert_eq!(guid.data2, 0x0000);
        assert_eq!(guid.data3, 0x1000);
        assert_eq!(guid.data4, [0x80, 0x00, 0x00, 0x80, 0x5F, 0x9B, 0x34, 0xFB]);
    }

    #[test]
    fn every_register_has_a_distinct_uuid() {
        let table = register_table(&RegisterUuids::default()).unwrap();
        for (i, (_, a)) in table.iter().enumerate() {
            for (_, b) in table.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn table_covers_every_role() {
        let table = register_table(&RegisterUuids::default()).unwrap();
        for role in GrinderCharacteristic::ALL {
            assert!(table.iter().any(|(r, _)| *r == role));
        }
    }

    #[test]
    fn overridden_register_resolves_to_the_override() {
        let mut uuids = RegisterUuids::default();
        uuids.drill = "0000aaaa-0000-1000-8000-00805f9b34fb".to_string();
        let table = register_table(&uuids).unwrap();
        let (_, guid) = table
            .iter()
            .find(|(r, _)| *r == GrinderCharacteristic::Drill)
            .unwrap();
        assert_eq!(guid.data1, 0x0000_AAAA);
    }

    #[test]
    fn malformed_override_is_rejected_naming_the_register() {
        let mut uuids = RegisterUuids::default();
        uuids.cage = "not-a-uuid".to_string();
        let err = register_table(&uuids).unwrap_err();
        assert!(err.to_string().contains("Cage"));
    }
}
