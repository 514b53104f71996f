use chrono::TimeDelta;

/// Inbound message buffer size, matching what the companion may send in one batch
pub const INBOUND_CAPACITY: usize = 124;

/// Outbound message buffer size
pub const OUTBOUND_CAPACITY: usize = 124;

/// Largest string a single inbound tuple can carry (count byte + tuple header)
pub const FIELD_CAPACITY: usize = INBOUND_CAPACITY - 1 - 7;

/// Seconds without any field update before a refresh is requested
pub const STALE_SECONDS: i64 = 15;

pub const TICK_INTERVAL_MS: u64 = 1000;

/// Advertised name of the watch face
pub const DEVICE_NAME: &str = "Grid Face";

/// Marks `addr` (least significant byte first) as a BLE random static address.
///
/// The two most significant bits of a static address are always set.
pub const fn random_static_address(mut addr: [u8; 6]) -> [u8; 6] {
    addr[5] |= 0xc0;
    addr
}

pub struct Config {
    /// How long a displayed fix may go without an update before a request is sent
    pub stale_after: TimeDelta,

    /// Period of the request trigger
    pub tick_interval_ms: u64,

    /// Text shown in every display region before the first render
    pub initial_text: &'static str,

    /// Name the companion sees while scanning
    pub device_name: &'static str,

    /// Random static BLE address, least significant byte first
    pub device_address: [u8; 6],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stale_after: TimeDelta::seconds(STALE_SECONDS),
            tick_interval_ms: TICK_INTERVAL_MS,
            initial_text: "Press a button",
            device_name: DEVICE_NAME,
            device_address: random_static_address([0x7e, 0x21, 0x9d, 0x54, 0xb3, 0x16]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_address_sets_top_bits_only() {
        let addr = random_static_address([0x01, 0x02, 0x03, 0x04, 0x05, 0x16]);

        assert_eq!(addr, [0x01, 0x02, 0x03, 0x04, 0x05, 0xd6]);
        assert_eq!(random_static_address(addr), addr);
    }

    #[test]
    fn test_default_identity_is_a_static_address() {
        let config = Config::default();

        assert_eq!(config.device_name, "Grid Face");
        assert_eq!(config.device_address[5] & 0xc0, 0xc0);
        // Random part must be neither all zeros nor all ones
        assert_ne!(config.device_address, [0; 6]);
        assert_ne!(config.device_address, [0xff; 6]);
    }
}
