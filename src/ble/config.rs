use bt_hci::param::{AddrKind, BdAddr};
use trouble_host::{Address, HostResources};

pub const COMPANION_SERVICE_UUID: u128 = 0x5e1b0c1d_7a3e_4c59_9b0e_3f2a6d4c8b01;

/// Room for one tuple dictionary plus the ATT write header
const L2CAP_MTU: usize = crate::config::INBOUND_CAPACITY + 3;
/// Only the paired phone connects
const CONNECTIONS_MAX: usize = 1;
/// Signalling plus ATT
const L2CAP_CHANNELS_MAX: usize = 2;

pub type Resources = HostResources<CONNECTIONS_MAX, L2CAP_CHANNELS_MAX, L2CAP_MTU>;

/// Identity the face advertises to its companion
pub struct Config {
    pub name: &'static str,

    /// Random static address, so no vendor block is claimed
    pub address: Address,
}

impl From<&crate::Config> for Config {
    fn from(config: &crate::Config) -> Self {
        Self {
            name: config.device_name,
            address: Address {
                kind: AddrKind::RANDOM,
                addr: BdAddr::new(config.device_address),
            },
        }
    }
}
