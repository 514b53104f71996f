use trouble_host::prelude::gatt_service;

use super::config::COMPANION_SERVICE_UUID;
use super::REQUEST_SIZE;
use crate::config::INBOUND_CAPACITY;

#[gatt_service(uuid = COMPANION_SERVICE_UUID)]
pub struct CompanionService {
    /// Tuple dictionary written by the companion, zero padded
    #[characteristic(uuid = "5e1b0c1e-7a3e-4c59-9b0e-3f2a6d4c8b01", write)]
    pub location: [u8; INBOUND_CAPACITY],

    /// Location request dictionary notified to the companion
    #[characteristic(uuid = "5e1b0c1f-7a3e-4c59-9b0e-3f2a6d4c8b01", read, notify)]
    pub request: [u8; REQUEST_SIZE],
}
