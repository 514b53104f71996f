#[derive(Clone, Debug, defmt::Format)]
pub enum Error {
    GattError,
}
