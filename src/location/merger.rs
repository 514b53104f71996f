use chrono::NaiveDateTime;

use super::{Field, LocationStore};
use crate::display::Presenter;
use crate::message::dictionary::DictionaryReader;
use crate::message::{DictionaryError, FieldUpdate};

/// Outcome of merging one inbound batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MergeReport {
    /// Fields written to the store
    pub applied: u8,
    /// Reserved or unrecognized tuples that were skipped
    pub ignored: u8,
}

/// A batch that failed part-way. Whatever `report` counts stays applied.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MergeError {
    pub error: DictionaryError,
    pub report: MergeReport,
}

/// Routes inbound tuples into the location store, one field per call
#[derive(Debug, Default)]
pub struct UpdateMerger;

impl UpdateMerger {
    pub fn new() -> Self {
        Self
    }

    /// Applies a single decoded update. Returns whether the store changed.
    pub fn apply<P: Presenter>(
        &self,
        store: &mut LocationStore<P>,
        update: FieldUpdate,
        now: NaiveDateTime,
    ) -> bool {
        let (field, value) = match update {
            FieldUpdate::Latitude(value) => (Field::Latitude, value),
            FieldUpdate::Longitude(value) => (Field::Longitude, value),
            FieldUpdate::GridReference(value) => {
                info!("Got reference = >{}<", value);
                (Field::GridReference, value)
            }
            FieldUpdate::Accuracy(_)
            | FieldUpdate::Heading(_)
            | FieldUpdate::Speed(_)
            | FieldUpdate::Reserved(_) => {
                debug!("Ignoring reserved field {:?}", update);
                return false;
            }
        };

        debug!("Applying {:?} = {}", field, value);
        store.set_field(field, value, now);

        true
    }

    /// Decodes a payload and applies its tuples in arrival order.
    ///
    /// Unknown keys are skipped. Decoding stops at the first malformed tuple;
    /// fields applied before it are kept.
    pub fn merge<P: Presenter>(
        &self,
        store: &mut LocationStore<P>,
        payload: &[u8],
        now: NaiveDateTime,
    ) -> Result<MergeReport, MergeError> {
        let mut report = MergeReport::default();

        let reader = DictionaryReader::new(payload).map_err(|error| MergeError { error, report })?;

        for tuple in reader {
            let update = tuple.and_then(FieldUpdate::try_from);

            match update {
                Ok(update) => {
                    if self.apply(store, update, now) {
                        report.applied += 1;
                    } else {
                        report.ignored += 1;
                    }
                }
                Err(DictionaryError::UnknownKey(key)) => {
                    debug!("Skipping unrecognized key {}", key);
                    report.ignored += 1;
                }
                Err(error) => return Err(MergeError { error, report }),
            }
        }

        Ok(report)
    }
}
