use chrono::NaiveDateTime;
use heapless::String;

use crate::config::FIELD_CAPACITY;
use crate::display::Presenter;

pub mod merger;
pub mod staleness;

pub type FieldText = String<FIELD_CAPACITY>;

pub const COORDINATE_PLACEHOLDER: &str = "xxx\u{b0}xx'xx\"X";
pub const GRID_REFERENCE_PLACEHOLDER: &str = "            ";

/// Attributes of the location tracked by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Latitude,
    Longitude,
    GridReference,
}

/// Latest known location as shown on screen.
///
/// Empty or space-prefixed text means "not known yet". A single timestamp
/// covers all fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationState {
    pub latitude: FieldText,
    pub longitude: FieldText,
    pub grid_reference: FieldText,

    /// Time of the most recent field update, `None` until the first one
    pub last_response: Option<NaiveDateTime>,
}

impl LocationState {
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Latitude => &self.latitude,
            Field::Longitude => &self.longitude,
            Field::GridReference => &self.grid_reference,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut FieldText {
        match field {
            Field::Latitude => &mut self.latitude,
            Field::Longitude => &mut self.longitude,
            Field::GridReference => &mut self.grid_reference,
        }
    }
}

impl Default for LocationState {
    fn default() -> Self {
        Self {
            latitude: text(COORDINATE_PLACEHOLDER),
            longitude: text(COORDINATE_PLACEHOLDER),
            grid_reference: text(GRID_REFERENCE_PLACEHOLDER),
            last_response: None,
        }
    }
}

/// Copies `value` into a field, cutting at a character boundary if it is too long
pub fn text(value: &str) -> FieldText {
    let mut text = FieldText::new();

    for c in value.chars() {
        if text.push(c).is_err() {
            warn!("Field text truncated at {} bytes", text.len());
            break;
        }
    }

    text
}

/// Owner of the location state. Every write is passed on to the presenter.
pub struct LocationStore<P: Presenter> {
    state: LocationState,
    presenter: P,
}

impl<P: Presenter> LocationStore<P> {
    pub fn new(presenter: P) -> Self {
        Self {
            state: LocationState::default(),
            presenter,
        }
    }

    pub fn state(&self) -> &LocationState {
        &self.state
    }

    pub fn snapshot(&self) -> LocationState {
        self.state.clone()
    }

    /// Overwrites one field and stamps the whole state with `now`
    pub fn set_field(&mut self, field: Field, value: &str, now: NaiveDateTime) {
        *self.state.field_mut(field) = text(value);
        self.state.last_response = Some(now);

        self.presenter.present(&self.state);
    }

    /// Presents the current state without modifying it
    pub fn refresh(&mut self) {
        self.presenter.present(&self.state);
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::from_unix_seconds;

    /// Presenter that keeps every state it was shown
    #[derive(Default)]
    pub(crate) struct RecordingPresenter {
        pub frames: std::vec::Vec<LocationState>,
    }

    impl Presenter for RecordingPresenter {
        fn present(&mut self, state: &LocationState) {
            self.frames.push(state.clone());
        }
    }

    #[test]
    fn test_starts_with_placeholders() {
        let store = LocationStore::new(RecordingPresenter::default());
        let state = store.state();

        assert_eq!(state.latitude.as_str(), "xxx°xx'xx\"X");
        assert_eq!(state.longitude.as_str(), "xxx°xx'xx\"X");
        assert_eq!(state.grid_reference.as_str(), "            ");
        assert_eq!(state.last_response, None);
        assert!(store.presenter().frames.is_empty());
    }

    #[test]
    fn test_set_field_touches_one_field_and_the_timestamp() {
        let mut store = LocationStore::new(RecordingPresenter::default());
        let before = store.snapshot();

        store.set_field(Field::Latitude, "51°30'26\"N", from_unix_seconds(100));

        let after = store.snapshot();
        assert_eq!(after.latitude.as_str(), "51°30'26\"N");
        assert_eq!(after.longitude, before.longitude);
        assert_eq!(after.grid_reference, before.grid_reference);
        assert_eq!(after.last_response, Some(from_unix_seconds(100)));
    }

    #[test]
    fn test_repeated_update_only_moves_timestamp() {
        let mut store = LocationStore::new(RecordingPresenter::default());

        store.set_field(Field::GridReference, "TQ 305 844", from_unix_seconds(5));
        let once = store.snapshot();
        store.set_field(Field::GridReference, "TQ 305 844", from_unix_seconds(9));
        let twice = store.snapshot();

        assert_eq!(
            LocationState {
                last_response: None,
                ..once
            },
            LocationState {
                last_response: None,
                ..twice.clone()
            }
        );
        assert_eq!(twice.last_response, Some(from_unix_seconds(9)));
    }

    #[test]
    fn test_every_write_is_presented() {
        let mut store = LocationStore::new(RecordingPresenter::default());

        store.set_field(Field::Longitude, "0°7'39\"W", from_unix_seconds(1));
        store.set_field(Field::Longitude, "", from_unix_seconds(2));
        store.refresh();

        let frames = &store.presenter().frames;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].longitude.as_str(), "0°7'39\"W");
        assert_eq!(frames[1].longitude.as_str(), "");
        assert_eq!(frames[2], store.snapshot());
    }

    #[test]
    fn test_oversized_text_is_cut_on_char_boundary() {
        let mut long = std::string::String::new();
        while long.len() < FIELD_CAPACITY - 1 {
            long.push('x');
        }
        long.push('°');

        let cut = text(&long);
        assert_eq!(cut.len(), FIELD_CAPACITY - 1);
        assert!(cut.chars().all(|c| c == 'x'));
    }
}
