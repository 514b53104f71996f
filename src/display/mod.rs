use crate::location::{text, Field, FieldText, LocationState};

#[cfg(feature = "esp32")]
pub mod device;

/// Text areas of the location screen, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Region {
    GridReference,
    Latitude,
    Longitude,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::GridReference, Region::Latitude, Region::Longitude];

    /// Store field shown in this region
    pub const fn field(self) -> Field {
        match self {
            Region::GridReference => Field::GridReference,
            Region::Latitude => Field::Latitude,
            Region::Longitude => Field::Longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    Init,
    Draw,
    Flush,
}

/// Something that can show a line of text in each region. Never read back.
///
/// `set_text` only stages a line; nothing is shown until `flush`.
pub trait Screen {
    fn set_text(&mut self, region: Region, text: &str) -> Result<(), DisplayError>;

    fn flush(&mut self) -> Result<(), DisplayError>;
}

/// Receives the location state whenever it changes
pub trait Presenter {
    fn present(&mut self, state: &LocationState);
}

/// Maps the location state one-to-one onto the screen regions
pub struct PresentationAdapter<S: Screen> {
    screen: S,
}

impl<S: Screen> PresentationAdapter<S> {
    /// Fills every region with `initial_text` until the first render
    pub fn new(screen: S, initial_text: &str) -> Self {
        let mut adapter = Self { screen };
        if let Err(e) = adapter.show(|_| initial_text) {
            error!("Display error on startup: {:?}", e);
        }

        adapter
    }

    /// Stages every region, then flushes once
    fn show<'t>(&mut self, line: impl Fn(Region) -> &'t str) -> Result<(), DisplayError> {
        for region in Region::ALL {
            self.screen.set_text(region, line(region))?;
        }

        self.screen.flush()
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }
}

impl<S: Screen> Presenter for PresentationAdapter<S> {
    fn present(&mut self, state: &LocationState) {
        if let Err(e) = self.show(|region| state.field(region.field())) {
            error!("Display update error: {:?}", e);
        }
    }
}

/// In-memory screen holding the last text of each region
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferScreen {
    lines: [FieldText; 3],
    writes: usize,
    flushes: usize,
}

impl BufferScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, region: Region) -> &str {
        &self.lines[region as usize]
    }

    /// Total number of `set_text` calls seen
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Total number of `flush` calls seen
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Screen for BufferScreen {
    fn set_text(&mut self, region: Region, line: &str) -> Result<(), DisplayError> {
        self.lines[region as usize] = text(line);
        self.writes += 1;

        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.flushes += 1;

        Ok(())
    }
}
