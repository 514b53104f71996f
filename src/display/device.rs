use embedded_graphics::{
    draw_target::DrawTarget,
    mono_font::{iso_8859_1::FONT_6X10, MonoTextStyle, MonoTextStyleBuilder},
    pixelcolor::BinaryColor,
    prelude::Point,
    text::{Alignment, Baseline, Text, TextStyleBuilder},
    Drawable,
};
use esp_hal::{delay::Delay, gpio::Output, i2c::master::I2c, Async};
use ssd1306::{
    mode::{BufferedGraphicsMode, DisplayConfig},
    prelude::*,
    size::DisplaySize128x64,
    I2CDisplayInterface, Ssd1306,
};

use super::{DisplayError, Region, Screen};
use crate::location::{text, FieldText};

const CENTER_X: i32 = 64;

/// Top edge of each region, in pixels
const fn region_top(region: Region) -> i32 {
    match region {
        Region::GridReference => 8,
        Region::Latitude => 26,
        Region::Longitude => 44,
    }
}

pub struct DisplayDevice<'a> {
    display: Ssd1306<
        I2CInterface<I2c<'a, Async>>,
        DisplaySize128x64,
        BufferedGraphicsMode<DisplaySize128x64>,
    >,
    lines: [FieldText; 3],
}

impl<'a> DisplayDevice<'a> {
    /// Create a new Display instance
    pub fn new(
        i2c: I2c<'a, Async>,
        mut oled_rst: Output<'a>,
        delay: &mut Delay,
    ) -> Result<Self, DisplayError> {
        let i2c_display_interface = I2CDisplayInterface::new_custom_address(i2c, 0x3C);

        let mut display = Ssd1306::new(
            i2c_display_interface,
            DisplaySize128x64,
            DisplayRotation::Rotate0,
        )
        .into_buffered_graphics_mode();

        display
            .reset(&mut oled_rst, delay)
            .map_err(|_| DisplayError::Init)?;

        display.init().map_err(|_| DisplayError::Init)?;

        Ok(Self {
            display,
            lines: Default::default(),
        })
    }
}

impl Screen for DisplayDevice<'_> {
    fn set_text(&mut self, region: Region, line: &str) -> Result<(), DisplayError> {
        debug!("Staging {:?}: {}", region, line);

        self.lines[region as usize] = text(line);
        Ok(())
    }

    /// Redraws every region and pushes the frame over I2C
    fn flush(&mut self) -> Result<(), DisplayError> {
        let character_style: MonoTextStyle<'_, BinaryColor> = MonoTextStyleBuilder::new()
            .font(&FONT_6X10)
            .text_color(BinaryColor::On)
            .build();

        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Top)
            .build();

        self.display
            .clear(BinaryColor::Off)
            .map_err(|_| DisplayError::Draw)?;

        for region in Region::ALL {
            let line = &self.lines[region as usize];
            let position = Point::new(CENTER_X, region_top(region));

            Text::with_text_style(line, position, character_style, text_style)
                .draw(&mut self.display)
                .map_err(|_| DisplayError::Draw)?;
        }

        self.display.flush().map_err(|_| DisplayError::Flush)
    }
}
