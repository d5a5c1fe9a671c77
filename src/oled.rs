/*
 * The 128x64 SSD1306 panel on I2C1, drawn through embedded-graphics. Drawing
 * only touches the frame buffer, `flush` pushes the whole buffer to the panel
 * in one go.
 */

use embassy_stm32::{i2c::I2c, mode::Blocking};
use embedded_graphics::{
    mono_font::{MonoTextStyle, ascii::FONT_5X8},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use ssd1306::{I2CDisplayInterface, Ssd1306, mode::BufferedGraphicsMode, prelude::*};

use parking::display::Renderer;

type Panel = Ssd1306<
    I2CInterface<I2c<'static, Blocking>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

pub struct Oled {
    panel: Panel,
}

impl Oled {
    pub fn new(i2c: I2c<'static, Blocking>) -> Self {
        let interface = I2CDisplayInterface::new(i2c);
        let mut panel = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        if panel.init().is_err() {
            // Keep going, the count and the light still work without a screen.
            defmt::error!("oled did not answer on i2c");
        }
        Oled { panel }
    }
}

impl Renderer for Oled {
    type Error = <Panel as DrawTarget>::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.panel.clear_buffer();
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32) -> Result<(), Self::Error> {
        let style = MonoTextStyle::new(&FONT_5X8, BinaryColor::On);
        Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(&mut self.panel)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.panel.flush()
    }
}
