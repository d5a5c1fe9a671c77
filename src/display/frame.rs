/*
 * What the screen can show. A frame is a handful of text lines at fixed
 * positions, sized for a 128x64 panel with an 8 pixel font.
 */

use core::fmt::{Arguments, Write};

use heapless::{String, Vec};

use super::Renderer;

pub const MAX_LINE_LEN: usize = 20;
pub const MAX_LINES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String<MAX_LINE_LEN>,
    pub x: i32,
    pub y: i32,
}

fn text_at(x: i32, y: i32, args: Arguments) -> Line {
    let mut text = String::new();
    // Frame texts are fixed and fit, a too long count would only be cut short.
    let _ = text.write_fmt(args);
    Line { text, x, y }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Frame {
    /// Nothing going on, waiting for the next car.
    Idle,
    Entered { count: u8, capacity: u8 },
    /// A car arrived but every slot is taken.
    LotFull { capacity: u8 },
    Vacated { count: u8, capacity: u8 },
    Reset { capacity: u8 },
}

impl Frame {
    pub fn lines(&self) -> Vec<Line, MAX_LINES> {
        let mut lines = Vec::new();
        let mut push = |line: Line| {
            let _ = lines.push(line);
        };

        match *self {
            Frame::Idle => {
                push(text_at(5, 25, format_args!("Waiting for")));
                push(text_at(5, 34, format_args!("  a car...")));
            }
            Frame::Entered { count, capacity } => {
                push(text_at(5, 10, format_args!("Car entered!")));
                push(text_at(5, 44, format_args!("Taken: {}/{}", count, capacity)));
            }
            Frame::LotFull { capacity } => {
                push(text_at(5, 10, format_args!("Lot is full!")));
                push(text_at(5, 19, format_args!("No free slot")));
                push(text_at(5, 44, format_args!("Taken: {}/{}", capacity, capacity)));
            }
            Frame::Vacated { count, capacity } => {
                push(text_at(5, 10, format_args!("Car left!")));
                push(text_at(5, 44, format_args!("Taken: {}/{}", count, capacity)));
            }
            Frame::Reset { capacity } => {
                push(text_at(5, 10, format_args!("Counter reset")));
                push(text_at(5, 44, format_args!("Taken: 0/{}", capacity)));
            }
        }

        lines
    }

    /// Clear, draw every line, flush. Must only be called while holding the
    /// display token.
    pub(crate) fn render<R: Renderer>(&self, renderer: &mut R) -> Result<(), R::Error> {
        renderer.clear()?;
        for line in self.lines() {
            renderer.draw_text(&line.text, line.x, line.y)?;
        }
        renderer.flush()
    }
}
