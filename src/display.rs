/*
 * Exclusive access to the shared screen.
 *
 * The renderer lives inside an async mutex and the only way to reach it is the
 * `DisplayToken` handed out by `acquire`. A worker keeps the token for its whole
 * sequence (event frame, settle, idle frame), so two workers can never
 * interleave draws and a flushed frame is always complete. Dropping the token
 * releases the screen.
 */

pub mod frame;

use embassy_sync::{
    blocking_mutex::raw::RawMutex,
    mutex::{Mutex, MutexGuard},
};

pub use frame::{Frame, Line};

/// The drawing primitives the controller needs from a screen driver. `flush`
/// makes everything drawn since `clear` visible at once.
pub trait Renderer {
    type Error;

    fn clear(&mut self) -> Result<(), Self::Error>;
    fn draw_text(&mut self, text: &str, x: i32, y: i32) -> Result<(), Self::Error>;
    fn flush(&mut self) -> Result<(), Self::Error>;
}

pub struct DisplaySerializer<M: RawMutex, R> {
    renderer: Mutex<M, R>,
}

impl<M: RawMutex, R: Renderer> DisplaySerializer<M, R> {
    pub const fn new(renderer: R) -> Self {
        DisplaySerializer {
            renderer: Mutex::new(renderer),
        }
    }

    /// Wait until no other worker holds the screen.
    pub async fn acquire(&self) -> DisplayToken<'_, M, R> {
        DisplayToken {
            renderer: self.renderer.lock().await,
        }
    }

    /// Acquire, show a single frame, release.
    pub async fn show(&self, frame: Frame) {
        self.acquire().await.show(frame);
    }

    pub fn into_inner(self) -> R {
        self.renderer.into_inner()
    }
}

pub struct DisplayToken<'a, M: RawMutex, R> {
    renderer: MutexGuard<'a, M, R>,
}

impl<M: RawMutex, R: Renderer> DisplayToken<'_, M, R> {
    /// Render a frame. A failing screen is logged and otherwise ignored, the
    /// count is what matters and it is already updated.
    pub fn show(&mut self, frame: Frame) {
        if frame.render(&mut *self.renderer).is_err() {
            error!("failed to render {}", frame);
        }
    }

    pub fn release(self) {}
}
