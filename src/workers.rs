/*
 * The entry, exit and reset workers.
 *
 * Each worker sleeps on its own channel and, when woken, performs one bounded
 * transition of the occupancy counter followed by a serialized screen update:
 * show what happened, keep it up for the settle time, go back to the idle
 * frame. The screen token is held for that whole sequence.
 *
 * The count on the event frame is read after the token is taken, not when the
 * worker changed it. A worker that waited for the screen while others moved
 * the counter shows the count as it is, never a stale one.
 *
 * Workers get everything they touch through `Shared`, there is no ambient
 * state in here.
 */

use core::future::Future;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Timer;

use crate::{
    bus::{BinaryChannel, CountingChannel},
    config::Timings,
    display::{DisplaySerializer, Frame, Renderer},
    error::OccupancyError,
    feedback::Tone,
    occupancy::Occupancy,
};

pub struct Shared<'a, M: RawMutex, R> {
    pub occupancy: &'a Occupancy,
    pub display: &'a DisplaySerializer<M, R>,
    pub timings: Timings,
}

// Not derived, that would require `M: Copy` and `R: Copy`.
impl<M: RawMutex, R> Clone for Shared<'_, M, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, R> Copy for Shared<'_, M, R> {}

impl<'a, M: RawMutex, R: Renderer> Shared<'a, M, R> {
    pub fn new(
        occupancy: &'a Occupancy,
        display: &'a DisplaySerializer<M, R>,
        timings: Timings,
    ) -> Self {
        Shared {
            occupancy,
            display,
            timings,
        }
    }

    /// The waiting screen shown at power-up, before any event.
    pub async fn splash(&self) {
        self.display.show(Frame::Idle).await;
    }

    /// Show the frame built from the current count, run `while_shown`, hold
    /// for the settle time, revert to idle. All of it under one display token.
    async fn announce<F: Future<Output = ()>>(
        &self,
        frame: impl FnOnce(u8) -> Frame,
        while_shown: F,
    ) {
        let mut token = self.display.acquire().await;
        token.show(frame(self.occupancy.snapshot()));
        while_shown.await;
        Timer::after(self.timings.settle).await;
        token.show(Frame::Idle);
        token.release();
    }
}

pub struct EntryWorker<'a, M: RawMutex, R, T> {
    shared: Shared<'a, M, R>,
    tone: T,
}

impl<'a, M: RawMutex, R: Renderer, T: Tone> EntryWorker<'a, M, R, T> {
    pub fn new(shared: Shared<'a, M, R>, tone: T) -> Self {
        EntryWorker { shared, tone }
    }

    /// One car at the entrance. The counter saturates at capacity: a car
    /// arriving at a full lot is refused and the full alert sounds instead.
    pub async fn handle(&mut self) -> Result<u8, OccupancyError> {
        let shared = &self.shared;
        let tone = &mut self.tone;
        let capacity = shared.occupancy.capacity();

        let result = shared.occupancy.fill();
        match result {
            Ok(count) => {
                info!("car entered, {}/{} taken", count, capacity);
                shared
                    .announce(|count| Frame::Entered { count, capacity }, async {})
                    .await;
            }
            Err(err) => {
                warn!("car refused: {}", err);
                let alert = shared.timings.full_alert;
                shared
                    .announce(|_| Frame::LotFull { capacity }, tone.play(alert))
                    .await;
            }
        }
        result
    }

    pub async fn run(mut self, channel: &CountingChannel) -> ! {
        loop {
            channel.wait().await;
            let _ = self.handle().await;
        }
    }
}

pub struct ExitWorker<'a, M: RawMutex, R> {
    shared: Shared<'a, M, R>,
}

impl<'a, M: RawMutex, R: Renderer> ExitWorker<'a, M, R> {
    pub fn new(shared: Shared<'a, M, R>) -> Self {
        ExitWorker { shared }
    }

    /// One car leaving. With nothing to vacate the press is ignored, the screen
    /// is left alone.
    pub async fn handle(&mut self) -> Result<u8, OccupancyError> {
        let capacity = self.shared.occupancy.capacity();

        let count = match self.shared.occupancy.vacate() {
            Ok(count) => count,
            Err(err) => {
                debug!("exit ignored: {}", err);
                return Err(err);
            }
        };

        info!("car left, {}/{} taken", count, capacity);
        self.shared
            .announce(|count| Frame::Vacated { count, capacity }, async {})
            .await;
        Ok(count)
    }

    pub async fn run(mut self, channel: &CountingChannel) -> ! {
        loop {
            channel.wait().await;
            let _ = self.handle().await;
        }
    }
}

pub struct ResetWorker<'a, M: RawMutex, R> {
    shared: Shared<'a, M, R>,
}

impl<'a, M: RawMutex, R: Renderer> ResetWorker<'a, M, R> {
    pub fn new(shared: Shared<'a, M, R>) -> Self {
        ResetWorker { shared }
    }

    /// Forget every car. Returns how many slots were cleared.
    pub async fn handle(&mut self) -> u8 {
        let capacity = self.shared.occupancy.capacity();
        let cleared = self.shared.occupancy.reset();
        info!("counter reset, {} slots cleared", cleared);
        self.shared
            .announce(|_| Frame::Reset { capacity }, async {})
            .await;
        cleared
    }

    pub async fn run(mut self, channel: &BinaryChannel) -> ! {
        loop {
            channel.wait().await;
            self.handle().await;
        }
    }
}
