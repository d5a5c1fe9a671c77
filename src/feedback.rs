/*
 * Audible feedback. Workers only know the `Tone` contract: play a beep and
 * return when it is over. `Buzzer` implements it for anything that can switch
 * a square wave on and off, which is all a PWM pin needs to provide.
 *
 * A buzzer shared between tasks sits in an async mutex, and the mutex is a
 * `Tone` as well: playing through it waits for the buzzer to be free.
 */

use embassy_sync::{blocking_mutex::raw::RawMutex, mutex::Mutex};
use embassy_time::{Duration, Timer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Beep {
    pub repetitions: u8,
    pub frequency_hz: u32,
    /// Length of each tone, and of the pause after it.
    pub duration: Duration,
}

impl Beep {
    pub const fn new(repetitions: u8, frequency_hz: u32, duration: Duration) -> Self {
        Beep {
            repetitions,
            frequency_hz,
            duration,
        }
    }

    /// How long `play` keeps the caller busy.
    pub fn total(&self) -> Duration {
        self.duration * 2 * u32::from(self.repetitions)
    }
}

#[allow(async_fn_in_trait)]
pub trait Tone {
    async fn play(&mut self, beep: Beep);
}

pub trait ToneOutput {
    fn start(&mut self, frequency_hz: u32);
    fn stop(&mut self);
}

pub struct Buzzer<O> {
    output: O,
}

impl<O: ToneOutput> Buzzer<O> {
    pub fn new(mut output: O) -> Self {
        output.stop();
        Buzzer { output }
    }
}

impl<O: ToneOutput> Tone for Buzzer<O> {
    async fn play(&mut self, beep: Beep) {
        for _ in 0..beep.repetitions {
            self.output.start(beep.frequency_hz);
            Timer::after(beep.duration).await;
            self.output.stop();
            Timer::after(beep.duration).await;
        }
    }
}

impl<M: RawMutex, T: Tone> Tone for &Mutex<M, T> {
    async fn play(&mut self, beep: Beep) {
        self.lock().await.play(beep).await;
    }
}
