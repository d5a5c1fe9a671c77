/*
 * Compile-time configuration of the deployed controller. Everything that is a
 * physical property of the lot or of the people pressing the buttons lives here,
 * so the rest of the crate never hardcodes a number.
 */

use embassy_time::Duration;

use crate::feedback::Beep;

/// Number of parking slots the lot can represent.
pub const CAPACITY: u8 = 10;

/// Pending entry/exit presses each channel can buffer. At least `CAPACITY`, so a
/// burst that fills the whole lot is never lost while a worker is rendering.
pub const EVENT_QUEUE_DEPTH: usize = CAPACITY as usize;

/// Minimum time between two accepted edges of the same button.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// How long an event frame stays on screen before the idle frame returns.
pub const SETTLE_TIME: Duration = Duration::from_millis(1500);

/// Sampling period of the indicator light.
pub const INDICATOR_PERIOD: Duration = Duration::from_millis(100);

/// Played when a car arrives at a full lot.
pub const FULL_ALERT: Beep = Beep::new(1, 1000, Duration::from_millis(500));

/// Played just before rebooting into the ROM bootloader.
pub const BOOTLOADER_BEEP: Beep = Beep::new(1, 1000, Duration::from_millis(100));

/// Start of the STM32F1 system memory, where the ROM bootloader lives.
pub const SYSTEM_MEMORY: u32 = 0x1FFF_F000;

/// Frequency the buzzer PWM timer is brought up with.
pub const BUZZER_BASE_FREQUENCY_HZ: u32 = 4000;

/// The delays used by the worker tasks. Kept in a struct so that tests can run
/// the same workers with much shorter settle times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub settle: Duration,
    pub indicator_period: Duration,
    pub full_alert: Beep,
}

impl Timings {
    pub const fn new() -> Self {
        Timings {
            settle: SETTLE_TIME,
            indicator_period: INDICATOR_PERIOD,
            full_alert: FULL_ALERT,
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self::new()
    }
}
