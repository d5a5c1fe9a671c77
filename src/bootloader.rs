/*
 * The escape hatch: the bootloader button reboots the device into the ROM
 * bootloader for reflashing. It sits next to the event pipeline, not in it.
 *
 * Before rebooting the hatch gives a short beep, if it can get the buzzer
 * without waiting. When the entry worker is in the middle of an alert the
 * reboot goes ahead silently.
 *
 * The ROM bootloader expects to find the core the way it is after a reset:
 * no interrupt enabled or pending in the NVIC, SysTick stopped and the vector
 * table pointing at its own. `RomBootloader` runs those steps in order through
 * a `RomHandoff`, the board provides the register writes.
 */

use embassy_sync::{blocking_mutex::raw::RawMutex, mutex::Mutex};
use embassy_time::Instant;

use crate::{
    feedback::{Beep, Tone},
    input::{EdgeOutcome, InputLayer, InputSource},
};

/// The privileged reboot. On hardware this does not return.
pub trait Bootloader {
    fn reboot_to_bootloader(&mut self);
}

pub trait RomHandoff {
    /// Set PRIMASK, nothing may run between the following steps.
    fn mask_interrupts(&mut self);
    fn disable_all_irqs(&mut self);
    fn clear_pending_irqs(&mut self);
    fn stop_systick(&mut self);
    fn relocate_vectors(&mut self, vector_table: u32);
    /// Clear PRIMASK again. Safe once every IRQ is disabled, and the ROM
    /// needs it cleared.
    fn unmask_interrupts(&mut self);
    fn jump(&mut self, vector_table: u32);
}

pub struct RomBootloader<H> {
    handoff: H,
    vector_table: u32,
}

impl<H: RomHandoff> RomBootloader<H> {
    pub fn new(handoff: H, vector_table: u32) -> Self {
        RomBootloader {
            handoff,
            vector_table,
        }
    }
}

impl<H: RomHandoff> Bootloader for RomBootloader<H> {
    fn reboot_to_bootloader(&mut self) {
        let handoff = &mut self.handoff;
        handoff.mask_interrupts();
        handoff.disable_all_irqs();
        handoff.clear_pending_irqs();
        handoff.stop_systick();
        handoff.relocate_vectors(self.vector_table);
        handoff.unmask_interrupts();
        handoff.jump(self.vector_table);
    }
}

pub struct EscapeHatch<'a, M: RawMutex, T, B> {
    tone: &'a Mutex<M, T>,
    beep: Beep,
    bootloader: B,
}

impl<'a, M: RawMutex, T: Tone, B: Bootloader> EscapeHatch<'a, M, T, B> {
    pub fn new(tone: &'a Mutex<M, T>, beep: Beep, bootloader: B) -> Self {
        EscapeHatch {
            tone,
            beep,
            bootloader,
        }
    }

    /// Debounce an edge of the bootloader button and fire when it gets through.
    pub async fn on_raw_edge(&mut self, inputs: &InputLayer<'_>, now: Instant) -> EdgeOutcome {
        let outcome = inputs.on_raw_edge(InputSource::BootloaderButton, now);
        if outcome == EdgeOutcome::Maintenance {
            self.fire().await;
        }
        outcome
    }

    pub async fn fire(&mut self) {
        match self.tone.try_lock() {
            Ok(mut tone) => tone.play(self.beep).await,
            Err(_) => debug!("buzzer busy, no beep"),
        }
        warn!("rebooting to bootloader");
        self.bootloader.reboot_to_bootloader();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bus::SignalBus, config::SYSTEM_MEMORY};
    use core::cell::RefCell;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_time::Duration;

    const BEEP: Beep = Beep::new(1, 1000, Duration::from_millis(1));

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Step {
        Mask,
        DisableIrqs,
        ClearPending,
        StopSysTick,
        Relocate(u32),
        Unmask,
        Jump(u32),
        Beep,
        Reboot,
    }

    type Log = RefCell<std::vec::Vec<Step>>;

    struct LoggedHandoff<'a>(&'a Log);

    impl RomHandoff for LoggedHandoff<'_> {
        fn mask_interrupts(&mut self) {
            self.0.borrow_mut().push(Step::Mask);
        }

        fn disable_all_irqs(&mut self) {
            self.0.borrow_mut().push(Step::DisableIrqs);
        }

        fn clear_pending_irqs(&mut self) {
            self.0.borrow_mut().push(Step::ClearPending);
        }

        fn stop_systick(&mut self) {
            self.0.borrow_mut().push(Step::StopSysTick);
        }

        fn relocate_vectors(&mut self, vector_table: u32) {
            self.0.borrow_mut().push(Step::Relocate(vector_table));
        }

        fn unmask_interrupts(&mut self) {
            self.0.borrow_mut().push(Step::Unmask);
        }

        fn jump(&mut self, vector_table: u32) {
            self.0.borrow_mut().push(Step::Jump(vector_table));
        }
    }

    struct LoggedTone<'a>(&'a Log);

    impl Tone for LoggedTone<'_> {
        async fn play(&mut self, _beep: Beep) {
            self.0.borrow_mut().push(Step::Beep);
        }
    }

    struct LoggedBootloader<'a>(&'a Log);

    impl Bootloader for LoggedBootloader<'_> {
        fn reboot_to_bootloader(&mut self) {
            self.0.borrow_mut().push(Step::Reboot);
        }
    }

    type SharedTone<'a> = Mutex<CriticalSectionRawMutex, LoggedTone<'a>>;

    #[test]
    fn core_is_put_back_to_reset_state_before_the_jump() {
        let log = Log::default();
        let mut bootloader = RomBootloader::new(LoggedHandoff(&log), SYSTEM_MEMORY);
        bootloader.reboot_to_bootloader();

        assert_eq!(
            *log.borrow(),
            [
                Step::Mask,
                Step::DisableIrqs,
                Step::ClearPending,
                Step::StopSysTick,
                Step::Relocate(SYSTEM_MEMORY),
                Step::Unmask,
                Step::Jump(SYSTEM_MEMORY),
            ]
        );
    }

    #[test]
    fn hatch_beeps_before_rebooting() {
        let log = Log::default();
        let tone = SharedTone::new(LoggedTone(&log));
        let mut hatch = EscapeHatch::new(&tone, BEEP, LoggedBootloader(&log));

        block_on(hatch.fire());
        assert_eq!(*log.borrow(), [Step::Beep, Step::Reboot]);
    }

    #[test]
    fn busy_buzzer_means_a_silent_reboot() {
        let log = Log::default();
        let tone = SharedTone::new(LoggedTone(&log));
        let mut hatch = EscapeHatch::new(&tone, BEEP, LoggedBootloader(&log));

        let held = tone.try_lock();
        assert!(held.is_ok());
        block_on(hatch.fire());
        drop(held);

        assert_eq!(*log.borrow(), [Step::Reboot]);
    }

    #[test]
    fn bounced_edges_do_not_reboot() {
        let bus = SignalBus::new();
        let inputs = InputLayer::new(&bus, Duration::from_millis(200));
        let log = Log::default();
        let tone = SharedTone::new(LoggedTone(&log));
        let mut hatch = EscapeHatch::new(&tone, BEEP, LoggedBootloader(&log));

        let first = block_on(hatch.on_raw_edge(&inputs, Instant::from_millis(1_000)));
        let bounce = block_on(hatch.on_raw_edge(&inputs, Instant::from_millis(1_030)));

        assert_eq!(first, EdgeOutcome::Maintenance);
        assert_eq!(bounce, EdgeOutcome::Debounced);
        assert_eq!(*log.borrow(), [Step::Beep, Step::Reboot]);
    }
}
