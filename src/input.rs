/*
 * The input layer: raw falling edges in, logical events out.
 *
 * `on_raw_edge` runs on the interrupt executor. It only compares and updates a
 * timestamp and does a non-blocking post, it never touches the counter or the
 * display and never waits. Each button owns one slot of the debounce table and
 * is the only writer of that slot.
 *
 * The bootloader button is not part of the event model. When it gets through
 * its debounce check the caller is told so, and is expected to fire the
 * privileged reboot itself through an `EscapeHatch`.
 */

use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use embassy_time::{Duration, Instant};
use enum_ordinalize::Ordinalize;

use crate::bus::{LogicalEvent, PostOutcome, SignalBus};

#[derive(Ordinalize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum InputSource {
    EntryButton,
    ExitButton,
    ResetButton,
    BootloaderButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Event(LogicalEvent),
    Maintenance,
}

impl InputSource {
    pub fn route(self) -> Route {
        match self {
            InputSource::EntryButton => Route::Event(LogicalEvent::SlotFilled),
            InputSource::ExitButton => Route::Event(LogicalEvent::SlotVacated),
            InputSource::ResetButton => Route::Event(LogicalEvent::CounterReset),
            InputSource::BootloaderButton => Route::Maintenance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeOutcome {
    /// Inside the quiet window of the previous accepted edge, nothing happened.
    Debounced,
    /// Accepted and handed to the bus.
    Posted(LogicalEvent, PostOutcome),
    /// Accepted edge of the bootloader button.
    Maintenance,
}

type Timestamps = [Option<Instant>; InputSource::VARIANT_COUNT];

/// Last accepted edge per button.
pub struct DebounceTable {
    window: Duration,
    last_accepted: Mutex<CriticalSectionRawMutex, Cell<Timestamps>>,
}

impl DebounceTable {
    pub const fn new(window: Duration) -> Self {
        DebounceTable {
            window,
            last_accepted: Mutex::new(Cell::new([None; InputSource::VARIANT_COUNT])),
        }
    }

    /// Accept the edge and remember it, unless it comes less than a window
    /// after the previously accepted one from the same source.
    pub fn accept(&self, source: InputSource, now: Instant) -> bool {
        self.last_accepted.lock(|last_accepted| {
            let mut timestamps = last_accepted.get();
            let slot = &mut timestamps[source.ordinal()];

            if let Some(previous) = *slot {
                if now.saturating_duration_since(previous) < self.window {
                    return false;
                }
            }

            *slot = Some(now);
            last_accepted.set(timestamps);
            true
        })
    }
}

pub struct InputLayer<'a> {
    debounce: DebounceTable,
    bus: &'a SignalBus,
}

impl<'a> InputLayer<'a> {
    pub const fn new(bus: &'a SignalBus, window: Duration) -> Self {
        InputLayer {
            debounce: DebounceTable::new(window),
            bus,
        }
    }

    pub fn on_raw_edge(&self, source: InputSource, now: Instant) -> EdgeOutcome {
        if !self.debounce.accept(source, now) {
            trace!("{} bounced", source);
            return EdgeOutcome::Debounced;
        }

        match source.route() {
            Route::Event(event) => {
                let outcome = self.bus.post(event);
                debug!("{} -> {} ({})", source, event, outcome);
                EdgeOutcome::Posted(event, outcome)
            }
            Route::Maintenance => EdgeOutcome::Maintenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(200);

    fn at(millis: u64) -> Instant {
        Instant::from_millis(millis)
    }

    #[test]
    fn edges_inside_the_window_produce_one_event() {
        let bus = SignalBus::new();
        let inputs = InputLayer::new(&bus, WINDOW);

        assert_eq!(
            inputs.on_raw_edge(InputSource::EntryButton, at(1_000)),
            EdgeOutcome::Posted(LogicalEvent::SlotFilled, PostOutcome::Queued)
        );
        assert_eq!(
            inputs.on_raw_edge(InputSource::EntryButton, at(1_150)),
            EdgeOutcome::Debounced
        );
        assert_eq!(bus.pending(LogicalEvent::SlotFilled), 1);
    }

    #[test]
    fn edges_outside_the_window_produce_two_events() {
        let bus = SignalBus::new();
        let inputs = InputLayer::new(&bus, WINDOW);

        inputs.on_raw_edge(InputSource::ExitButton, at(1_000));
        inputs.on_raw_edge(InputSource::ExitButton, at(1_250));
        assert_eq!(bus.pending(LogicalEvent::SlotVacated), 2);
    }

    #[test]
    fn an_edge_exactly_one_window_later_is_accepted() {
        let table = DebounceTable::new(WINDOW);
        assert!(table.accept(InputSource::EntryButton, at(500)));
        assert!(!table.accept(InputSource::EntryButton, at(699)));
        assert!(table.accept(InputSource::EntryButton, at(700)));
    }

    #[test]
    fn rejected_edges_do_not_extend_the_window() {
        let table = DebounceTable::new(WINDOW);
        assert!(table.accept(InputSource::EntryButton, at(0)));
        assert!(!table.accept(InputSource::EntryButton, at(150)));
        assert!(table.accept(InputSource::EntryButton, at(210)));
    }

    #[test]
    fn the_very_first_edge_is_always_accepted() {
        let table = DebounceTable::new(WINDOW);
        assert!(table.accept(InputSource::ResetButton, at(0)));
    }

    #[test]
    fn sources_debounce_independently() {
        let bus = SignalBus::new();
        let inputs = InputLayer::new(&bus, WINDOW);

        inputs.on_raw_edge(InputSource::EntryButton, at(1_000));
        inputs.on_raw_edge(InputSource::ExitButton, at(1_010));
        inputs.on_raw_edge(InputSource::ResetButton, at(1_020));

        assert_eq!(bus.pending(LogicalEvent::SlotFilled), 1);
        assert_eq!(bus.pending(LogicalEvent::SlotVacated), 1);
        assert_eq!(bus.pending(LogicalEvent::CounterReset), 1);
    }

    #[test]
    fn bootloader_button_bypasses_the_bus() {
        let bus = SignalBus::new();
        let inputs = InputLayer::new(&bus, WINDOW);

        assert_eq!(
            inputs.on_raw_edge(InputSource::BootloaderButton, at(1_000)),
            EdgeOutcome::Maintenance
        );
        assert_eq!(
            inputs.on_raw_edge(InputSource::BootloaderButton, at(1_050)),
            EdgeOutcome::Debounced
        );

        for event in [
            LogicalEvent::SlotFilled,
            LogicalEvent::SlotVacated,
            LogicalEvent::CounterReset,
        ] {
            assert_eq!(bus.pending(event), 0);
        }
    }
}
