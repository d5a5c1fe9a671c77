/*
 * The hand-off between the input layer and the workers.
 *
 * There is one channel per kind of logical event. Posting never blocks and
 * never allocates, so it is safe from the interrupt executor. Waiting is only
 * done by the one worker that owns the channel. A channel holds occurrences,
 * not a flag: three quick presses while the entry worker is busy rendering
 * become three increments, in the order they were posted.
 */

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Channel, TrySendError},
};

use crate::config::EVENT_QUEUE_DEPTH;

/// A debounced, meaningful button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogicalEvent {
    SlotFilled,
    SlotVacated,
    CounterReset,
}

/// What happened to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PostOutcome {
    /// A new occurrence is pending.
    Queued,
    /// Merged into an occurrence that was already pending (binary channels).
    Coalesced,
    /// The channel was saturated and the occurrence is lost.
    Dropped,
}

pub struct SignalChannel<const N: usize> {
    occurrences: Channel<CriticalSectionRawMutex, (), N>,
    coalesce: bool,
}

pub type CountingChannel = SignalChannel<EVENT_QUEUE_DEPTH>;
pub type BinaryChannel = SignalChannel<1>;

impl<const N: usize> SignalChannel<N> {
    /// Up to `N` occurrences may be pending, posts beyond that are dropped.
    pub const fn counting() -> Self {
        SignalChannel {
            occurrences: Channel::new(),
            coalesce: false,
        }
    }

    pub fn post(&self) -> PostOutcome {
        match self.occurrences.try_send(()) {
            Ok(()) => PostOutcome::Queued,
            Err(TrySendError::Full(())) if self.coalesce => PostOutcome::Coalesced,
            Err(TrySendError::Full(())) => PostOutcome::Dropped,
        }
    }

    /// Suspend until an occurrence is pending and consume it.
    pub async fn wait(&self) {
        self.occurrences.receive().await
    }

    pub fn pending(&self) -> usize {
        self.occurrences.len()
    }
}

impl SignalChannel<1> {
    /// At most one occurrence pending; a post while one is pending merges with it.
    pub const fn binary() -> Self {
        SignalChannel {
            occurrences: Channel::new(),
            coalesce: true,
        }
    }
}

pub struct SignalBus {
    pub entry: CountingChannel,
    pub exit: CountingChannel,
    pub reset: BinaryChannel,
}

impl SignalBus {
    pub const fn new() -> Self {
        SignalBus {
            entry: CountingChannel::counting(),
            exit: CountingChannel::counting(),
            reset: BinaryChannel::binary(),
        }
    }

    pub fn post(&self, event: LogicalEvent) -> PostOutcome {
        let outcome = match event {
            LogicalEvent::SlotFilled => self.entry.post(),
            LogicalEvent::SlotVacated => self.exit.post(),
            LogicalEvent::CounterReset => self.reset.post(),
        };
        if outcome == PostOutcome::Dropped {
            warn!("{} dropped, channel saturated", event);
        }
        outcome
    }

    pub fn pending(&self, event: LogicalEvent) -> usize {
        match event {
            LogicalEvent::SlotFilled => self.entry.pending(),
            LogicalEvent::SlotVacated => self.exit.pending(),
            LogicalEvent::CounterReset => self.reset.pending(),
        }
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    #[test]
    fn counting_channel_queues_up_to_its_depth() {
        let bus = SignalBus::new();
        for _ in 0..EVENT_QUEUE_DEPTH {
            assert_eq!(bus.post(LogicalEvent::SlotFilled), PostOutcome::Queued);
        }
        assert_eq!(bus.post(LogicalEvent::SlotFilled), PostOutcome::Dropped);
        assert_eq!(bus.pending(LogicalEvent::SlotFilled), EVENT_QUEUE_DEPTH);
        assert_eq!(bus.pending(LogicalEvent::SlotVacated), 0);
    }

    #[test]
    fn reset_requests_coalesce() {
        let bus = SignalBus::new();
        assert_eq!(bus.post(LogicalEvent::CounterReset), PostOutcome::Queued);
        assert_eq!(bus.post(LogicalEvent::CounterReset), PostOutcome::Coalesced);
        assert_eq!(bus.pending(LogicalEvent::CounterReset), 1);

        block_on(bus.reset.wait());
        assert_eq!(bus.pending(LogicalEvent::CounterReset), 0);
        assert_eq!(bus.post(LogicalEvent::CounterReset), PostOutcome::Queued);
    }

    #[test]
    fn wait_consumes_one_occurrence_at_a_time() {
        let bus = SignalBus::new();
        bus.post(LogicalEvent::SlotVacated);
        bus.post(LogicalEvent::SlotVacated);

        block_on(bus.exit.wait());
        assert_eq!(bus.pending(LogicalEvent::SlotVacated), 1);
        block_on(bus.exit.wait());
        assert_eq!(bus.pending(LogicalEvent::SlotVacated), 0);
    }

    #[test]
    fn streams_are_independent() {
        let bus = SignalBus::new();
        for _ in 0..EVENT_QUEUE_DEPTH + 3 {
            bus.post(LogicalEvent::SlotFilled);
        }
        assert_eq!(bus.post(LogicalEvent::SlotVacated), PostOutcome::Queued);
        assert_eq!(bus.post(LogicalEvent::CounterReset), PostOutcome::Queued);
    }
}
