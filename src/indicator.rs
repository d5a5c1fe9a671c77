/*
 * The tri-color status light next to the entrance.
 *
 * Unlike the other workers this one is not event driven: it samples the count
 * on a fixed period and drives the three outputs. The sample is a relaxed
 * atomic load without any lock. The light may lag the real count by one
 * period, which nobody standing in front of it will notice.
 */

use embassy_time::{Duration, Ticker};

use crate::occupancy::Occupancy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pattern {
    /// No car in the lot.
    Empty,
    /// Some slots taken, more than one free.
    Available,
    /// Exactly one free slot left.
    LastSlot,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl Rgb {
    pub fn new(red: bool, green: bool, blue: bool) -> Self {
        Self { red, green, blue }
    }
}

impl Pattern {
    pub fn for_count(count: u8, capacity: u8) -> Self {
        match count {
            0 => Pattern::Empty,
            count if count >= capacity => Pattern::Full,
            count if count == capacity - 1 => Pattern::LastSlot,
            _ => Pattern::Available,
        }
    }

    pub fn red(&self) -> bool {
        match self {
            Pattern::LastSlot | Pattern::Full => true,
            Pattern::Empty | Pattern::Available => false,
        }
    }

    pub fn green(&self) -> bool {
        match self {
            Pattern::Available | Pattern::LastSlot => true,
            Pattern::Empty | Pattern::Full => false,
        }
    }

    pub fn blue(&self) -> bool {
        match self {
            Pattern::Empty => true,
            Pattern::Available | Pattern::LastSlot | Pattern::Full => false,
        }
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.red(), self.green(), self.blue())
    }
}

/// Three independent on/off outputs.
pub trait IndicatorLights {
    fn set(&mut self, rgb: Rgb);
}

pub struct IndicatorWorker<'a, L> {
    occupancy: &'a Occupancy,
    lights: L,
    period: Duration,
    shown: Option<Pattern>,
}

impl<'a, L: IndicatorLights> IndicatorWorker<'a, L> {
    pub fn new(occupancy: &'a Occupancy, lights: L, period: Duration) -> Self {
        IndicatorWorker {
            occupancy,
            lights,
            period,
            shown: None,
        }
    }

    /// Sample the count once and drive the lights if the pattern changed.
    pub fn refresh(&mut self) -> Pattern {
        let pattern = Pattern::for_count(self.occupancy.snapshot(), self.occupancy.capacity());
        if self.shown != Some(pattern) {
            debug!("indicator now {}", pattern);
            self.lights.set(pattern.rgb());
            self.shown = Some(pattern);
        }
        pattern
    }

    pub async fn run(mut self) -> ! {
        let mut ticker = Ticker::every(self.period);
        loop {
            self.refresh();
            ticker.next().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::{
        block_on,
        select::{Either, select},
    };
    use embassy_time::Timer;

    #[derive(Default)]
    struct RecordingLights {
        history: std::vec::Vec<Rgb>,
    }

    impl IndicatorLights for &mut RecordingLights {
        fn set(&mut self, rgb: Rgb) {
            self.history.push(rgb);
        }
    }

    #[test]
    fn thresholds_for_a_lot_of_ten() {
        assert_eq!(Pattern::for_count(0, 10), Pattern::Empty);
        assert_eq!(Pattern::for_count(1, 10), Pattern::Available);
        assert_eq!(Pattern::for_count(5, 10), Pattern::Available);
        assert_eq!(Pattern::for_count(8, 10), Pattern::Available);
        assert_eq!(Pattern::for_count(9, 10), Pattern::LastSlot);
        assert_eq!(Pattern::for_count(10, 10), Pattern::Full);
    }

    #[test]
    fn single_slot_lot_is_empty_or_full() {
        assert_eq!(Pattern::for_count(0, 1), Pattern::Empty);
        assert_eq!(Pattern::for_count(1, 1), Pattern::Full);
    }

    #[test]
    fn every_pattern_has_its_own_color() {
        let patterns = [
            Pattern::Empty,
            Pattern::Available,
            Pattern::LastSlot,
            Pattern::Full,
        ];
        for (i, a) in patterns.iter().enumerate() {
            for b in &patterns[i + 1..] {
                assert_ne!(a.rgb(), b.rgb());
            }
        }
        assert_eq!(Pattern::Full.rgb(), Rgb::new(true, false, false));
    }

    #[test]
    fn lights_are_only_driven_on_change() {
        let occupancy = Occupancy::new(10);
        let mut lights = RecordingLights::default();
        {
            let mut worker = IndicatorWorker::new(&occupancy, &mut lights, Duration::from_millis(1));
            assert_eq!(worker.refresh(), Pattern::Empty);
            assert_eq!(worker.refresh(), Pattern::Empty);
            occupancy.fill().unwrap();
            assert_eq!(worker.refresh(), Pattern::Available);
        }
        assert_eq!(
            lights.history,
            [Pattern::Empty.rgb(), Pattern::Available.rgb()]
        );
    }

    #[test]
    fn periodic_run_follows_the_count() {
        let occupancy = Occupancy::new(2);
        let mut lights = RecordingLights::default();

        let scenario = async {
            Timer::after(Duration::from_millis(20)).await;
            occupancy.fill().unwrap();
            Timer::after(Duration::from_millis(20)).await;
            occupancy.fill().unwrap();
            Timer::after(Duration::from_millis(20)).await;
        };
        let worker = IndicatorWorker::new(&occupancy, &mut lights, Duration::from_millis(2));

        match block_on(select(worker.run(), scenario)) {
            Either::First(_) => unreachable!(),
            Either::Second(()) => {}
        }

        assert_eq!(
            lights.history,
            [
                Pattern::Empty.rgb(),
                Pattern::LastSlot.rgb(),
                Pattern::Full.rgb()
            ]
        );
    }
}
