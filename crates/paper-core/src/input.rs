//! Touch input: raw samples, the shared queue and tap debouncing
//!
//! The touch driver (interrupt handler or polling task) pushes
//! [`TouchSample`]s into a [`TouchQueue`]. The UI task drains it through a
//! [`TouchFilter`], which turns finger-down / finger-up pairs into single
//! taps and drops taps that arrive too close together.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::{Duration, Instant};
use log::debug;

use crate::ui::TouchPoint;

/// Capacity of the touch sample queue
pub const TOUCH_QUEUE_DEPTH: usize = 8;

/// Whether the finger is on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Up,
}

/// One reading from the touch controller, in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSample {
    pub phase: TouchPhase,
    pub point: TouchPoint,
}

impl TouchSample {
    pub fn down(x: u16, y: u16) -> Self {
        Self {
            phase: TouchPhase::Down,
            point: TouchPoint::new(x, y),
        }
    }

    pub fn up(x: u16, y: u16) -> Self {
        Self {
            phase: TouchPhase::Up,
            point: TouchPoint::new(x, y),
        }
    }
}

/// Queue between the touch driver and the UI task
pub type TouchQueue = Channel<CriticalSectionRawMutex, TouchSample, TOUCH_QUEUE_DEPTH>;

/// Global touch queue for firmware builds with a single panel
pub static TOUCH_CHANNEL: TouchQueue = Channel::new();

/// Helper to get a touch sample sender
pub fn get_touch_sender()
-> Sender<'static, CriticalSectionRawMutex, TouchSample, TOUCH_QUEUE_DEPTH> {
    TOUCH_CHANNEL.sender()
}

/// Helper to get a touch sample receiver
pub fn get_touch_receiver()
-> Receiver<'static, CriticalSectionRawMutex, TouchSample, TOUCH_QUEUE_DEPTH> {
    TOUCH_CHANNEL.receiver()
}

/// Turns raw samples into debounced taps
///
/// A tap is reported on finger-up, at the position of the last finger-down
/// reading. Taps within the debounce window of the last accepted tap are
/// dropped, and a dropped tap does not extend the window.
#[derive(Debug, Clone)]
pub struct TouchFilter {
    debounce: Duration,
    pending: Option<TouchPoint>,
    last_tap: Option<Instant>,
}

impl TouchFilter {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: None,
            last_tap: None,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Time of the last accepted tap
    pub fn last_tap(&self) -> Option<Instant> {
        self.last_tap
    }

    /// Feed one sample; returns a tap when the finger lifts.
    pub fn process(&mut self, sample: TouchSample, now: Instant) -> Option<TouchPoint> {
        match sample.phase {
            TouchPhase::Down => {
                self.pending = Some(sample.point);
                None
            }
            TouchPhase::Up => {
                let point = self.pending.take().unwrap_or(sample.point);
                if let Some(last) = self.last_tap
                    && now.saturating_duration_since(last) < self.debounce
                {
                    debug!("Dropping tap at ({}, {}) inside debounce window", point.x, point.y);
                    return None;
                }
                self.last_tap = Some(now);
                Some(point)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn tap(filter: &mut TouchFilter, x: u16, y: u16, ms: u64) -> Option<TouchPoint> {
        filter.process(TouchSample::down(x, y), at(ms));
        filter.process(TouchSample::up(x, y), at(ms))
    }

    #[test]
    fn test_tap_reported_on_release_at_down_position() {
        let mut filter = TouchFilter::new(Duration::from_millis(500));
        assert_eq!(filter.process(TouchSample::down(10, 20), at(0)), None);
        assert_eq!(filter.process(TouchSample::down(12, 21), at(5)), None);
        assert_eq!(
            filter.process(TouchSample::up(0, 0), at(10)),
            Some(TouchPoint::new(12, 21)),
            "The last finger-down position wins over the release coordinates"
        );
    }

    #[test]
    fn test_release_without_down_uses_release_point() {
        let mut filter = TouchFilter::new(Duration::from_millis(500));
        assert_eq!(
            filter.process(TouchSample::up(7, 8), at(0)),
            Some(TouchPoint::new(7, 8))
        );
    }

    #[test]
    fn test_taps_inside_window_are_dropped() {
        let mut filter = TouchFilter::new(Duration::from_millis(500));
        assert!(tap(&mut filter, 1, 1, 1_000).is_some());
        assert!(tap(&mut filter, 1, 1, 1_200).is_none(), "200 ms after the last tap");
        assert!(
            tap(&mut filter, 1, 1, 1_450).is_none(),
            "Still measured from the accepted tap"
        );
        assert!(tap(&mut filter, 1, 1, 1_500).is_some(), "Window is half-open");
        assert_eq!(filter.last_tap(), Some(at(1_500)));
    }

    #[test]
    fn test_queue_round_trip() {
        let queue = TouchQueue::new();
        queue.try_send(TouchSample::down(3, 4)).unwrap();
        queue.try_send(TouchSample::up(3, 4)).unwrap();

        let mut filter = TouchFilter::new(Duration::from_millis(500));
        let mut taps = 0;
        while let Ok(sample) = queue.try_receive() {
            if filter.process(sample, at(0)).is_some() {
                taps += 1;
            }
        }
        assert_eq!(taps, 1);
    }
}
