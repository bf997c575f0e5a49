//! Frame statistics collaborators.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::render_args::RenderDetails;

/// Receives per-frame statistics from the compositor.
pub trait FrameStatsSink: Send + Sync {
    /// Called once per submitted frame with its index.
    fn frame_submitted(&self, frame_index: u64);

    /// Item counters gathered by the scene pass.
    fn set_render_details(&self, details: &RenderDetails);

    /// Wall-clock duration of a submitted tick.
    fn add_frame_timing(&self, duration: Duration);
}

/// Rolling window of tick durations, in microseconds.
#[derive(Debug, Clone)]
pub struct FrameTimings {
    window: usize,
    samples: VecDeque<u64>,
}

impl FrameTimings {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            samples: VecDeque::with_capacity(window),
        }
    }

    pub fn add(&mut self, duration: Duration) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(duration.as_micros() as u64);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn mean_us(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<u64>() as f64 / self.samples.len() as f64
    }

    pub fn max_us(&self) -> u64 {
        self.samples.iter().copied().max().unwrap_or(0)
    }

    /// Population standard deviation of the window.
    pub fn std_dev_us(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mean = self.mean_us();
        let variance = self
            .samples
            .iter()
            .map(|&s| {
                let d = s as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.samples.len() as f64;
        variance.sqrt()
    }
}

/// Events per second measured over one-second intervals.
#[derive(Debug, Clone)]
pub struct RateCounter {
    interval: Duration,
    interval_start: Option<Instant>,
    count: u32,
    rate: f32,
}

impl Default for RateCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateCounter {
    pub fn new() -> Self {
        Self {
            interval: Duration::from_secs(1),
            interval_start: None,
            count: 0,
            rate: 0.0,
        }
    }

    pub fn increment(&mut self) {
        self.increment_at(Instant::now());
    }

    pub fn increment_at(&mut self, now: Instant) {
        let start = *self.interval_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.interval {
            self.rate = self.count as f32 / elapsed.as_secs_f32();
            self.interval_start = Some(now);
            self.count = 0;
        }
        self.count += 1;
    }

    /// Rate over the last completed interval.
    pub fn rate(&self) -> f32 {
        self.rate
    }
}

#[derive(Debug)]
struct StatsState {
    frames_submitted: u64,
    last_frame_index: Option<u64>,
    details: RenderDetails,
    timings: FrameTimings,
    rate: RateCounter,
}

/// Default statistics sink.
#[derive(Debug)]
pub struct FrameStats {
    state: Mutex<StatsState>,
}

impl FrameStats {
    pub fn new(window: usize) -> Self {
        Self {
            state: Mutex::new(StatsState {
                frames_submitted: 0,
                last_frame_index: None,
                details: RenderDetails::default(),
                timings: FrameTimings::new(window),
                rate: RateCounter::new(),
            }),
        }
    }

    pub fn frames_submitted(&self) -> u64 {
        self.state.lock().frames_submitted
    }

    pub fn last_frame_index(&self) -> Option<u64> {
        self.state.lock().last_frame_index
    }

    pub fn render_details(&self) -> RenderDetails {
        self.state.lock().details
    }

    pub fn timings(&self) -> FrameTimings {
        self.state.lock().timings.clone()
    }

    pub fn frame_rate(&self) -> f32 {
        self.state.lock().rate.rate()
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(120)
    }
}

impl FrameStatsSink for FrameStats {
    fn frame_submitted(&self, frame_index: u64) {
        let mut state = self.state.lock();
        state.frames_submitted += 1;
        state.last_frame_index = Some(frame_index);
        state.rate.increment();
    }

    fn set_render_details(&self, details: &RenderDetails) {
        self.state.lock().details = *details;
    }

    fn add_frame_timing(&self, duration: Duration) {
        self.state.lock().timings.add(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timings_window_drops_oldest() {
        let mut timings = FrameTimings::new(3);
        for us in [100, 200, 300, 400] {
            timings.add(Duration::from_micros(us));
        }
        assert_eq!(timings.len(), 3);
        assert_eq!(timings.max_us(), 400);
        assert!((timings.mean_us() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_timings_std_dev() {
        let mut timings = FrameTimings::new(8);
        for us in [2, 4, 4, 4, 5, 5, 7, 9] {
            timings.add(Duration::from_micros(us));
        }
        assert!((timings.std_dev_us() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rate_counter_reports_after_interval() {
        let mut counter = RateCounter::new();
        let start = Instant::now();
        for i in 0..60 {
            counter.increment_at(start + Duration::from_millis(i * 1000 / 60));
        }
        assert_eq!(counter.rate(), 0.0);
        counter.increment_at(start + Duration::from_secs(1));
        assert!((counter.rate() - 60.0).abs() < 0.5);
    }

    #[test]
    fn test_stats_sink_records_frames() {
        let stats = FrameStats::new(4);
        stats.frame_submitted(1);
        stats.frame_submitted(2);
        stats.add_frame_timing(Duration::from_millis(2));
        assert_eq!(stats.frames_submitted(), 2);
        assert_eq!(stats.last_frame_index(), Some(2));
        assert_eq!(stats.timings().len(), 1);
    }
}
