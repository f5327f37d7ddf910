//! One Euro Filter over a single scalar channel.
//!
//! Timestamps are frame numbers, so the sampling frequency is re-estimated
//! from the gap between consecutive samples. A zero timestamp counts as
//! unknown: a sequence starting at frame 0 keeps the configured frequency
//! for its second sample.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Filter parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneEuroParams {
    /// Initial sampling frequency (samples per timestamp unit)
    pub freq: f32,
    /// Minimum cutoff frequency - lower = smoother at rest
    pub min_cutoff: f32,
    /// Speed coefficient - higher = less lag during fast motion
    pub beta: f32,
    /// Derivative cutoff frequency
    pub d_cutoff: f32,
}

impl OneEuroParams {
    pub const fn new(freq: f32, min_cutoff: f32, beta: f32, d_cutoff: f32) -> Self {
        Self {
            freq,
            min_cutoff,
            beta,
            d_cutoff,
        }
    }
}

/// Low-pass filter component
#[derive(Debug, Clone, Default)]
struct LowPassFilter {
    /// Last raw input
    raw: Option<f32>,
    /// Last filtered output
    filtered: f32,
}

impl LowPassFilter {
    fn filter(&mut self, value: f32, alpha: f32) -> f32 {
        let result = match self.raw {
            Some(_) => self.filtered + alpha * (value - self.filtered),
            None => value,
        };
        self.raw = Some(value);
        self.filtered = result;
        result
    }

    fn last_raw(&self) -> Option<f32> {
        self.raw
    }
}

/// alpha = 1 / (1 + tau/Te), tau = 1/(2*pi*fc), Te = 1/freq
fn smoothing_factor(freq: f32, cutoff: f32) -> f32 {
    let te = 1.0 / freq;
    let tau = 1.0 / (2.0 * PI * cutoff);
    1.0 / (1.0 + tau / te)
}

/// Adaptive low-pass filter for one channel
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    params: OneEuroParams,
    freq: f32,
    x: LowPassFilter,
    dx: LowPassFilter,
    last_time: Option<f32>,
}

impl OneEuroFilter {
    pub fn new(params: OneEuroParams) -> Self {
        Self {
            params,
            freq: params.freq,
            x: LowPassFilter::default(),
            dx: LowPassFilter::default(),
            last_time: None,
        }
    }

    /// Filter `value` sampled at `timestamp`.
    pub fn filter(&mut self, value: f32, timestamp: f32) -> f32 {
        if let Some(last) = self.last_time.filter(|&last| last != 0.0) {
            if timestamp != 0.0 && timestamp > last {
                self.freq = 1.0 / (timestamp - last);
            }
        }
        self.last_time = Some(timestamp);

        let dx = match self.x.last_raw() {
            Some(prev) => (value - prev) * self.freq,
            None => 0.0,
        };
        let edx = self
            .dx
            .filter(dx, smoothing_factor(self.freq, self.params.d_cutoff));
        let cutoff = self.params.min_cutoff + self.params.beta * edx.abs();
        self.x.filter(value, smoothing_factor(self.freq, cutoff))
    }
}
