use std::time::Instant;

/// Frame timing for the engine: measures wall time between ticks and turns
/// raw deltas into the animation time actually simulated.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_measure: Instant,
    max_delta: Option<f32>,
    /// Sum of every delta handed to the update pipeline, after capping.
    simulated: f64,
}

impl FrameClock {
    /// Starts measuring from now. `max_delta` caps every simulated step.
    #[must_use]
    pub fn new(max_delta: Option<f32>) -> Self {
        Self {
            last_measure: Instant::now(),
            max_delta: max_delta.map(|max| max.max(0.0)),
            simulated: 0.0,
        }
    }

    /// Wall-clock seconds since the previous call (or since creation).
    pub fn measure(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last_measure).as_secs_f32();
        self.last_measure = now;
        dt
    }

    /// Caps `dt` at the max delta, counts it as simulated and returns it.
    /// Negative deltas simulate nothing.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let dt = dt.max(0.0);
        let dt = self.max_delta.map_or(dt, |max| dt.min(max));
        self.simulated += f64::from(dt);
        dt
    }

    #[inline]
    #[must_use]
    pub fn simulated_seconds(&self) -> f64 {
        self.simulated
    }
}
