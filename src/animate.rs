/// Idle-wobble / periodic-spin driver for the model's Z rotation.
/// State lives here, time is injected, so the machine is testable
/// without a frame loop.

/// Rotation the model settles around while idling.
pub const BASE_ANGLE: f32 = std::f32::consts::PI / 0.5;
/// Wobble amplitude in radians.
pub const WOBBLE_AMPLITUDE: f32 = 0.05;
/// Wobble angular frequency in rad per millisecond of wall-clock time.
pub const WOBBLE_SPEED: f64 = 0.005;
/// Fixed per-frame step while spinning: a quarter-turn-per-50-frames rate
/// scaled to a 16.67 ms nominal frame. Assumes ~60 fps; not retimed by
/// measured frame delta.
pub const SPIN_STEP: f32 = ((std::f32::consts::PI * 2.0 * 0.25) / 50.0) * 16.67;
/// Idle dwell before a spin is triggered, in milliseconds.
pub const IDLE_INTERVAL_MS: f64 = 3000.0;
/// How long a spin lasts, in milliseconds.
pub const SPIN_DURATION_MS: f64 = 450.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinMode {
    Idle,
    Spinning,
}

/// Two-state timer over the model rotation. Constructed once when the
/// model becomes available, advanced every frame.
#[derive(Debug, Clone, Copy)]
pub struct SpinTimer {
    mode: SpinMode,
    last_switch_ms: f64,
    spin_start_ms: f64,
}

impl SpinTimer {
    pub fn new(now_ms: f64) -> Self {
        Self {
            mode: SpinMode::Idle,
            last_switch_ms: now_ms,
            spin_start_ms: now_ms,
        }
    }

    pub fn mode(&self) -> SpinMode {
        self.mode
    }

    pub fn last_switch_ms(&self) -> f64 {
        self.last_switch_ms
    }

    /// Advance one frame and return the model's new Z rotation.
    ///
    /// While idling the rotation is a direct function of wall-clock time
    /// (base angle plus a small sine), recomputed fully each frame. While
    /// spinning a fixed step is added per frame. The frame that triggers
    /// a spin already applies the first step; the frame that ends one
    /// still applies a final step before switching back.
    pub fn advance(&mut self, now_ms: f64, current: f32) -> f32 {
        if self.mode == SpinMode::Idle && now_ms - self.last_switch_ms > IDLE_INTERVAL_MS {
            self.mode = SpinMode::Spinning;
            self.spin_start_ms = now_ms;
        }

        match self.mode {
            SpinMode::Spinning => {
                let rotation = current + SPIN_STEP;
                if now_ms - self.spin_start_ms > SPIN_DURATION_MS {
                    self.mode = SpinMode::Idle;
                    self.last_switch_ms = now_ms;
                }
                rotation
            }
            SpinMode::Idle => {
                BASE_ANGLE + ((now_ms * WOBBLE_SPEED).sin() as f32) * WOBBLE_AMPLITUDE
            }
        }
    }
}

/// Progress-bar fraction in percent, or `None` when the bar should be
/// left untouched (no playback, paused, ended, or unknown duration).
pub fn playback_progress(current_s: f64, duration_s: f64, paused: bool, ended: bool) -> Option<f32> {
    if paused || ended || !(duration_s > 0.0) {
        return None;
    }
    Some(((current_s / duration_s) * 100.0) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wobble_at(now_ms: f64) -> f32 {
        BASE_ANGLE + ((now_ms * WOBBLE_SPEED).sin() as f32) * WOBBLE_AMPLITUDE
    }

    #[test]
    fn idle_rotation_is_pure_wobble() {
        let mut timer = SpinTimer::new(0.0);

        for now in [0.0, 100.0, 999.0, 1500.0, 2999.0] {
            let rotation = timer.advance(now, 0.0);
            assert_eq!(timer.mode(), SpinMode::Idle, "no spin before 3000ms at t={}", now);
            assert_eq!(rotation, wobble_at(now));
        }
    }

    #[test]
    fn spin_triggers_after_idle_interval() {
        let mut timer = SpinTimer::new(0.0);

        // Exactly 3000ms is not "more than" 3000ms.
        timer.advance(3000.0, 0.0);
        assert_eq!(timer.mode(), SpinMode::Idle);

        let rotation = timer.advance(3001.0, 1.0);
        assert_eq!(timer.mode(), SpinMode::Spinning);
        assert_eq!(rotation, 1.0 + SPIN_STEP, "trigger frame applies the first step");
    }

    #[test]
    fn spin_accumulates_fixed_steps() {
        let mut timer = SpinTimer::new(0.0);
        let mut rotation = timer.advance(3001.0, 0.0);

        rotation = timer.advance(3101.0, rotation);
        rotation = timer.advance(3201.0, rotation);
        assert_eq!(timer.mode(), SpinMode::Spinning);
        assert!((rotation - 3.0 * SPIN_STEP).abs() < 1e-5);
    }

    #[test]
    fn spin_ends_after_duration_and_records_switch_time() {
        let mut timer = SpinTimer::new(0.0);
        timer.advance(3001.0, 0.0); // spin_start = 3001

        // Still inside the 450ms window.
        timer.advance(3451.0, 0.0);
        assert_eq!(timer.mode(), SpinMode::Spinning);

        // First frame past the window: one last step, then back to Idle,
        // and last_switch is the transition time, not the spin start.
        let rotation = timer.advance(3452.0, 5.0);
        assert_eq!(timer.mode(), SpinMode::Idle);
        assert_eq!(rotation, 5.0 + SPIN_STEP);
        assert_eq!(timer.last_switch_ms(), 3452.0);

        // And the following frame is wobble again.
        let rotation = timer.advance(3460.0, rotation);
        assert_eq!(rotation, wobble_at(3460.0));
    }

    #[test]
    fn idle_interval_restarts_after_spin() {
        let mut timer = SpinTimer::new(0.0);
        timer.advance(3001.0, 0.0);
        timer.advance(3452.0, 0.0); // back to Idle, switch at 3452

        timer.advance(6452.0, 0.0);
        assert_eq!(timer.mode(), SpinMode::Idle, "3000ms measured from the new switch time");
        timer.advance(6453.0, 0.0);
        assert_eq!(timer.mode(), SpinMode::Spinning);
    }

    #[test]
    fn progress_spans_zero_to_hundred() {
        assert_eq!(playback_progress(0.0, 120.0, false, false), Some(0.0));
        assert_eq!(playback_progress(120.0, 120.0, false, false), Some(100.0));
        assert_eq!(playback_progress(30.0, 120.0, false, false), Some(25.0));
    }

    #[test]
    fn progress_left_unchanged_when_not_playing() {
        assert_eq!(playback_progress(30.0, 120.0, true, false), None);
        assert_eq!(playback_progress(30.0, 120.0, false, true), None);
        assert_eq!(playback_progress(30.0, 0.0, false, false), None);
        assert_eq!(playback_progress(30.0, f64::NAN, false, false), None);
    }
}
