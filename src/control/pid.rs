//! PID controller for chamber humidity
//!
//! Proportional-on-measurement PID: the proportional term acts on the
//! change in the measured value rather than on the error, so a new
//! setpoint does not kick the pump.  The running sum is clamped to the
//! output limits (anti-windup).

/// Seam between the humidity policy and the arithmetic that drives it.
pub trait Regulator {
    fn set_target(&mut self, setpoint: f64);

    /// Forget the integral term and the last sample.
    fn reset(&mut self);

    /// Start a fresh history at `input` / `now_ms` without producing output.
    fn seed(&mut self, input: f64, now_ms: u32);

    /// Compute the output for a new sample.
    fn compute(&mut self, input: f64, now_ms: u32) -> f64;
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    input: f64,
    at_ms: u32,
}

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,
    setpoint: f64,
    output_sum: f64,
    last: Option<Sample>,
    output_min: f64,
    output_max: f64,
}

impl PidController {
    pub fn new(kp: f64, ki: f64, kd: f64, setpoint: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            setpoint,
            output_sum: 0.0,
            last: None,
            output_min: f64::NEG_INFINITY,
            output_max: f64::INFINITY,
        }
    }

    /// Set output limits
    pub fn set_limits(&mut self, min: f64, max: f64) {
        self.output_min = min;
        self.output_max = max;
        self.output_sum = self.output_sum.clamp(min, max);
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }
}

impl Regulator for PidController {
    fn set_target(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    fn reset(&mut self) {
        self.output_sum = 0.0;
        self.last = None;
    }

    fn seed(&mut self, input: f64, now_ms: u32) {
        self.output_sum = 0.0;
        self.last = Some(Sample { input, at_ms: now_ms });
    }

    fn compute(&mut self, input: f64, now_ms: u32) -> f64 {
        // An unseeded controller treats its first sample as the history.
        let (d_input, dt) = match self.last {
            Some(prev) => (
                input - prev.input,
                now_ms.wrapping_sub(prev.at_ms) as f64 / 1000.0,
            ),
            None => (0.0, 0.0),
        };
        let error = self.setpoint - input;

        // Integral plus proportional-on-measurement, clamped (anti-windup)
        self.output_sum += self.ki * error * dt;
        self.output_sum -= self.kp * d_input;
        self.output_sum = self.output_sum.clamp(self.output_min, self.output_max);

        // Derivative on measurement
        let derivative = if dt > 0.0 { d_input / dt } else { 0.0 };

        self.last = Some(Sample { input, at_ms: now_ms });

        (self.output_sum - self.kd * derivative).clamp(self.output_min, self.output_max)
    }
}
