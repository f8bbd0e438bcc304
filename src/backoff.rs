use std::time::Duration;

use rand::Rng;

const INITIAL_RETRY_DELAY_SECS: f64 = 0.5;
const MAX_RETRY_DELAY_SECS: f64 = 8.0;

/// Source of the jitter fraction applied to backoff delays.
///
/// The default samples uniformly from `[0, 1)`; [`JitterSource::Fixed`]
/// pins the fraction so tests can assert exact delays.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum JitterSource {
    #[default]
    Uniform,
    Fixed(f64),
}

impl JitterSource {
    pub(crate) fn sample(&self) -> f64 {
        match self {
            Self::Uniform => rand::thread_rng().gen::<f64>(),
            Self::Fixed(unit) => unit.clamp(0.0, 1.0),
        }
    }
}

/// Exponential backoff delay for the attempt with `retries_remaining` left
/// out of `max_retries`.
///
/// The unjittered delay doubles per consumed retry from 0.5s up to a cap of
/// 8s; the jitter fraction shaves off up to 25% of it, so the realized delay
/// lies in `[0.75x, 1.0x]` of the unjittered value.
pub(crate) fn retry_delay(retries_remaining: u32, max_retries: u32, jitter_unit: f64) -> Duration {
    let attempts_so_far = max_retries.saturating_sub(retries_remaining);
    let exponential = INITIAL_RETRY_DELAY_SECS * 2f64.powi(attempts_so_far.min(62) as i32);
    let capped = exponential.min(MAX_RETRY_DELAY_SECS);
    Duration::from_secs_f64(capped * (1.0 - jitter_unit * 0.25))
}
