//! Anomaly detector (C6): flags a fake-capacity verdict when a file's write
//! speed falls far enough outside the frozen baseline.

use fdcore::error::SpeedVerdict;
use fdcore::plan::BaselineStats;

/// Multiplier below which a post-baseline write speed is flagged as a
/// speed collapse.
const SPEED_COLLAPSE_FACTOR: f64 = 0.10;

/// Multiplier above which a post-baseline write speed is flagged as a
/// phantom write.
const PHANTOM_WRITE_FACTOR: f64 = 10.0;

/// Observes one file's write speed against `baseline`, updating it if it is
/// still accumulating. Returns a verdict if this observation is anomalous;
/// the baseline window itself never produces a verdict.
#[must_use]
pub fn observe(baseline: &mut BaselineStats, speed_mibs: f64) -> Option<SpeedVerdict> {
    if !baseline.is_frozen() {
        baseline.observe(speed_mibs);
        return None;
    }

    let frozen = baseline.frozen_mibs().expect("frozen baseline always has a mean");
    if speed_mibs < SPEED_COLLAPSE_FACTOR * frozen {
        Some(SpeedVerdict::SpeedCollapse)
    } else if speed_mibs > PHANTOM_WRITE_FACTOR * frozen {
        Some(SpeedVerdict::PhantomWrite)
    } else {
        None
    }
}
