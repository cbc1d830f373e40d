//! Goal progress for daily wellness targets (water, steps, sleep hours)

use crate::error::VitalsError;
use crate::score::round_half_up;
use serde::{Deserialize, Serialize};

/// Progress toward a target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    /// Whole-number percentage; may exceed 100
    pub percent: f64,
    pub achieved: bool,
}

/// Percentage of `target` reached by `value`
pub fn goal_progress(value: f64, target: f64) -> Result<GoalProgress, VitalsError> {
    if !value.is_finite() || value < 0.0 {
        return Err(VitalsError::InvalidReading(format!(
            "progress value must be a non-negative number, got {}",
            value
        )));
    }
    if !target.is_finite() || target <= 0.0 {
        return Err(VitalsError::InvalidReading(format!(
            "goal target must be positive, got {}",
            target
        )));
    }

    let percent = round_half_up(value / target * 100.0, 0);
    Ok(GoalProgress {
        percent,
        achieved: percent >= 100.0,
    })
}
