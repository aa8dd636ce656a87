//! Conversion between grading scales via a normalized performance axis.
//!
//! Every scale maps onto `[0, 1]`, where `1.0` is the best possible grade.
//! Converting is normalizing under the source scale followed by the inverse
//! mapping of the target scale. Values outside a scale saturate at its ends.

use crate::error::GradeError;
use crate::system::GradeSystem;

/// A pair of mappings between a scale and the `[0, 1]` performance axis.
struct Scale {
    normalize: fn(f64) -> f64,
    denormalize: fn(f64) -> f64,
}

static SIX_BEST: Scale = Scale {
    normalize: |v: f64| ((v - 1.0) / 5.0).clamp(0.0, 1.0),
    denormalize: |n: f64| 1.0 + n * 5.0,
};

static ONE_BEST: Scale = Scale {
    normalize: |v: f64| (1.0 - (v - 1.0) / 5.0).clamp(0.0, 1.0),
    denormalize: |n: f64| 1.0 + (1.0 - n) * 5.0,
};

static FOUR_POINT: Scale = Scale {
    normalize: |v: f64| (v / 4.0).clamp(0.0, 1.0),
    denormalize: |n: f64| n * 4.0,
};

static PERCENTAGE: Scale = Scale {
    normalize: |v: f64| (v / 100.0).clamp(0.0, 1.0),
    denormalize: |n: f64| n * 100.0,
};

static IB: Scale = Scale {
    normalize: |v: f64| ((v - 1.0) / 6.0).clamp(0.0, 1.0),
    denormalize: |n: f64| 1.0 + n * 6.0,
};

fn scale(system: GradeSystem) -> &'static Scale {
    match system {
        GradeSystem::SixBest => &SIX_BEST,
        GradeSystem::OneBest => &ONE_BEST,
        GradeSystem::American | GradeSystem::Gpa => &FOUR_POINT,
        GradeSystem::Percentage => &PERCENTAGE,
        GradeSystem::Ib => &IB,
    }
}

/// Maps `value` under `system` onto `[0, 1]`, `1.0` being the best grade.
pub fn normalize(value: f64, system: GradeSystem) -> f64 {
    (scale(system).normalize)(value)
}

/// Maps a performance `n` back onto `system`'s scale. `n` is clamped to `[0, 1]`.
pub fn denormalize(n: f64, system: GradeSystem) -> f64 {
    (scale(system).denormalize)(n.clamp(0.0, 1.0))
}

/// Converts `value` from one grading scale to another.
///
/// Out-of-range values saturate to the nearest end of `from`'s scale.
/// The result is not rounded; callers round for display only.
///
/// # Errors
///
/// Returns [`GradeError::InvalidGrade`] if `value` is NaN or infinite.
pub fn convert(value: f64, from: GradeSystem, to: GradeSystem) -> Result<f64, GradeError> {
    if !value.is_finite() {
        return Err(GradeError::InvalidGrade(value));
    }

    if from == to {
        return Ok(value);
    }

    if from.is_four_point() && to.is_four_point() {
        return Ok(from.range().clamp(value));
    }

    Ok(denormalize(normalize(value, from), to))
}
