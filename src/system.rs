//! Grading scales and their input bounds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GradeError;

/// The grading scales a grade can be entered or displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeSystem {
    /// Swiss-style 1–6, 6 best.
    #[serde(rename = "6best")]
    SixBest,
    /// German-style 1–6, 1 best.
    #[serde(rename = "1best")]
    OneBest,
    /// Letter-equivalent 0.0–4.0.
    #[serde(rename = "american")]
    American,
    #[serde(rename = "gpa")]
    Gpa,
    #[serde(rename = "percentage")]
    Percentage,
    /// International Baccalaureate 1–7, 7 best.
    #[serde(rename = "ib")]
    Ib,
}

/// Input bounds for a grading scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradeRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl GradeRange {
    /// Saturates `value` into `[min, max]`.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl GradeSystem {
    pub const ALL: [GradeSystem; 6] = [
        GradeSystem::SixBest,
        GradeSystem::OneBest,
        GradeSystem::American,
        GradeSystem::Gpa,
        GradeSystem::Percentage,
        GradeSystem::Ib,
    ];

    /// The canonical scale every grade is persisted in.
    pub const STORAGE: GradeSystem = GradeSystem::SixBest;

    pub fn range(self) -> GradeRange {
        let (min, max, step) = match self {
            GradeSystem::SixBest | GradeSystem::OneBest => (1.0, 6.0, 0.01),
            GradeSystem::American | GradeSystem::Gpa => (0.0, 4.0, 0.01),
            GradeSystem::Percentage => (0.0, 100.0, 0.1),
            GradeSystem::Ib => (1.0, 7.0, 1.0),
        };
        GradeRange { min, max, step }
    }

    /// `false` only for scales where the smallest number is the best grade.
    pub fn higher_is_better(self) -> bool {
        !matches!(self, GradeSystem::OneBest)
    }

    /// Both 0.0–4.0 scales, which convert between each other unchanged.
    pub fn is_four_point(self) -> bool {
        matches!(self, GradeSystem::American | GradeSystem::Gpa)
    }

    pub fn tag(self) -> &'static str {
        match self {
            GradeSystem::SixBest => "6best",
            GradeSystem::OneBest => "1best",
            GradeSystem::American => "american",
            GradeSystem::Gpa => "gpa",
            GradeSystem::Percentage => "percentage",
            GradeSystem::Ib => "ib",
        }
    }
}

/// Input bounds for building validation rules in a calling form.
pub fn grade_range(system: GradeSystem) -> GradeRange {
    system.range()
}

impl fmt::Display for GradeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for GradeSystem {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        GradeSystem::ALL
            .into_iter()
            .find(|system| {
                system.tag() == needle || format!("{system:?}").to_ascii_lowercase() == needle
            })
            .ok_or_else(|| GradeError::UnknownSystem(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_match_scale_definitions() {
        assert_eq!(
            grade_range(GradeSystem::SixBest),
            GradeRange { min: 1.0, max: 6.0, step: 0.01 }
        );
        assert_eq!(grade_range(GradeSystem::OneBest).max, 6.0);
        assert_eq!(grade_range(GradeSystem::American).max, 4.0);
        assert_eq!(grade_range(GradeSystem::Gpa).min, 0.0);
        assert_eq!(grade_range(GradeSystem::Percentage).step, 0.1);
        assert_eq!(
            grade_range(GradeSystem::Ib),
            GradeRange { min: 1.0, max: 7.0, step: 1.0 }
        );
    }

    #[test]
    fn parses_tags_and_variant_names() {
        assert_eq!("6best".parse::<GradeSystem>(), Ok(GradeSystem::SixBest));
        assert_eq!("OneBest".parse::<GradeSystem>(), Ok(GradeSystem::OneBest));
        assert_eq!(" GPA ".parse::<GradeSystem>(), Ok(GradeSystem::Gpa));
        assert_eq!("ib".parse::<GradeSystem>(), Ok(GradeSystem::Ib));
        assert_eq!(
            "letters".parse::<GradeSystem>(),
            Err(GradeError::UnknownSystem("letters".into()))
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        for system in GradeSystem::ALL {
            assert_eq!(system.to_string().parse::<GradeSystem>(), Ok(system));
        }
    }

    #[test]
    fn serde_uses_tags() {
        let json = serde_json::to_string(&GradeSystem::OneBest).unwrap();
        assert_eq!(json, "\"1best\"");
        let parsed: GradeSystem = serde_json::from_str("\"percentage\"").unwrap();
        assert_eq!(parsed, GradeSystem::Percentage);
    }

    #[test]
    fn only_one_best_is_inverted() {
        let inverted: Vec<_> = GradeSystem::ALL
            .into_iter()
            .filter(|s| !s.higher_is_better())
            .collect();
        assert_eq!(inverted, vec![GradeSystem::OneBest]);
    }
}
