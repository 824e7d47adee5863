use serde::{Deserialize, Serialize};

use crate::error::MouldError;

/// Radial gap between the inner mould and the base ring's inner edge, in mm.
pub const RING_CLEARANCE: f64 = 0.5;

/// Height of the pour reservoir added above the rim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlipWellType {
    None,
    #[default]
    Regular,
    Tall,
}

impl SlipWellType {
    /// Well height in mm.
    #[must_use]
    pub fn height(self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Regular => 20.0,
            Self::Tall => 40.0,
        }
    }
}

/// How many pieces the outer mould and ring are split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SplitCount {
    #[default]
    Halves,
    Quarters,
}

impl TryFrom<u8> for SplitCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::Halves),
            4 => Ok(Self::Quarters),
            other => Err(format!("split count must be 2 or 4, got {other}")),
        }
    }
}

impl From<SplitCount> for u8 {
    fn from(value: SplitCount) -> Self {
        match value {
            SplitCount::Halves => 2,
            SplitCount::Quarters => 4,
        }
    }
}

/// Numeric mould parameters. All lengths are millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MouldParameters {
    /// Fraction the clay shrinks by on firing, in `(0, 1)`.
    pub shrinkage_rate: f64,
    pub wall_thickness: f64,
    pub slip_well_type: SlipWellType,
    /// Radial plaster gap between inner and outer mould.
    pub cavity_gap: f64,
    pub split_count: SplitCount,
    pub outer_wall_thickness: f64,
    /// Radial gap between a ridge and its groove.
    pub clearance: f64,
    pub ring_height: f64,
    pub pour_hole_radius: f64,
}

impl Default for MouldParameters {
    fn default() -> Self {
        Self {
            shrinkage_rate: 0.13,
            wall_thickness: 2.4,
            slip_well_type: SlipWellType::Regular,
            cavity_gap: 25.0,
            split_count: SplitCount::Halves,
            outer_wall_thickness: 6.0,
            clearance: 0.3,
            ring_height: 10.0,
            pour_hole_radius: 5.0,
        }
    }
}

impl MouldParameters {
    /// Checks every field against its documented range.
    ///
    /// # Errors
    ///
    /// Returns `MouldError::InvalidParameters` naming the first bad field.
    pub fn validate(&self) -> Result<(), MouldError> {
        let invalid = |message: String| Err(MouldError::InvalidParameters(message));
        let all = [
            self.shrinkage_rate,
            self.wall_thickness,
            self.cavity_gap,
            self.outer_wall_thickness,
            self.clearance,
            self.ring_height,
            self.pour_hole_radius,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return invalid("parameters must be finite numbers".into());
        }
        if self.shrinkage_rate <= 0.0 || self.shrinkage_rate >= 1.0 {
            return invalid(format!(
                "shrinkage rate must be in (0, 1), got {}",
                self.shrinkage_rate
            ));
        }
        for (name, value) in [
            ("wall thickness", self.wall_thickness),
            ("outer wall thickness", self.outer_wall_thickness),
            ("ring height", self.ring_height),
        ] {
            if value <= 0.0 {
                return invalid(format!("{name} must be positive, got {value}"));
            }
        }
        if self.cavity_gap <= RING_CLEARANCE {
            return invalid(format!(
                "cavity gap must exceed {RING_CLEARANCE} mm, got {}",
                self.cavity_gap
            ));
        }
        if self.clearance < 0.0 || self.pour_hole_radius < 0.0 {
            return invalid("clearance and pour hole radius must not be negative".into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let params: MouldParameters =
            serde_json::from_str(r#"{"wallThickness": 3.0, "slipWellType": "tall"}"#).unwrap();
        assert_eq!(params.wall_thickness, 3.0);
        assert_eq!(params.slip_well_type, SlipWellType::Tall);
        assert_eq!(params.cavity_gap, 25.0);
        assert_eq!(params.split_count, SplitCount::Halves);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn split_count_is_two_or_four() {
        let quarters: MouldParameters = serde_json::from_str(r#"{"splitCount": 4}"#).unwrap();
        assert_eq!(quarters.split_count, SplitCount::Quarters);
        assert!(serde_json::from_str::<MouldParameters>(r#"{"splitCount": 3}"#).is_err());
        let json = serde_json::to_value(quarters).unwrap();
        assert_eq!(json["splitCount"], 4);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases = [
            MouldParameters {
                shrinkage_rate: 1.0,
                ..MouldParameters::default()
            },
            MouldParameters {
                wall_thickness: 0.0,
                ..MouldParameters::default()
            },
            MouldParameters {
                cavity_gap: 0.5,
                ..MouldParameters::default()
            },
            MouldParameters {
                clearance: -0.1,
                ..MouldParameters::default()
            },
            MouldParameters {
                ring_height: f64::NAN,
                ..MouldParameters::default()
            },
        ];
        for params in cases {
            assert!(matches!(
                params.validate(),
                Err(MouldError::InvalidParameters(_))
            ));
        }
    }

    #[test]
    fn slip_well_heights() {
        assert_eq!(SlipWellType::None.height(), 0.0);
        assert_eq!(SlipWellType::Regular.height(), 20.0);
        assert_eq!(SlipWellType::Tall.height(), 40.0);
    }
}
