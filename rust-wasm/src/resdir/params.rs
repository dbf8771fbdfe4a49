//! Run parameters of the directional resolution analysis

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use super::sweep::SweepConfig;
use crate::error::{ResDirError, ResDirResult};
use crate::symmetry::SymmetryGroup;

/// Parameters for the directional resolution analysis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResDirParams {
    /// Pixel size (Å/voxel)
    pub sampling: f64,
    /// Angular step between sampled directions (degrees)
    pub angular_sampling: f64,
    /// Radius beyond which voxels are ignored (voxels)
    pub volume_radius: f64,
    /// Finest resolution tested (Å)
    pub min_res: f64,
    /// Coarsest resolution tested, the sweep starting point (Å)
    pub max_res: f64,
    /// Number of candidate resolutions between `max_res` and `min_res`
    pub n_freq: usize,
    /// Confidence level of the signal-vs-noise test, in (0.5, 1)
    pub significance: f64,
    /// Full aperture of the directional cone (degrees); `angular_sampling` when unset
    pub cone_angle: Option<f64>,
    /// With half maps, estimate noise only at the signal voxels
    pub noise_only_in_halves: bool,
    /// Point-group symmetry of the map
    pub symmetry: String,
}

impl Default for ResDirParams {
    fn default() -> Self {
        Self {
            sampling: 1.0,
            angular_sampling: 15.0,
            volume_radius: 100.0,
            min_res: 1.0,
            max_res: 30.0,
            n_freq: 50,
            significance: 0.95,
            cone_angle: None,
            noise_only_in_halves: false,
            symmetry: "c1".to_string(),
        }
    }
}

impl ResDirParams {
    /// Parse parameters from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> ResDirResult<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json(&self) -> ResDirResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn cone_angle(&self) -> f64 {
        self.cone_angle.unwrap_or(self.angular_sampling)
    }

    pub fn symmetry_group(&self) -> ResDirResult<SymmetryGroup> {
        SymmetryGroup::parse(&self.symmetry)
    }

    /// One-sided critical value `Φ⁻¹(significance)` of the standard normal
    pub fn critical_z(&self) -> ResDirResult<f64> {
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(ResDirError::InvalidParameter(format!(
                "significance must be in (0, 1), got {}",
                self.significance
            )));
        }
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ResDirError::InvalidParameter(e.to_string()))?;
        Ok(normal.inverse_cdf(self.significance))
    }

    pub fn sweep_config(&self) -> ResDirResult<SweepConfig> {
        Ok(SweepConfig {
            sampling: self.sampling,
            min_res: self.min_res,
            max_res: self.max_res,
            n_freq: self.n_freq,
            z_crit: self.critical_z()?,
            noise_only_in_halves: self.noise_only_in_halves,
        })
    }

    /// Check ranges before any work is done
    pub fn validate(&self) -> ResDirResult<()> {
        let invalid = |msg: String| Err(ResDirError::InvalidParameter(msg));

        if !(self.sampling > 0.0 && self.sampling.is_finite()) {
            return invalid(format!("sampling must be positive, got {}", self.sampling));
        }
        if !(self.angular_sampling > 0.0 && self.angular_sampling <= 90.0) {
            return invalid(format!("angular_sampling must be in (0, 90], got {}", self.angular_sampling));
        }
        let cone = self.cone_angle();
        if !(cone > 0.0 && cone <= 180.0) {
            return invalid(format!("cone_angle must be in (0, 180], got {}", cone));
        }
        if !(self.volume_radius > 0.0) {
            return invalid(format!("volume_radius must be positive, got {}", self.volume_radius));
        }
        if !(self.min_res > 0.0 && self.min_res.is_finite()) {
            return invalid(format!("min_res must be positive, got {}", self.min_res));
        }
        if !(self.max_res > self.min_res && self.max_res.is_finite()) {
            return invalid(format!(
                "max_res ({}) must be larger than min_res ({})",
                self.max_res, self.min_res
            ));
        }
        if self.n_freq == 0 {
            return invalid("n_freq must be at least 1".to_string());
        }
        if !(self.significance > 0.5 && self.significance < 1.0) {
            return invalid(format!("significance must be in (0.5, 1), got {}", self.significance));
        }
        self.symmetry_group()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_defaults_are_valid() {
        let p = ResDirParams::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.cone_angle(), p.angular_sampling);
    }

    #[test]
    fn test_critical_value_95() {
        let p = ResDirParams { significance: 0.95, ..Default::default() };
        assert_abs_diff_eq!(p.critical_z().unwrap(), 1.6448536269514722, epsilon = 1e-7);
    }

    #[test]
    fn test_critical_value_tail() {
        let p = ResDirParams { significance: 0.999, ..Default::default() };
        assert_abs_diff_eq!(p.critical_z().unwrap(), 3.090232306167813, epsilon = 1e-6);
        assert!(p.sweep_config().unwrap().z_crit > 3.0);
    }

    #[test]
    fn test_critical_value_out_of_range() {
        for significance in [0.0, 1.0, 1.5, f64::NAN] {
            let p = ResDirParams { significance, ..Default::default() };
            assert!(matches!(p.critical_z(), Err(ResDirError::InvalidParameter(_))));
        }
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let p = ResDirParams::from_json(r#"{"sampling": 1.5, "symmetry": "D2", "cone_angle": 20}"#).unwrap();
        assert_eq!(p.sampling, 1.5);
        assert_eq!(p.cone_angle(), 20.0);
        assert_eq!(p.max_res, 30.0);
        assert_eq!(p.symmetry_group().unwrap(), SymmetryGroup::Dihedral(2));
    }

    #[test]
    fn test_invalid_values() {
        let p = ResDirParams { min_res: 10.0, max_res: 5.0, ..Default::default() };
        assert!(matches!(p.validate(), Err(ResDirError::InvalidParameter(_))));

        let p = ResDirParams { symmetry: "o".to_string(), ..Default::default() };
        assert!(matches!(p.validate(), Err(ResDirError::UnsupportedSymmetry(_))));

        assert!(matches!(
            ResDirParams::from_json("{not json"),
            Err(ResDirError::Serialization(_))
        ));
    }
}
