//! Directional cone in Fourier space

use crate::directions::Direction;
use std::f64::consts::PI;

/// Angular extent of a cone around its axis, folded onto the valid ranges
///
/// Descriptive only: [`Cone::contains`] tests the angle to the axis directly
/// and never reads these bounds.
///
/// Tilt bounds live in `[-π/2, π/2]` and rot bounds in `[0, π]`; a bound that
/// leaves its range is shifted by π and the corresponding flag is raised.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConeBounds {
    pub tilt_minus: f64,
    pub tilt_plus: f64,
    pub rot_minus: f64,
    pub rot_plus: f64,
    pub tilt_wrapped: bool,
    pub rot_wrapped: bool,
}

impl ConeBounds {
    /// Bounds of a cone of full aperture `angle` (degrees) around `direction`
    pub fn new(direction: Direction, angle: f64) -> Self {
        let half = 0.5 * angle;
        let mut tilt_plus = (direction.tilt + half) * PI / 180.0;
        let mut tilt_minus = (direction.tilt - half) * PI / 180.0;
        let mut rot_plus = (direction.rot + half) * PI / 180.0;
        let mut rot_minus = (direction.rot - half) * PI / 180.0;

        let mut tilt_wrapped = false;
        let mut rot_wrapped = false;

        if tilt_plus >= PI / 2.0 {
            tilt_plus -= PI;
            tilt_wrapped = true;
        }
        if tilt_minus <= -PI / 2.0 {
            tilt_minus += PI;
            tilt_wrapped = true;
        }
        if rot_plus >= PI {
            rot_plus -= PI;
            rot_wrapped = true;
        }
        if rot_minus <= 0.0 {
            rot_minus += PI;
            rot_wrapped = true;
        }

        Self { tilt_minus, tilt_plus, rot_minus, rot_plus, tilt_wrapped, rot_wrapped }
    }
}

/// Double cone (axis and its antipode) of a given aperture
#[derive(Clone, Copy, Debug)]
pub struct Cone {
    axis: [f64; 3],
    cos_half_angle: f64,
}

impl Cone {
    /// Cone of full aperture `angle` degrees around `direction`
    pub fn new(direction: Direction, angle: f64) -> Self {
        Self {
            axis: direction.unit_vector(),
            cos_half_angle: (0.5 * angle * PI / 180.0).cos(),
        }
    }

    pub fn axis(&self) -> [f64; 3] {
        self.axis
    }

    /// Whether the unit orientation `u` lies inside the cone or its mirror
    #[inline]
    pub fn contains(&self, u: &[f64; 3]) -> bool {
        let dot = u[0] * self.axis[0] + u[1] * self.axis[1] + u[2] * self.axis[2];
        dot.abs() >= self.cos_half_angle
    }
}
