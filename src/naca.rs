//! NACA 4-digit airfoil designations and surface geometry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use ultraviolet::DVec2;

use crate::config::GEOMETRY_CACHE_CAPACITY;
use crate::error::{SweepError, SweepResult};
use crate::profile_scope;

/// A NACA 4-digit section. All fields are in percent chord.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NacaFourDigit {
    max_camber: u8,
    camber_location: u8,
    thickness: u8,
}

impl NacaFourDigit {
    pub fn new(max_camber: u8, camber_location: u8, thickness: u8) -> SweepResult<Self> {
        if max_camber > 9 {
            return Err(SweepError::InvalidAirfoil(format!(
                "max camber {}% does not fit one digit",
                max_camber
            )));
        }
        if camber_location > 90 || camber_location % 10 != 0 {
            return Err(SweepError::InvalidAirfoil(format!(
                "camber location {}% must be a multiple of 10 between 0 and 90",
                camber_location
            )));
        }
        if thickness == 0 || thickness > 99 {
            return Err(SweepError::InvalidAirfoil(format!(
                "thickness {}% must be between 1 and 99",
                thickness
            )));
        }
        Ok(Self {
            max_camber,
            camber_location,
            thickness,
        })
    }

    pub fn max_camber(&self) -> u8 {
        self.max_camber
    }

    pub fn camber_location(&self) -> u8 {
        self.camber_location
    }

    pub fn thickness(&self) -> u8 {
        self.thickness
    }

    /// Designation such as `NACA2412`. The second digit is the camber
    /// location in tenths of chord.
    pub fn name(&self) -> String {
        format!(
            "NACA{}{}{:02}",
            self.max_camber,
            self.camber_location / 10,
            self.thickness
        )
    }

    pub fn max_camber_fraction(&self) -> f64 {
        self.max_camber as f64 / 100.0
    }

    /// Percent chord to chord fraction, like the other parameters: 40 is 0.4.
    pub fn camber_location_fraction(&self) -> f64 {
        self.camber_location as f64 / 100.0
    }

    pub fn thickness_fraction(&self) -> f64 {
        self.thickness as f64 / 100.0
    }

    pub fn is_symmetric(&self) -> bool {
        self.max_camber == 0 || self.camber_location == 0
    }

    /// Half-thickness at chord station `x` (0..=1).
    pub fn half_thickness(&self, x: f64) -> f64 {
        let t = self.thickness_fraction();
        5.0 * t
            * (0.2969 * x.sqrt() - 0.1260 * x - 0.3516 * x.powi(2) + 0.2843 * x.powi(3)
                - 0.1015 * x.powi(4))
    }

    /// Mean camber line height and slope at `x`.
    pub fn camber_line(&self, x: f64) -> (f64, f64) {
        if self.is_symmetric() {
            return (0.0, 0.0);
        }
        let m = self.max_camber_fraction();
        let p = self.camber_location_fraction();
        if x < p {
            let yc = m / (p * p) * (2.0 * p * x - x * x);
            let slope = 2.0 * m / (p * p) * (p - x);
            (yc, slope)
        } else {
            let q = (1.0 - p) * (1.0 - p);
            let yc = m / q * ((1.0 - 2.0 * p) + 2.0 * p * x - x * x);
            let slope = 2.0 * m / q * (p - x);
            (yc, slope)
        }
    }

    /// Upper and lower surface points at chord station `x`, offset
    /// perpendicular to the camber line.
    pub fn surface_points(&self, x: f64) -> (DVec2, DVec2) {
        let yt = self.half_thickness(x);
        let (yc, slope) = self.camber_line(x);
        let theta = slope.atan();
        let (sin, cos) = theta.sin_cos();
        let upper = DVec2::new(x - yt * sin, yc + yt * cos);
        let lower = DVec2::new(x + yt * sin, yc - yt * cos);
        (upper, lower)
    }

    /// Surface coordinates at `num_points` cosine-spaced stations with the
    /// leading and trailing edge stations dropped.
    pub fn surface_coordinates(&self, num_points: usize) -> SurfaceCoordinates {
        profile_scope!("naca_geometry");
        let stations = cosine_spacing(num_points);
        let interior = stations.len().saturating_sub(2);
        let mut upper = Vec::with_capacity(interior);
        let mut lower = Vec::with_capacity(interior);

        for &x in stations.iter().skip(1).take(interior) {
            let (u, l) = self.surface_points(x);
            upper.push(u);
            lower.push(l);
        }

        SurfaceCoordinates { upper, lower }
    }
}

impl fmt::Display for NacaFourDigit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Chord stations clustered towards both edges.
pub fn cosine_spacing(num_points: usize) -> Vec<f64> {
    if num_points < 2 {
        return vec![0.0; num_points];
    }
    let last = (num_points - 1) as f64;
    (0..num_points)
        .map(|i| 0.5 * (1.0 - (std::f64::consts::PI * i as f64 / last).cos()))
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceCoordinates {
    pub upper: Vec<DVec2>,
    pub lower: Vec<DVec2>,
}

impl SurfaceCoordinates {
    pub fn upper_y(&self) -> impl Iterator<Item = f64> + '_ {
        self.upper.iter().map(|p| p.y)
    }

    pub fn lower_y(&self) -> impl Iterator<Item = f64> + '_ {
        self.lower.iter().map(|p| p.y)
    }

    pub fn len(&self) -> usize {
        self.upper.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }
}

static GEOMETRY_CACHE: Lazy<Mutex<HashMap<(NacaFourDigit, usize), Arc<SurfaceCoordinates>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Geometry for `airfoil`, shared between every case that uses it.
pub fn cached_coordinates(airfoil: NacaFourDigit, num_points: usize) -> Arc<SurfaceCoordinates> {
    let key = (airfoil, num_points);
    if let Some(hit) = GEOMETRY_CACHE.lock().get(&key) {
        return Arc::clone(hit);
    }

    // Computed outside the lock; a racing worker may compute the same entry.
    let coords = Arc::new(airfoil.surface_coordinates(num_points));

    let mut cache = GEOMETRY_CACHE.lock();
    if cache.len() >= GEOMETRY_CACHE_CAPACITY {
        cache.clear();
    }
    Arc::clone(cache.entry(key).or_insert(coords))
}
