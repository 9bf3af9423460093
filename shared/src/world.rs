//! World bounds and the scale-dependent values derived from them.
//!
//! The room model can be authored at any scale, so the avatar radius, the
//! ground-ray start height, the camera zoom range and the clip planes are all
//! fitted to the loaded geometry once, right after load.

use bevy::prelude::*;

use crate::avatar::DEFAULT_RADIUS;

/// Height the ground ray starts from before any geometry is known.
pub const DEFAULT_RAY_TOP_Y: f32 = 50.0;

/// Third-person zoom range before load.
pub const DEFAULT_MIN_DISTANCE: f32 = 2.2;
pub const DEFAULT_MAX_DISTANCE: f32 = 30.0;

/// Clip planes before load.
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 500.0;

/// Radius is `diagonal * RADIUS_PER_DIAGONAL`, clamped to this range.
pub const RADIUS_PER_DIAGONAL: f32 = 0.02;
pub const MIN_RADIUS: f32 = 0.25;
pub const MAX_RADIUS: f32 = 1.5;

/// Axis-aligned box over loaded geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl WorldBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    pub fn union(&self, other: &WorldBounds) -> WorldBounds {
        WorldBounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn diagonal(&self) -> f32 {
        self.size().length()
    }

    pub fn expanded(&self, margin: f32) -> WorldBounds {
        WorldBounds {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    /// Slab test. Returns the `[t_enter, t_exit]` interval of the ray inside the box,
    /// limited to `[0, max_t]`.
    pub fn ray_interval(&self, origin: Vec3, dir: Vec3, max_t: f32) -> Option<(f32, f32)> {
        let mut t_min = 0.0_f32;
        let mut t_max = max_t;

        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some((t_min, t_max))
    }
}

/// Scale-dependent values used by locomotion, the camera and the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldMetrics {
    /// Avatar collision sphere radius.
    pub radius: f32,
    /// Ground rays start at this height.
    pub ray_top_y: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub near: f32,
    pub far: f32,
    /// `true` once fitted to loaded bounds.
    pub fitted: bool,
}

impl Default for WorldMetrics {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            ray_top_y: DEFAULT_RAY_TOP_Y,
            min_distance: DEFAULT_MIN_DISTANCE,
            max_distance: DEFAULT_MAX_DISTANCE,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            fitted: false,
        }
    }
}

impl WorldMetrics {
    /// Fit every scale-dependent value to the loaded bounds.
    pub fn from_bounds(bounds: &WorldBounds) -> Self {
        let size = bounds.size();
        let diag = bounds.diagonal();
        let radius = (diag * RADIUS_PER_DIAGONAL).clamp(MIN_RADIUS, MAX_RADIUS);

        Self {
            radius,
            ray_top_y: bounds.max.y + (size.y * 0.5).max(5.0),
            min_distance: (radius * 3.0).max(1.5),
            max_distance: (diag * 0.6).max(20.0),
            near: (diag * 1e-4).max(0.01),
            far: (diag * 2.0).max(500.0),
            fitted: true,
        }
    }

    pub fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance)
    }

    /// Starting zoom after load: at least a little past the minimum, at most
    /// 60% of the maximum.
    pub fn fit_distance(&self, distance: f32) -> f32 {
        distance
            .max(self.min_distance + 0.5)
            .min(self.max_distance * 0.6)
            .clamp(self.min_distance, self.max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> WorldBounds {
        WorldBounds::new(Vec3::new(-5.0, 0.0, -4.0), Vec3::new(5.0, 3.0, 4.0))
    }

    #[test]
    fn test_from_points_and_center() {
        let b = WorldBounds::from_points([
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-1.0, 0.0, 5.0),
            Vec3::new(0.0, 4.0, -3.0),
        ])
        .unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, 0.0, -3.0));
        assert_eq!(b.max, Vec3::new(1.0, 4.0, 5.0));
        assert_eq!(b.center(), Vec3::new(0.0, 2.0, 1.0));
        assert!(WorldBounds::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_ray_interval() {
        let b = room();
        let (t0, t1) = b
            .ray_interval(Vec3::new(-10.0, 1.0, 0.0), Vec3::X, 100.0)
            .unwrap();
        assert!((t0 - 5.0).abs() < 1e-5);
        assert!((t1 - 15.0).abs() < 1e-5);

        // Parallel and outside.
        assert!(b.ray_interval(Vec3::new(-10.0, 5.0, 0.0), Vec3::X, 100.0).is_none());
        // Too short to reach.
        assert!(b.ray_interval(Vec3::new(-10.0, 1.0, 0.0), Vec3::X, 2.0).is_none());
        // Origin inside starts at zero.
        let (t0, _) = b.ray_interval(Vec3::new(0.0, 1.0, 0.0), Vec3::Y, 100.0).unwrap();
        assert_eq!(t0, 0.0);
    }

    #[test]
    fn test_metrics_small_room() {
        // diag ~ 13.2 -> 0.26 radius
        let m = WorldMetrics::from_bounds(&room());
        let diag = room().diagonal();
        assert!((m.radius - diag * 0.02).abs() < 1e-5);
        assert_eq!(m.ray_top_y, 3.0 + 5.0);
        assert_eq!(m.min_distance, 1.5);
        assert_eq!(m.max_distance, 20.0);
        assert_eq!(m.far, 500.0);
        assert!(m.fitted);
    }

    #[test]
    fn test_metrics_huge_world() {
        let b = WorldBounds::new(Vec3::splat(-500.0), Vec3::splat(500.0));
        let m = WorldMetrics::from_bounds(&b);
        assert_eq!(m.radius, MAX_RADIUS);
        assert_eq!(m.min_distance, 4.5);
        assert!((m.max_distance - b.diagonal() * 0.6).abs() < 1e-3);
        assert!((m.ray_top_y - 1000.0).abs() < 1e-3);
        assert!(m.near > 0.1);
    }

    #[test]
    fn test_fit_distance() {
        let m = WorldMetrics::from_bounds(&room());
        // 7 is within [2.0, 12.0]
        assert_eq!(m.fit_distance(7.0), 7.0);
        assert_eq!(m.fit_distance(0.5), 2.0);
        assert!((m.fit_distance(25.0) - 12.0).abs() < 1e-4);
    }
}
