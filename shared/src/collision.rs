//! Static collision geometry and the ray queries locomotion and the camera run against it.
//!
//! The mesh set starts empty and only ever grows: the scene loader appends
//! meshes as room assets finish, and every query walks whatever is present at
//! that moment. An empty set is a valid state, not an error: rays miss, ground
//! is the flat baseline and walls never block.

use bevy::prelude::*;

use crate::world::WorldBounds;

/// Ground height reported when there is nothing to stand on.
pub const GROUND_BASELINE: f32 = 0.0;

/// Hits closer than this are treated as the ray origin touching the surface.
const RAY_EPSILON: f32 = 1e-6;

/// Padding on mesh boxes so flat meshes survive the slab test.
const BROAD_PHASE_MARGIN: f32 = 1e-3;

/// Nearest intersection of a ray with the collision set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the (normalized) ray direction.
    pub distance: f32,
    pub point: Vec3,
    /// Geometric normal of the hit triangle, facing back toward the ray.
    pub normal: Vec3,
}

/// One triangle mesh in world space.
#[derive(Debug, Clone)]
pub struct CollisionMesh {
    triangles: Vec<[Vec3; 3]>,
    bounds: WorldBounds,
    two_sided: bool,
}

impl CollisionMesh {
    /// Build from world-space triangles. Returns `None` when there are no triangles.
    ///
    /// One-sided meshes only collide with rays hitting the counter-clockwise face,
    /// matching how the renderer culls them.
    pub fn new(triangles: Vec<[Vec3; 3]>, two_sided: bool) -> Option<Self> {
        let bounds = WorldBounds::from_points(triangles.iter().flatten().copied())?;
        Some(Self {
            triangles,
            bounds,
            two_sided,
        })
    }

    /// Build from an indexed vertex buffer, transforming every vertex into world space.
    ///
    /// Out-of-range indices and incomplete trailing triangles are skipped.
    pub fn from_indexed(
        positions: &[Vec3],
        indices: &[u32],
        to_world: impl Fn(Vec3) -> Vec3,
        two_sided: bool,
    ) -> Option<Self> {
        let world: Vec<Vec3> = positions.iter().map(|p| to_world(*p)).collect();
        let triangles = indices
            .chunks_exact(3)
            .filter_map(|tri| {
                let a = *world.get(tri[0] as usize)?;
                let b = *world.get(tri[1] as usize)?;
                let c = *world.get(tri[2] as usize)?;
                Some([a, b, c])
            })
            .collect();
        Self::new(triangles, two_sided)
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_two_sided(&self) -> bool {
        self.two_sided
    }

    /// Nearest hit along a unit-length `dir`, no farther than `max_distance`.
    pub fn cast_ray(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayHit> {
        // Broad phase: skip the mesh entirely if the ray never enters its box.
        self.bounds
            .expanded(BROAD_PHASE_MARGIN)
            .ray_interval(origin, dir, max_distance)?;

        let mut best: Option<RayHit> = None;
        let mut best_t = max_distance;

        for [v0, v1, v2] in &self.triangles {
            if let Some((t, normal)) =
                ray_triangle_intersection(origin, dir, best_t, *v0, *v1, *v2, self.two_sided)
            {
                best_t = t;
                best = Some(RayHit {
                    distance: t,
                    point: origin + dir * t,
                    normal,
                });
            }
        }

        best
    }
}

/// Möller–Trumbore ray-triangle intersection.
///
/// Returns the ray parameter and the face normal oriented against the ray.
fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    max_t: f32,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    two_sided: bool,
) -> Option<(f32, Vec3)> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray_dir.cross(edge2);
    let a = edge1.dot(h);

    // a > 0 means the ray hits the counter-clockwise (front) face.
    if a.abs() < RAY_EPSILON || (!two_sided && a < 0.0) {
        return None;
    }

    let f = 1.0 / a;
    let s = ray_origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray_dir.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t > RAY_EPSILON && t <= max_t {
        let mut normal = edge1.cross(edge2).normalize_or_zero();
        if normal.dot(ray_dir) > 0.0 {
            normal = -normal;
        }
        Some((t, normal))
    } else {
        None
    }
}

/// The append-only collision mesh set plus the world bounds fixed at load.
#[derive(Resource, Debug, Default)]
pub struct CollisionWorld {
    meshes: Vec<CollisionMesh>,
    bounds: Option<WorldBounds>,
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_mesh(&mut self, mesh: CollisionMesh) {
        self.meshes.push(mesh);
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(CollisionMesh::triangle_count).sum()
    }

    /// Box around every mesh added so far.
    pub fn geometry_bounds(&self) -> Option<WorldBounds> {
        self.meshes
            .iter()
            .map(|m| *m.bounds())
            .reduce(|acc, b| acc.union(&b))
    }

    pub fn bounds(&self) -> Option<&WorldBounds> {
        self.bounds.as_ref()
    }

    /// Fix the world bounds. Only the first call takes effect.
    pub fn set_bounds(&mut self, bounds: WorldBounds) -> bool {
        if self.bounds.is_some() {
            warn!("World bounds already set; ignoring {:?}", bounds);
            return false;
        }
        self.bounds = Some(bounds);
        true
    }

    /// Nearest hit over every mesh. `dir` need not be normalized; a zero direction never hits.
    pub fn cast_ray(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayHit> {
        let dir = dir.try_normalize()?;
        if max_distance <= 0.0 {
            return None;
        }

        let mut best: Option<RayHit> = None;
        for mesh in &self.meshes {
            let limit = best.map_or(max_distance, |b| b.distance);
            if let Some(hit) = mesh.cast_ray(origin, dir, limit) {
                best = Some(hit);
            }
        }
        best
    }

    /// Height of the first surface straight below `(x, top_y, z)`.
    ///
    /// Falls back to [`GROUND_BASELINE`] when the set is empty or the ray misses.
    pub fn ground_height_at(&self, x: f32, z: f32, top_y: f32) -> f32 {
        self.probe_ground(x, z, top_y).unwrap_or(GROUND_BASELINE)
    }

    /// Like [`Self::ground_height_at`] but reports a miss instead of the baseline.
    pub fn probe_ground(&self, x: f32, z: f32, top_y: f32) -> Option<f32> {
        self.cast_ray(Vec3::new(x, top_y, z), Vec3::NEG_Y, f32::INFINITY)
            .map(|hit| hit.point.y)
    }

    /// How far a sphere of `radius` centred at `origin` may travel along `dir`
    /// toward a requested `step` before stopping `epsilon` short of a wall.
    ///
    /// The result is always within `[0, step]`.
    pub fn clamp_step(&self, origin: Vec3, dir: Vec3, step: f32, radius: f32, epsilon: f32) -> f32 {
        if step <= 0.0 {
            return 0.0;
        }
        match self.cast_ray(origin, dir, step + radius) {
            Some(hit) if hit.distance < step + radius => {
                (hit.distance - radius - epsilon).clamp(0.0, step)
            }
            _ => step,
        }
    }
}
