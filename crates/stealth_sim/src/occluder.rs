//! Occluder world
//!
//! Axis-aligned boxes and spheres tagged with a [`HitTag`], plus an optional
//! sphere collider for the target. Implements [`RaycastService`].

use glam::Vec3;
use stealth_ai::services::{HitTag, RaycastHit, RaycastService};

/// Occluder geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Axis-aligned box
    Box { min: Vec3, max: Vec3 },
    /// Sphere
    Sphere { center: Vec3, radius: f32 },
}

impl Shape {
    /// Entry distance of a ray with a normalized direction
    ///
    /// Rays starting inside the shape do not hit it.
    pub fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        match *self {
            Shape::Box { min, max } => ray_box(origin, direction, min, max),
            Shape::Sphere { center, radius } => ray_sphere(origin, direction, center, radius),
        }
    }

    /// Check if the XZ footprint covers `point`
    pub fn covers_xz(&self, point: Vec3) -> bool {
        match *self {
            Shape::Box { min, max } => {
                point.x >= min.x && point.x <= max.x && point.z >= min.z && point.z <= max.z
            }
            Shape::Sphere { center, radius } => {
                let dx = point.x - center.x;
                let dz = point.z - center.z;
                dx * dx + dz * dz <= radius * radius
            }
        }
    }
}

fn ray_box(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;

    for axis in 0..3 {
        let (o, d) = (origin[axis], direction[axis]);
        let (lo, hi) = (min[axis], max[axis]);

        // parallel to this slab: inside it or a miss
        if d.abs() < f32::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let inv = d.recip();
        let t1 = (lo - o) * inv;
        let t2 = (hi - o) * inv;
        tmin = tmin.max(t1.min(t2));
        tmax = tmax.min(t1.max(t2));
    }

    if tmax < 0.0 || tmin > tmax || tmin < 0.0 {
        None
    } else {
        Some(tmin)
    }
}

fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let c = oc.dot(oc) - radius * radius;
    if c < 0.0 {
        return None;
    }

    let b = oc.dot(direction);
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let t = -b - discriminant.sqrt();
    (t >= 0.0).then_some(t)
}

/// A tagged piece of static geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occluder {
    /// Geometry
    pub shape: Shape,
    /// Classification reported on hits
    pub tag: HitTag,
    /// Whether the occluder carves cells out of the navigation grid
    pub blocks_movement: bool,
}

impl Occluder {
    /// Create a box occluder
    pub fn cuboid(min: Vec3, max: Vec3, tag: HitTag) -> Self {
        Self {
            shape: Shape::Box {
                min: min.min(max),
                max: min.max(max),
            },
            tag,
            blocks_movement: false,
        }
    }

    /// Create a sphere occluder
    pub fn sphere(center: Vec3, radius: f32, tag: HitTag) -> Self {
        Self {
            shape: Shape::Sphere {
                center,
                radius: radius.abs(),
            },
            tag,
            blocks_movement: false,
        }
    }

    /// Mark as an obstacle for navigation (builder style)
    pub fn blocking(mut self) -> Self {
        self.blocks_movement = true;
        self
    }
}

/// Static occluders plus the target's collider
#[derive(Debug, Clone, Default)]
pub struct OccluderWorld {
    occluders: Vec<Occluder>,
    target: Option<(Vec3, f32)>,
}

impl OccluderWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an occluder (builder style)
    pub fn with_occluder(mut self, occluder: Occluder) -> Self {
        self.occluders.push(occluder);
        self
    }

    /// Add an occluder
    pub fn add(&mut self, occluder: Occluder) {
        self.occluders.push(occluder);
    }

    /// All occluders
    pub fn occluders(&self) -> &[Occluder] {
        &self.occluders
    }

    /// Place the target collider
    pub fn set_target_collider(&mut self, center: Vec3, radius: f32) {
        self.target = Some((center, radius));
    }

    /// Remove the target collider
    pub fn clear_target_collider(&mut self) {
        self.target = None;
    }
}

impl RaycastService for OccluderWorld {
    fn raycast_all(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Vec<RaycastHit> {
        let Some(direction) = direction.try_normalize() else {
            return Vec::new();
        };

        let statics = self.occluders.iter().filter_map(|occluder| {
            occluder
                .shape
                .intersect(origin, direction)
                .map(|t| (occluder.tag, t))
        });
        let target = self.target.and_then(|(center, radius)| {
            ray_sphere(origin, direction, center, radius).map(|t| (HitTag::Target, t))
        });

        let mut hits: Vec<RaycastHit> = statics
            .chain(target)
            .filter(|&(_, t)| t <= max_distance)
            .map(|(tag, t)| RaycastHit::new(tag, origin + direction * t, t))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall() -> Occluder {
        Occluder::cuboid(Vec3::new(-2.0, 0.0, 4.0), Vec3::new(2.0, 3.0, 5.0), HitTag::Solid)
    }

    #[test]
    fn test_box_hit_distance() {
        let t = wall().shape.intersect(Vec3::new(0.0, 1.0, 0.0), Vec3::Z).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_inside_box_misses() {
        assert!(wall().shape.intersect(Vec3::new(0.0, 1.0, 4.5), Vec3::Z).is_none());
    }

    #[test]
    fn test_axis_parallel_ray_on_slab_plane() {
        let shape = wall().shape;
        let grazing = shape.intersect(Vec3::new(-2.0, 1.0, 0.0), Vec3::Z).unwrap();
        assert!((grazing - 4.0).abs() < 1e-5);
        assert!(shape.intersect(Vec3::new(-2.0, 0.0, 0.0), Vec3::Z).is_some());
        assert!(shape.intersect(Vec3::new(-2.5, 1.0, 0.0), Vec3::Z).is_none());
        assert!(shape.intersect(Vec3::new(0.0, 3.5, 0.0), Vec3::Z).is_none());
    }

    #[test]
    fn test_sphere_hit() {
        let glass = Occluder::sphere(Vec3::new(0.0, 0.0, 10.0), 1.0, HitTag::SightTransparent);
        let t = glass.shape.intersect(Vec3::ZERO, Vec3::Z).unwrap();
        assert!((t - 9.0).abs() < 1e-5);
        assert!(glass.shape.intersect(Vec3::ZERO, Vec3::X).is_none());
    }

    #[test]
    fn test_hits_sorted_and_clipped() {
        let mut world = OccluderWorld::new()
            .with_occluder(Occluder::sphere(Vec3::new(0.0, 1.0, 8.0), 0.5, HitTag::SightTransparent))
            .with_occluder(wall());
        world.set_target_collider(Vec3::new(0.0, 1.0, 12.0), 0.5);

        let hits = world.raycast_all(Vec3::new(0.0, 1.0, 0.0), Vec3::Z * 3.0, 20.0);
        let tags: Vec<_> = hits.iter().map(|h| h.tag).collect();
        assert_eq!(tags, vec![HitTag::Solid, HitTag::SightTransparent, HitTag::Target]);

        let short = world.raycast_all(Vec3::new(0.0, 1.0, 0.0), Vec3::Z, 6.0);
        assert_eq!(short.len(), 1);
    }

    #[test]
    fn test_footprint() {
        assert!(wall().shape.covers_xz(Vec3::new(1.0, 10.0, 4.5)));
        assert!(!wall().shape.covers_xz(Vec3::new(3.0, 0.0, 4.5)));
    }
}
