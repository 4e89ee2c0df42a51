//! Analytic ray/primitive intersection, in the geom's local frame.
//!
//! Supported shapes match the batched tracer's capability set: plane,
//! sphere, box, capsule, cylinder, ellipsoid. Triangle meshes are not
//! supported and are filtered out before tracing.
//!
//! All routines take a ray already transformed into the geom's local frame
//! (rigid transforms preserve distances, so the returned parameter is the
//! world-space distance when the direction is unit length).

#![allow(clippy::many_single_char_names)]

use nalgebra::{Matrix3, Vector3};

// ---------------------------------------------------------------------------
// GeomShape
// ---------------------------------------------------------------------------

/// Canonical collision shape in its local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeomShape {
    /// Infinite plane through the origin with local normal +z.
    Plane,
    Sphere {
        radius: f64,
    },
    /// Axis along local z, length `2 * half_length` plus hemispherical caps.
    Capsule {
        half_length: f64,
        radius: f64,
    },
    /// Axis along local z with flat caps.
    Cylinder {
        half_length: f64,
        radius: f64,
    },
    Ellipsoid {
        radii: Vector3<f64>,
    },
    Box {
        half_extents: Vector3<f64>,
    },
}

impl GeomShape {
    /// Map a parsed geom (kind + MJCF size parameters) to a canonical
    /// shape. Returns `None` for meshes, which the tracer cannot handle.
    pub fn from_geom(kind: ambler_mjcf::GeomKind, size: &Vector3<f64>) -> Option<Self> {
        use ambler_mjcf::GeomKind;
        match kind {
            GeomKind::Plane => Some(Self::Plane),
            GeomKind::Sphere => Some(Self::Sphere { radius: size.x }),
            GeomKind::Capsule => Some(Self::Capsule {
                radius: size.x,
                half_length: size.y,
            }),
            GeomKind::Cylinder => Some(Self::Cylinder {
                radius: size.x,
                half_length: size.y,
            }),
            GeomKind::Ellipsoid => Some(Self::Ellipsoid { radii: *size }),
            GeomKind::Box => Some(Self::Box { half_extents: *size }),
            GeomKind::Mesh => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Cast a world-space ray against a shape at the given world pose.
///
/// Returns the distance to the closest hit within `max_distance`, or
/// `None` on a miss. `dir` must be unit length.
pub fn raycast(
    shape: &GeomShape,
    pos: &Vector3<f64>,
    mat: &Matrix3<f64>,
    origin: &Vector3<f64>,
    dir: &Vector3<f64>,
    max_distance: f64,
) -> Option<f64> {
    // Into the local frame: rotation matrices invert by transpose.
    let local_origin = mat.transpose() * (origin - pos);
    let local_dir = mat.transpose() * dir;
    let t = raycast_local(shape, &local_origin, &local_dir)?;
    (t > 0.0 && t <= max_distance).then_some(t)
}

fn raycast_local(shape: &GeomShape, o: &Vector3<f64>, d: &Vector3<f64>) -> Option<f64> {
    match shape {
        GeomShape::Plane => ray_plane(o, d),
        GeomShape::Sphere { radius } => ray_sphere(o, d, *radius),
        GeomShape::Capsule {
            half_length,
            radius,
        } => ray_capsule(o, d, *half_length, *radius),
        GeomShape::Cylinder {
            half_length,
            radius,
        } => ray_cylinder(o, d, *half_length, *radius),
        GeomShape::Ellipsoid { radii } => ray_ellipsoid(o, d, radii),
        GeomShape::Box { half_extents } => ray_box(o, d, half_extents),
    }
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

const EPS: f64 = 1e-12;

fn ray_plane(o: &Vector3<f64>, d: &Vector3<f64>) -> Option<f64> {
    if d.z.abs() < EPS {
        return None;
    }
    let t = -o.z / d.z;
    (t > 0.0).then_some(t)
}

/// Smallest positive root of `a t^2 + 2 b t + c = 0`.
fn smallest_positive_root(a: f64, b: f64, c: f64) -> Option<f64> {
    if a.abs() < EPS {
        return None;
    }
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let t0 = (-b - sqrt_disc) / a;
    let t1 = (-b + sqrt_disc) / a;
    if t0 > 0.0 {
        Some(t0)
    } else if t1 > 0.0 {
        Some(t1)
    } else {
        None
    }
}

fn ray_sphere(o: &Vector3<f64>, d: &Vector3<f64>, radius: f64) -> Option<f64> {
    let a = d.dot(d);
    let b = o.dot(d);
    let c = o.dot(o) - radius * radius;
    smallest_positive_root(a, b, c)
}

fn ray_ellipsoid(o: &Vector3<f64>, d: &Vector3<f64>, radii: &Vector3<f64>) -> Option<f64> {
    // Scale to the unit sphere without renormalizing the direction, so the
    // root stays a distance along the original ray.
    let os = Vector3::new(o.x / radii.x, o.y / radii.y, o.z / radii.z);
    let ds = Vector3::new(d.x / radii.x, d.y / radii.y, d.z / radii.z);
    let a = ds.dot(&ds);
    let b = os.dot(&ds);
    let c = os.dot(&os) - 1.0;
    smallest_positive_root(a, b, c)
}

fn ray_box(o: &Vector3<f64>, d: &Vector3<f64>, half: &Vector3<f64>) -> Option<f64> {
    // Slab test.
    let mut t_min = f64::NEG_INFINITY;
    let mut t_max = f64::INFINITY;

    for axis in 0..3 {
        if d[axis].abs() < EPS {
            if o[axis].abs() > half[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d[axis];
        let mut t0 = (-half[axis] - o[axis]) * inv;
        let mut t1 = (half[axis] - o[axis]) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }

    if t_min > 0.0 {
        Some(t_min)
    } else if t_max > 0.0 {
        Some(t_max)
    } else {
        None
    }
}

fn ray_cylinder(o: &Vector3<f64>, d: &Vector3<f64>, half_length: f64, radius: f64) -> Option<f64> {
    let mut best: Option<f64> = None;

    // Lateral surface.
    let a = d.x * d.x + d.y * d.y;
    let b = o.x * d.x + o.y * d.y;
    let c = o.x * o.x + o.y * o.y - radius * radius;
    if let Some(t) = smallest_positive_root(a, b, c) {
        if (o.z + t * d.z).abs() <= half_length {
            best = Some(t);
        }
    }

    // End caps.
    if d.z.abs() > EPS {
        for cap_z in [-half_length, half_length] {
            let t = (cap_z - o.z) / d.z;
            if t > 0.0 {
                let x = o.x + t * d.x;
                let y = o.y + t * d.y;
                if x * x + y * y <= radius * radius && best.is_none_or(|b| t < b) {
                    best = Some(t);
                }
            }
        }
    }

    best
}

fn ray_capsule(o: &Vector3<f64>, d: &Vector3<f64>, half_length: f64, radius: f64) -> Option<f64> {
    let mut best: Option<f64> = None;

    // Lateral surface, clipped to the cylindrical section.
    let a = d.x * d.x + d.y * d.y;
    let b = o.x * d.x + o.y * d.y;
    let c = o.x * o.x + o.y * o.y - radius * radius;
    if let Some(t) = smallest_positive_root(a, b, c) {
        if (o.z + t * d.z).abs() <= half_length {
            best = Some(t);
        }
    }

    // Hemispherical caps.
    for cap_z in [-half_length, half_length] {
        let oc = Vector3::new(o.x, o.y, o.z - cap_z);
        if let Some(t) = ray_sphere(&oc, d, radius) {
            // Only the hemisphere beyond the cylindrical section counts.
            let z = o.z + t * d.z;
            let on_cap = if cap_z < 0.0 {
                z <= -half_length
            } else {
                z >= half_length
            };
            if on_cap && best.is_none_or(|b| t < b) {
                best = Some(t);
            }
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn identity() -> Matrix3<f64> {
        Matrix3::identity()
    }

    #[test]
    fn plane_hit_from_above() {
        let t = raycast(
            &GeomShape::Plane,
            &Vector3::zeros(),
            &identity(),
            &Vector3::new(0.3, -0.2, 2.0),
            &Vector3::new(0.0, 0.0, -1.0),
            100.0,
        );
        assert!((t.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn plane_parallel_ray_misses() {
        let t = raycast(
            &GeomShape::Plane,
            &Vector3::zeros(),
            &identity(),
            &Vector3::new(0.0, 0.0, 1.0),
            &Vector3::new(1.0, 0.0, 0.0),
            100.0,
        );
        assert!(t.is_none());
    }

    #[test]
    fn sphere_head_on() {
        let t = raycast(
            &GeomShape::Sphere { radius: 0.5 },
            &Vector3::new(3.0, 0.0, 0.0),
            &identity(),
            &Vector3::zeros(),
            &Vector3::new(1.0, 0.0, 0.0),
            100.0,
        );
        assert!((t.unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn sphere_behind_origin_misses() {
        let t = raycast(
            &GeomShape::Sphere { radius: 0.5 },
            &Vector3::new(-3.0, 0.0, 0.0),
            &identity(),
            &Vector3::zeros(),
            &Vector3::new(1.0, 0.0, 0.0),
            100.0,
        );
        assert!(t.is_none());
    }

    #[test]
    fn max_distance_cuts_off_hits() {
        let t = raycast(
            &GeomShape::Sphere { radius: 0.5 },
            &Vector3::new(3.0, 0.0, 0.0),
            &identity(),
            &Vector3::zeros(),
            &Vector3::new(1.0, 0.0, 0.0),
            2.0,
        );
        assert!(t.is_none());
    }

    #[test]
    fn box_face_hit() {
        let t = raycast(
            &GeomShape::Box {
                half_extents: Vector3::new(0.5, 0.5, 0.5),
            },
            &Vector3::new(4.0, 0.0, 0.0),
            &identity(),
            &Vector3::zeros(),
            &Vector3::new(1.0, 0.0, 0.0),
            100.0,
        );
        assert!((t.unwrap() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn box_respects_rotation() {
        // Box yawed 45 degrees: the ray meets a corner-on face closer than
        // the unrotated half extent would suggest.
        let yaw = nalgebra::Rotation3::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2 / 2.0);
        let t = raycast(
            &GeomShape::Box {
                half_extents: Vector3::new(0.5, 0.5, 0.5),
            },
            &Vector3::new(4.0, 0.0, 0.0),
            yaw.matrix(),
            &Vector3::zeros(),
            &Vector3::new(1.0, 0.0, 0.0),
            100.0,
        );
        let expected = 4.0 - 0.5 * 2.0_f64.sqrt();
        assert!((t.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn ray_from_inside_box_exits() {
        let t = raycast(
            &GeomShape::Box {
                half_extents: Vector3::new(1.0, 1.0, 1.0),
            },
            &Vector3::zeros(),
            &identity(),
            &Vector3::zeros(),
            &Vector3::new(0.0, 1.0, 0.0),
            100.0,
        );
        assert!((t.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cylinder_side_and_cap() {
        let shape = GeomShape::Cylinder {
            half_length: 1.0,
            radius: 0.5,
        };
        // Side hit.
        let t = raycast(
            &shape,
            &Vector3::zeros(),
            &identity(),
            &Vector3::new(3.0, 0.0, 0.0),
            &Vector3::new(-1.0, 0.0, 0.0),
            100.0,
        );
        assert!((t.unwrap() - 2.5).abs() < 1e-12);
        // Cap hit from above.
        let t = raycast(
            &shape,
            &Vector3::zeros(),
            &identity(),
            &Vector3::new(0.2, 0.0, 4.0),
            &Vector3::new(0.0, 0.0, -1.0),
            100.0,
        );
        assert!((t.unwrap() - 3.0).abs() < 1e-12);
        // Past the side, no cap in the way.
        let t = raycast(
            &shape,
            &Vector3::zeros(),
            &identity(),
            &Vector3::new(3.0, 0.0, 2.0),
            &Vector3::new(-1.0, 0.0, 0.0),
            100.0,
        );
        assert!(t.is_none());
    }

    #[test]
    fn capsule_cap_is_rounded() {
        let shape = GeomShape::Capsule {
            half_length: 1.0,
            radius: 0.5,
        };
        // Straight down onto the top cap apex: z = 1.0 + 0.5.
        let t = raycast(
            &shape,
            &Vector3::zeros(),
            &identity(),
            &Vector3::new(0.0, 0.0, 4.0),
            &Vector3::new(0.0, 0.0, -1.0),
            100.0,
        );
        assert!((t.unwrap() - 2.5).abs() < 1e-12);
        // Side of the cylindrical section.
        let t = raycast(
            &shape,
            &Vector3::zeros(),
            &identity(),
            &Vector3::new(3.0, 0.0, 0.5),
            &Vector3::new(-1.0, 0.0, 0.0),
            100.0,
        );
        assert!((t.unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn ellipsoid_scales_per_axis() {
        let shape = GeomShape::Ellipsoid {
            radii: Vector3::new(2.0, 1.0, 0.5),
        };
        let t = raycast(
            &shape,
            &Vector3::zeros(),
            &identity(),
            &Vector3::new(5.0, 0.0, 0.0),
            &Vector3::new(-1.0, 0.0, 0.0),
            100.0,
        );
        assert!((t.unwrap() - 3.0).abs() < 1e-12);
        let t = raycast(
            &shape,
            &Vector3::zeros(),
            &identity(),
            &Vector3::new(0.0, 0.0, 5.0),
            &Vector3::new(0.0, 0.0, -1.0),
            100.0,
        );
        assert!((t.unwrap() - 4.5).abs() < 1e-12);
    }

    #[test]
    fn shape_from_geom_maps_sizes() {
        use ambler_mjcf::GeomKind;
        let size = Vector3::new(0.1, 0.3, 0.0);
        assert_eq!(
            GeomShape::from_geom(GeomKind::Capsule, &size),
            Some(GeomShape::Capsule {
                radius: 0.1,
                half_length: 0.3
            })
        );
        assert_eq!(
            GeomShape::from_geom(GeomKind::Sphere, &size),
            Some(GeomShape::Sphere { radius: 0.1 })
        );
        assert_eq!(GeomShape::from_geom(GeomKind::Mesh, &size), None);
    }
}
