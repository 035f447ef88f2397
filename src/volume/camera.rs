use crate::foundation::error::{VoxflowError, VoxflowResult};

/// Point or direction in world space.
pub type Vec3 = [f64; 3];

pub(crate) fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn add_scaled(a: Vec3, b: Vec3, s: f64) -> Vec3 {
    [a[0] + b[0] * s, a[1] + b[1] * s, a[2] + b[2] * s]
}

pub(crate) fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn normalize(v: Vec3) -> Option<Vec3> {
    let len = dot(v, v).sqrt();
    if !(len.is_finite() && len > 0.0) {
        return None;
    }
    Some([v[0] / len, v[1] / len, v[2] / len])
}

/// A ray with unit direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: Vec3,
    /// Unit direction.
    pub dir: Vec3,
}

impl Ray {
    /// Point at parameter `t`.
    pub fn at(&self, t: f64) -> Vec3 {
        add_scaled(self.origin, self.dir, t)
    }

    /// Parameter interval `[t0, t1]` (with `t0 >= 0`) inside axis-aligned `bounds`
    /// `[x0, x1, y0, y1, z0, z1]`.
    pub fn clip(&self, bounds: [f64; 6]) -> Option<(f64, f64)> {
        let mut t0 = 0.0f64;
        let mut t1 = f64::INFINITY;
        for a in 0..3 {
            let (lo, hi) = (bounds[2 * a], bounds[2 * a + 1]);
            let (o, d) = (self.origin[a], self.dir[a]);
            if d == 0.0 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let (mut near, mut far) = ((lo - o) / d, (hi - o) / d);
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }
            t0 = t0.max(near);
            t1 = t1.min(far);
            if t0 > t1 {
                return None;
            }
        }
        t1.is_finite().then_some((t0, t1))
    }
}

/// Pinhole or parallel camera.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Camera {
    /// Eye position.
    pub position: Vec3,
    /// Point looked at.
    pub focal_point: Vec3,
    /// Approximate up direction.
    pub view_up: Vec3,
    /// Vertical field of view in degrees (perspective only).
    pub view_angle: f64,
    /// Use an orthographic projection.
    pub parallel_projection: bool,
    /// Half of the view height in world units (parallel only).
    pub parallel_scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 1.0],
            focal_point: [0.0; 3],
            view_up: [0.0, 1.0, 0.0],
            view_angle: 30.0,
            parallel_projection: false,
            parallel_scale: 1.0,
        }
    }
}

/// Orthonormal view basis: `forward`, `right`, `up`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBasis {
    /// From the eye towards the focal point.
    pub forward: Vec3,
    /// Image +x.
    pub right: Vec3,
    /// Image +y.
    pub up: Vec3,
}

impl Camera {
    /// Camera on the +z side of `bounds`, looking at their centre, framing them entirely.
    pub fn framing(bounds: [f64; 6]) -> Self {
        let center = [0, 1, 2].map(|a| (bounds[2 * a] + bounds[2 * a + 1]) / 2.0);
        let radius = 0.5
            * (0..3)
                .map(|a| (bounds[2 * a + 1] - bounds[2 * a]).powi(2))
                .sum::<f64>()
                .sqrt();
        let radius = if radius > 0.0 { radius } else { 1.0 };
        let view_angle: f64 = 30.0;
        let distance = radius / (view_angle.to_radians() / 2.0).sin();
        Self {
            position: [center[0], center[1], center[2] + distance],
            focal_point: center,
            view_up: [0.0, 1.0, 0.0],
            view_angle,
            parallel_projection: false,
            parallel_scale: radius,
        }
    }

    /// Builder: orthographic projection with the given half height.
    pub fn parallel(mut self, scale: f64) -> Self {
        self.parallel_projection = true;
        self.parallel_scale = scale;
        self
    }

    /// Orthonormal basis, or `NumericDomain` for a degenerate camera.
    pub fn basis(&self) -> VoxflowResult<ViewBasis> {
        let degenerate = || {
            VoxflowError::numeric_domain(format!(
                "degenerate camera (position {:?}, focal point {:?}, up {:?})",
                self.position, self.focal_point, self.view_up
            ))
        };
        let forward = normalize(sub(self.focal_point, self.position)).ok_or_else(degenerate)?;
        let right = normalize(cross(forward, self.view_up)).ok_or_else(degenerate)?;
        let up = cross(right, forward);
        Ok(ViewBasis { forward, right, up })
    }

    /// Ray through pixel `(px, py)` of a `width x height` image. Pixel centres sit at
    /// half-integer coordinates; row 0 is the top.
    pub fn ray(&self, basis: &ViewBasis, px: usize, py: usize, width: usize, height: usize) -> Option<Ray> {
        let (w, h) = (width.max(1) as f64, height.max(1) as f64);
        let sx = 2.0 * (px as f64 + 0.5) / w - 1.0;
        let sy = 1.0 - 2.0 * (py as f64 + 0.5) / h;
        let aspect = w / h;
        if self.parallel_projection {
            let half = self.parallel_scale;
            let origin = add_scaled(
                add_scaled(self.position, basis.right, sx * half * aspect),
                basis.up,
                sy * half,
            );
            return Some(Ray {
                origin,
                dir: basis.forward,
            });
        }
        let tan = (self.view_angle.to_radians() / 2.0).tan();
        let d = add_scaled(
            add_scaled(basis.forward, basis.right, sx * tan * aspect),
            basis.up,
            sy * tan,
        );
        Some(Ray {
            origin: self.position,
            dir: normalize(d)?,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/volume/camera.rs"]
mod tests;
