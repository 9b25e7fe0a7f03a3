use super::{
    Arithmetic, Displacement, Error, Fate, Index, IndexSpec, Optic, Ray, Result, Vector,
};
use nalgebra::Matrix2;
use std::{f64::consts::PI, sync::Arc};

/// # Refracting surface
///
/// Interface into a medium of index `index`, either planar or a sphere of
/// signed radius of curvature $R$ with vertex at `center`.
/// The center of curvature is at `center` $+[0,0,R]$: $R>0$ bulges toward
/// the incoming rays (convex), $R<0$ away from them (concave).
#[derive(Debug, Clone)]
pub struct Surface {
    /// Medium behind the surface
    pub index: Index,
    /// Vertex position
    pub center: Vector,
    /// Signed radius of curvature, `None` for a plane
    pub radius: Option<f64>,
    /// Clear aperture radius
    pub clip: Option<f64>,
}
impl Surface {
    /// Creates a new planar `Surface`
    pub fn new<S, D>(index: S, center: D) -> Result<Self>
    where
        S: Into<IndexSpec>,
        D: Into<Displacement>,
    {
        Ok(Self {
            index: index.into().resolve()?,
            center: center.into().into(),
            radius: None,
            clip: None,
        })
    }
    /// Sets the radius of curvature, 0 meaning a plane
    pub fn radius_of_curvature(self, radius: f64) -> Self {
        Self {
            radius: if radius == 0f64 { None } else { Some(radius) },
            ..self
        }
    }
    /// Sets the clear aperture radius
    pub fn clear_radius(self, clip: f64) -> Self {
        Self {
            clip: Some(clip),
            ..self
        }
    }
    /// Center of the sphere the surface lies on
    pub fn center_of_curvature(&self) -> Option<Vector> {
        self.radius.map(|r| self.center.add([0f64, 0f64, r]))
    }
    pub fn offset<D: Into<Displacement>>(&self, delta: D) -> Self {
        Self {
            center: self.center.add(delta.into().into()),
            ..self.clone()
        }
    }
    /// Mirror image about the plane at $z=$ `plane`, the curvature changes sign
    pub fn flip(&self, plane: f64) -> Self {
        let mut center = self.center;
        center[2] = 2f64 * plane - center[2];
        Self {
            center,
            radius: self.radius.map(|r| -r),
            ..self.clone()
        }
    }
    /// Moves the ray onto the surface and returns the surface normal there,
    /// oriented against the incoming rays
    fn intersect(&self, ray: &mut Ray) -> Option<Vector> {
        match self.radius {
            None => {
                ray.trace((self.center[2] - ray.p[2]) / ray.u[2]);
                ray.p[2] = self.center[2];
                Some([0f64, 0f64, -1f64])
            }
            Some(r) => {
                let c = self.center.add([0f64, 0f64, r]);
                let delta = c.sub(ray.p);
                let dp = delta.dot(&ray.u);
                let disc = dp * dp - (delta.norm_square() - r * r);
                if disc < 0f64 {
                    return None;
                }
                // near root on convex surfaces, far root on concave ones
                ray.trace(dp - r.signum() * disc.sqrt());
                Some(ray.p.sub(c).normalize().scale(r.signum()))
            }
        }
    }
}

/// Kills `ray` if it lies outside the clear aperture of a surface centered on `center`
pub(crate) fn clip_ray(ray: &mut Ray, center: Vector, clip: Option<f64>) {
    if let Some(r_clip) = clip {
        let r = (ray.p[0] - center[0]).hypot(ray.p[1] - center[1]);
        if r > r_clip {
            ray.kill(Fate::Clipped);
        }
    }
}

/// Clip radius used to draw a surface
pub(crate) fn edge_radius(clip: Option<f64>, r_clip: f64, force_clip: bool) -> f64 {
    match clip {
        Some(c) if force_clip => c.min(r_clip),
        Some(c) => c,
        None => r_clip,
    }
}

/// Straight profile of a flat surface
pub(crate) fn flat_edge(center: Vector, rc: f64, curve_points: usize) -> Vec<[f64; 2]> {
    let n = curve_points.max(2);
    (0..n)
        .map(|i| {
            let x = -rc + 2f64 * rc * i as f64 / (n - 1) as f64;
            [center[2], center[0] + x]
        })
        .collect()
}

fn check_clip(clip: Option<f64>) -> Result<()> {
    match clip {
        Some(c) if !(c.is_finite() && c > 0f64) => Err(Error::InvalidStackMember(format!(
            "clear aperture radius must be finite and positive, got {}",
            c
        ))),
        _ => Ok(()),
    }
}
pub(crate) fn check_center(center: Vector, clip: Option<f64>) -> Result<()> {
    if !center.iter().all(|x| x.is_finite()) {
        return Err(Error::InvalidStackMember(format!(
            "surface center must be finite, got {:?}",
            center
        )));
    }
    check_clip(clip)
}

impl Optic for Surface {
    fn center(&self) -> Vector {
        self.center
    }
    fn clip_radius(&self) -> Option<f64> {
        self.clip
    }
    fn index(&self) -> Option<&Index> {
        Some(&self.index)
    }
    fn refract(&self, ray: &mut Ray, n_in: f64, n_out: f64, path: &mut Vec<Vector>) {
        if ray.is_alive() && !ray.is_forward() {
            ray.kill(Fate::Stalled);
        }
        if !ray.is_alive() {
            path.push(ray.p);
            return;
        }
        let ns = match self.intersect(ray) {
            Some(ns) => ns,
            None => {
                ray.kill(Fate::Missed);
                path.push(ray.p);
                return;
            }
        };
        path.push(ray.p);
        clip_ray(ray, self.center, self.clip);
        if !ray.is_alive() {
            return;
        }
        // Snell's law in vector form
        let m = n_in / n_out;
        let cp = ray.u.cross(ns);
        let disc = 1f64 - m * m * cp.norm_square();
        if disc < 0f64 {
            ray.kill(Fate::TotalInternalReflection);
            return;
        }
        let mut u = ns.cross(cp).scale(m).sub(ns.scale(disc.sqrt()));
        ray.u = u.normalize();
    }
    fn matrix(&self, n_in: f64, wavelength: f64) -> (Matrix2<f64>, f64) {
        let n_out = self.index.eval(wavelength);
        let power = match self.radius {
            None => 0f64,
            Some(r) => (n_in - n_out) / (r * n_out),
        };
        (Matrix2::new(1f64, 0f64, power, n_in / n_out), n_out)
    }
    fn shifted(&self, delta: Vector) -> Arc<dyn Optic> {
        Arc::new(self.offset(delta))
    }
    fn mirrored(&self, plane: f64, index: Option<Index>) -> Arc<dyn Optic> {
        let mut surface = self.flip(plane);
        if let Some(index) = index {
            surface.index = index;
        }
        Arc::new(surface)
    }
    fn edge(&self, r_clip: f64, force_clip: bool, curve_points: usize) -> Vec<[f64; 2]> {
        let rc = edge_radius(self.clip, r_clip, force_clip);
        let r = match self.radius {
            Some(r) => r,
            None => return flat_edge(self.center, rc, curve_points),
        };
        let z = self.center[2] + r;
        let x = self.center[0];
        let phi_max = if r.abs() < rc {
            PI / 2f64
        } else {
            (rc / r).asin()
        };
        let n = curve_points.max(2);
        let phase = if r > 0f64 { PI } else { 0f64 };
        (0..n)
            .map(|i| {
                let phi = -phi_max + 2f64 * phi_max * i as f64 / (n - 1) as f64 + phase;
                [z + r.abs() * phi.cos(), x + r.abs() * phi.sin()]
            })
            .collect()
    }
    fn check(&self) -> Result<()> {
        check_center(self.center, self.clip)?;
        match self.radius {
            Some(r) if !r.is_finite() => Err(Error::InvalidStackMember(format!(
                "radius of curvature must be finite, got {}",
                r
            ))),
            _ => Ok(()),
        }
    }
}
