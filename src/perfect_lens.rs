use super::{
    surface::{check_center, clip_ray, edge_radius, flat_edge},
    Arithmetic, Displacement, Error, Fate, Index, Optic, Ray, Result, Vector,
};
use nalgebra::Matrix2;
use std::sync::Arc;

/// # Ideal thin lens
///
/// Focuses without aberrations: a ray crossing the plane of the optical center
/// at transverse position $\vec r$ has its slopes changed by
/// $-(\vec r-\vec r_o)/f$, where $\vec r_o$ is the optical center.
/// Rays are reported on the physical reference plane at `center`, which may
/// differ from the optical center (principal plane offset).
/// The medium index is carried through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfectLens {
    /// Focal length
    pub f: f64,
    /// Reference plane position
    pub center: Vector,
    /// Plane where the focusing is applied
    pub optical_center: Vector,
    /// Clear aperture radius
    pub clip: Option<f64>,
}
impl PerfectLens {
    /// Creates a new `PerfectLens` with the optical center on the reference plane
    pub fn new<D: Into<Displacement>>(f: f64, center: D) -> Self {
        let center: Vector = center.into().into();
        Self {
            f,
            center,
            optical_center: center,
            clip: None,
        }
    }
    pub fn optical_center<D: Into<Displacement>>(self, optical_center: D) -> Self {
        Self {
            optical_center: optical_center.into().into(),
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
    pub fn offset<D: Into<Displacement>>(&self, delta: D) -> Self {
        let delta: Vector = delta.into().into();
        Self {
            center: self.center.add(delta),
            optical_center: self.optical_center.add(delta),
            ..self.clone()
        }
    }
    /// Mirror image about the plane at $z=$ `plane`
    pub fn flip(&self, plane: f64) -> Self {
        let mut center = self.center;
        center[2] = 2f64 * plane - center[2];
        let mut optical_center = self.optical_center;
        optical_center[2] = 2f64 * plane - optical_center[2];
        Self {
            center,
            optical_center,
            ..self.clone()
        }
    }
}

impl Optic for PerfectLens {
    fn center(&self) -> Vector {
        self.center
    }
    fn clip_radius(&self) -> Option<f64> {
        self.clip
    }
    fn index(&self) -> Option<&Index> {
        None
    }
    fn hits(&self) -> usize {
        2
    }
    fn refract(&self, ray: &mut Ray, _n_in: f64, _n_out: f64, path: &mut Vec<Vector>) {
        if ray.is_alive() && !ray.is_forward() {
            ray.kill(Fate::Stalled);
        }
        if !ray.is_alive() {
            path.push(ray.p);
            path.push(ray.p);
            return;
        }
        // slopes, unit axial component
        let mut s = ray.u.scale(1f64 / ray.u[2]);
        let xi = ray.p.add(s.scale(self.center[2] - ray.p[2]));
        let xo = ray.p.add(s.scale(self.optical_center[2] - ray.p[2]));
        s[0] -= (xo[0] - self.optical_center[0]) / self.f;
        s[1] -= (xo[1] - self.optical_center[1]) / self.f;
        let xf = xo.add(s.scale(self.center[2] - xo[2]));
        path.push(xi);
        path.push(xf);
        ray.p = xf;
        ray.u = s.normalize();
        clip_ray(ray, self.center, self.clip);
    }
    fn matrix(&self, n_in: f64, _wavelength: f64) -> (Matrix2<f64>, f64) {
        let d = self.optical_center[2] - self.center[2];
        let f = self.f;
        (
            Matrix2::new(1f64 + d / f, d * d / f, -1f64 / f, 1f64 - d / f),
            n_in,
        )
    }
    fn shifted(&self, delta: Vector) -> Arc<dyn Optic> {
        Arc::new(self.offset(delta))
    }
    fn mirrored(&self, plane: f64, _index: Option<Index>) -> Arc<dyn Optic> {
        Arc::new(self.flip(plane))
    }
    fn edge(&self, r_clip: f64, force_clip: bool, curve_points: usize) -> Vec<[f64; 2]> {
        flat_edge(
            self.center,
            edge_radius(self.clip, r_clip, force_clip),
            curve_points,
        )
    }
    fn check(&self) -> Result<()> {
        if !(self.f.is_finite() && self.f != 0f64) {
            return Err(Error::InvalidStackMember(format!(
                "focal length must be finite and non-zero, got {}",
                self.f
            )));
        }
        if !self.optical_center.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidStackMember(format!(
                "optical center must be finite, got {:?}",
                self.optical_center
            )));
        }
        check_center(self.center, self.clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{collimated, fan};
    use approx::assert_abs_diff_eq;

    #[test]
    fn collimated_rays_meet_at_focal_point() {
        let lens = PerfectLens::new(100., 200.);
        let mut rays = collimated(5., 11, 0.);
        let (paths, n) = lens.trace_rays(&mut rays, 1.33, 0.5);
        assert_eq!(n, 1.33);
        assert!(paths.iter().all(|p| p.len() == 2));
        for ray in rays.iter_mut() {
            ray.trace_to_z(300.);
            assert_abs_diff_eq!(ray.p[0], 0., epsilon = 1e-12);
        }
    }

    #[test]
    fn point_source_images_at_twice_focal_length() {
        let lens = PerfectLens::new(100., 200.);
        let mut rays = fan(0., 0.05, 21);
        lens.trace_rays(&mut rays, 1., 0.5);
        for ray in rays.iter_mut() {
            ray.trace_to_z(400.);
            assert_abs_diff_eq!(ray.p[0], 0., epsilon = 1e-10);
        }
    }

    #[test]
    fn optical_center_offset() {
        let lens = PerfectLens::new(50., 10.).optical_center(12.);
        let mut rays = collimated(2., 5, 0.);
        let (paths, _) = lens.trace_rays(&mut rays, 1., 0.5);
        for (ray, path) in rays.iter_mut().zip(paths.iter()) {
            assert_abs_diff_eq!(path[0][2], 10., epsilon = 1e-12);
            assert_abs_diff_eq!(path[1][2], 10., epsilon = 1e-12);
            ray.trace_to_z(62.);
            assert_abs_diff_eq!(ray.p[0], 0., epsilon = 1e-12);
        }
        let (m, _) = lens.matrix(1., 0.5);
        let d = 2.;
        assert_eq!(m, Matrix2::new(1. + d / 50., d * d / 50., -1. / 50., 1. - d / 50.));
        assert_abs_diff_eq!(m.determinant(), 1., epsilon = 1e-12);
    }

    #[test]
    fn clipped_at_reference_plane() {
        let lens = PerfectLens::new(100., 10.).clear_radius(1.);
        let mut rays = collimated(2., 3, 0.);
        lens.trace_rays(&mut rays, 1., 0.5);
        assert_eq!(rays[0].fate(), Some(Fate::Clipped));
        assert!(rays[1].is_alive());
        assert_eq!(rays[2].fate(), Some(Fate::Clipped));
    }

    #[test]
    fn offset_moves_both_planes() {
        let lens = PerfectLens::new(100., 10.).optical_center(12.).offset(5.);
        assert_eq!(lens.center, [0., 0., 15.]);
        assert_eq!(lens.optical_center, [0., 0., 17.]);
        let flipped = lens.flip(20.);
        assert_eq!(flipped.center, [0., 0., 25.]);
        assert_eq!(flipped.optical_center, [0., 0., 23.]);
    }

    #[test]
    fn zero_focal_length_is_rejected() {
        assert!(PerfectLens::new(0., 1.).check().is_err());
        assert!(PerfectLens::new(10., 1.).check().is_ok());
    }
}
