use super::{Arithmetic, Displacement, Vector};
use skyangle::SkyAngle;
use std::fmt;

/// Why a ray stopped propagating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fate {
    /// No real intersection with a spherical surface
    Missed,
    /// Refraction into the next medium is impossible
    TotalInternalReflection,
    /// Hit a surface outside of its clear aperture
    Clipped,
    /// Direction does not point forward along the optical axis
    Stalled,
    /// Zero or non-finite direction vector
    Degenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Alive,
    Dead(Fate),
}

/// # Ray definition
///
/// A ray is defined with:
///  - a point of origin: $\vec p = [x,y,z]$,
///  - a unit direction vector: $\vec u = [k,l,m]$,
///  - a status, dead rays are never moved or refracted again.
///
/// Rays travel toward increasing $z$; only rays with $m>0$ can reach the next surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray point of origin
    pub p: Vector,
    /// Ray direction vector
    pub u: Vector,
    pub status: Status,
}
impl Ray {
    /// Creates a ray, normalizing the direction vector
    ///
    /// A zero or non-finite direction gives a dead ray.
    pub fn new(p: Vector, u: Vector) -> Self {
        let mut u = u;
        let u = u.normalize();
        let status = if u.iter().chain(p.iter()).all(|x| x.is_finite()) {
            Status::Alive
        } else {
            Status::Dead(Fate::Degenerate)
        };
        Self { p, u, status }
    }
    pub fn is_alive(&self) -> bool {
        self.status == Status::Alive
    }
    pub fn is_forward(&self) -> bool {
        self.u[2] > 0f64
    }
    /// The first fate sticks: a dead ray stays dead for the same reason
    pub fn kill(&mut self, fate: Fate) {
        if self.is_alive() {
            self.status = Status::Dead(fate);
        }
    }
    pub fn fate(&self) -> Option<Fate> {
        match self.status {
            Status::Alive => None,
            Status::Dead(fate) => Some(fate),
        }
    }
    /// Moves the ray by the distance `s` along its direction
    pub fn trace(&mut self, s: f64) {
        self.p[0] += self.u[0] * s;
        self.p[1] += self.u[1] * s;
        self.p[2] += self.u[2] * s;
    }
    /// Moves a live ray to the plane at `z`, killing it if it does not travel forward
    pub fn trace_to_z(&mut self, z: f64) {
        if !self.is_alive() {
            return;
        }
        if !self.is_forward() {
            self.kill(Fate::Stalled);
            return;
        }
        self.trace((z - self.p[2]) / self.u[2]);
        self.p[2] = z;
    }
}
impl fmt::Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P: [{:+15.9},{:+15.9},{:+15.9}] ; U: [{:+.9},{:+.9},{:+.9}]",
            self.p[0], self.p[1], self.p[2], self.u[0], self.u[1], self.u[2],
        )?;
        if let Status::Dead(fate) = self.status {
            write!(f, " ; {:?}", fate)?;
        }
        Ok(())
    }
}

/// # Ray builder
///
/// Build a new [`Ray`]
pub struct NewRay {
    /// Ray point of origin
    pub p: Vector,
    /// Ray direction vector
    pub u: Vector,
}
impl Default for NewRay {
    fn default() -> Self {
        Self {
            p: [0f64; 3],
            u: [0f64, 0f64, 1f64],
        }
    }
}
impl NewRay {
    /// Build the [`Ray`]
    pub fn build(self) -> Ray {
        Ray::new(self.p, self.u)
    }
    /// Set the [`Ray`] point of origin
    pub fn point_of_origin<D: Into<Displacement>>(self, p: D) -> Self {
        Self {
            p: p.into().into(),
            ..self
        }
    }
    /// Set the [`Ray`] direction vector, it does not need to be a unit vector
    pub fn direction_vector(self, u: Vector) -> Self {
        Self { u, ..self }
    }
    /// Set the [`Ray`] direction vector from the angle to the optical axis (zenith) and the azimuth, in radians
    pub fn polar_direction_vector(self, z: f64, a: f64) -> Self {
        let (sa, ca) = a.sin_cos();
        let (sz, cz) = z.sin_cos();
        self.direction_vector([sz * ca, sz * sa, cz])
    }
}
/// Create a [`NewRay`] at the origin propagating forward (z>0)
pub fn new_ray() -> NewRay {
    NewRay::default()
}

/// `count` evenly spaced values from `a` to `b`; a single value sits midway
fn linspace(a: f64, b: f64, count: usize) -> Vec<f64> {
    match count {
        0 => vec![],
        1 => vec![0.5 * (a + b)],
        _ => {
            let step = (b - a) / (count - 1) as f64;
            (0..count).map(|i| a + step * i as f64).collect()
        }
    }
}

/// Meridional fan from a point source: x-slopes evenly spaced in `[-na, na]`
pub fn fan<D: Into<Displacement>>(origin: D, na: f64, count: usize) -> Vec<Ray> {
    let p: Vector = origin.into().into();
    linspace(-na, na, count)
        .into_iter()
        .map(|m| new_ray().point_of_origin(p).direction_vector([m, 0f64, 1f64]).build())
        .collect()
}
/// Meridional fan from a point source with angles to the axis evenly spaced in `[-half_angle, half_angle]` degrees
pub fn fan_degrees<D: Into<Displacement>>(origin: D, half_angle: f64, count: usize) -> Vec<Ray> {
    let p: Vector = origin.into().into();
    let half_angle = SkyAngle::Degree(half_angle).to_radians();
    linspace(-half_angle, half_angle, count)
        .into_iter()
        .map(|z| new_ray().point_of_origin(p).polar_direction_vector(z, 0f64).build())
        .collect()
}
/// Parallel rays along the axis, starting on the plane `z` at x evenly spaced in `[-half_width, half_width]`
pub fn collimated(half_width: f64, count: usize, z: f64) -> Vec<Ray> {
    linspace(-half_width, half_width, count)
        .into_iter()
        .map(|x| new_ray().point_of_origin([x, 0f64, z]).build())
        .collect()
}

/// Batch queries over a bundle of rays
pub trait Bundle {
    fn coordinates(&self) -> Vec<Vector>;
    fn directions(&self) -> Vec<Vector>;
    fn alive(&self) -> usize;
    fn dead(&self, fate: Fate) -> usize;
}
impl Bundle for [Ray] {
    fn coordinates(&self) -> Vec<Vector> {
        self.iter().map(|ray| ray.p).collect()
    }
    fn directions(&self) -> Vec<Vector> {
        self.iter().map(|ray| ray.u).collect()
    }
    fn alive(&self) -> usize {
        self.iter().filter(|ray| ray.is_alive()).count()
    }
    fn dead(&self, fate: Fate) -> usize {
        self.iter()
            .filter(|ray| ray.status == Status::Dead(fate))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn direction_is_normalized() {
        let ray = new_ray().direction_vector([3., 0., 4.]).build();
        assert_abs_diff_eq!(ray.u[0], 0.6, epsilon = 1e-15);
        assert_abs_diff_eq!(ray.u[2], 0.8, epsilon = 1e-15);
        assert!(ray.is_alive());
    }

    #[test]
    fn zero_direction_is_dead() {
        let ray = new_ray().direction_vector([0.; 3]).build();
        assert_eq!(ray.status, Status::Dead(Fate::Degenerate));
    }

    #[test]
    fn death_is_absorbing() {
        let mut ray = new_ray().build();
        ray.kill(Fate::Clipped);
        ray.kill(Fate::Missed);
        assert_eq!(ray.fate(), Some(Fate::Clipped));
        let p = ray.p;
        ray.trace_to_z(10.);
        assert_eq!(ray.p, p);
    }

    #[test]
    fn trace_to_plane() {
        let mut ray = new_ray().direction_vector([1., 0., 1.]).build();
        ray.trace_to_z(2.);
        assert_abs_diff_eq!(ray.p[0], 2., epsilon = 1e-12);
        assert_abs_diff_eq!(ray.p[2], 2., epsilon = 1e-12);
    }

    #[test]
    fn sideways_ray_stalls() {
        let mut ray = new_ray().direction_vector([1., 0., 0.]).build();
        ray.trace_to_z(2.);
        assert_eq!(ray.fate(), Some(Fate::Stalled));
    }

    #[test]
    fn fans() {
        let rays = fan(0., 0.05, 21);
        assert_eq!(rays.len(), 21);
        assert_abs_diff_eq!(rays[0].u[0] / rays[0].u[2], -0.05, epsilon = 1e-15);
        assert_abs_diff_eq!(rays[10].u[0], 0., epsilon = 1e-15);
        let rays = fan_degrees([0., 0., -1.], 10., 3);
        assert_abs_diff_eq!(rays[2].u[0], 10f64.to_radians().sin(), epsilon = 1e-12);
        assert_eq!(rays.alive(), 3);
        let rays = collimated(2., 5, -1.);
        assert_eq!(rays[4].p, [2., 0., -1.]);
        assert_eq!(collimated(2., 1, 0.)[0].p, [0.; 3]);
    }
}
