//!
//! # Trace results
//!
//! Ray paths through a stack, one point list per ray, and the focus error
//! measures used to compare candidate lenses.

use super::{Arithmetic, Bundle, Ray, Vector};

/// Paths and final states of a ray bundle traced through an [`OpticalStack`](crate::OpticalStack)
///
/// Every path has the same length: the starting point, the points added at each
/// surface (dead rays repeat their last position) and the point on the final plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    paths: Vec<Vec<Vector>>,
    rays: Vec<Ray>,
    z_final: f64,
}
impl Trace {
    pub(crate) fn new(paths: Vec<Vec<Vector>>, rays: Vec<Ray>, z_final: f64) -> Self {
        Self {
            paths,
            rays,
            z_final,
        }
    }
    pub fn paths(&self) -> &[Vec<Vector>] {
        &self.paths
    }
    /// Final ray states, in input order
    pub fn rays(&self) -> &[Ray] {
        &self.rays
    }
    pub fn z_final(&self) -> f64 {
        self.z_final
    }
    pub fn len(&self) -> usize {
        self.rays.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }
    pub fn points_per_ray(&self) -> usize {
        self.paths.first().map_or(0, |p| p.len())
    }
    pub fn alive(&self) -> usize {
        self.rays.alive()
    }
    pub fn dead_count(&self) -> usize {
        self.len() - self.alive()
    }
    /// Last two points of the path of ray `i`
    pub fn final_segment(&self, i: usize) -> Option<(Vector, Vector)> {
        let path = self.paths.get(i)?;
        match path.len() {
            0 | 1 => None,
            n => Some((path[n - 2], path[n - 1])),
        }
    }
    /// Extends the last segment of every live ray to the plane `z`
    ///
    /// Used to project rays back onto a paraxial focal plane; dead rays give `None`.
    pub fn project_to(&self, z: f64) -> Vec<Option<Vector>> {
        self.rays
            .iter()
            .map(|ray| {
                if ray.is_alive() && ray.u[2] != 0f64 {
                    Some(ray.p.add(ray.u.scale((z - ray.p[2]) / ray.u[2])))
                } else {
                    None
                }
            })
            .collect()
    }
    /// $x$ offset of every live ray projected to the plane `z`
    pub fn transverse_error(&self, z: f64) -> Vec<Option<f64>> {
        self.project_to(z)
            .into_iter()
            .map(|p| p.map(|p| p[0]))
            .collect()
    }
    /// Root mean square radial offset of the live rays projected to the plane `z`
    pub fn rms_error(&self, z: f64) -> Option<f64> {
        let r2: Vec<f64> = self
            .project_to(z)
            .into_iter()
            .flatten()
            .map(|p| p[0] * p[0] + p[1] * p[1])
            .collect();
        if r2.is_empty() {
            None
        } else {
            Some((r2.iter().sum::<f64>() / r2.len() as f64).sqrt())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{new_ray, Fate};
    use approx::assert_abs_diff_eq;

    fn sample() -> Trace {
        let live = new_ray()
            .point_of_origin([1., 0., 10.])
            .direction_vector([-0.1, 0., 1.])
            .build();
        let mut dead = new_ray().point_of_origin([5., 0., 3.]).build();
        dead.kill(Fate::Clipped);
        Trace::new(
            vec![
                vec![[2., 0., 0.], [1., 0., 10.]],
                vec![[5., 0., 0.], [5., 0., 3.]],
            ],
            vec![live, dead],
            10.,
        )
    }

    #[test]
    fn projection() {
        let trace = sample();
        let p = trace.project_to(20.);
        assert_abs_diff_eq!(p[0].unwrap()[0], 0., epsilon = 1e-12);
        assert_eq!(p[1], None);
        assert_eq!(trace.transverse_error(0.)[0].map(|x| x.round()), Some(2.));
        assert_abs_diff_eq!(trace.rms_error(20.).unwrap(), 0., epsilon = 1e-12);
    }

    #[test]
    fn counts() {
        let trace = sample();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.alive(), 1);
        assert_eq!(trace.dead_count(), 1);
        assert_eq!(trace.points_per_ray(), 2);
        assert_eq!(trace.final_segment(0), Some(([2., 0., 0.], [1., 0., 10.])));
        assert_eq!(trace.final_segment(2), None);
    }
}
