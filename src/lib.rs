//!
//! # Sequential ray tracing through refracting surfaces
//!
//! Exact vector ray tracing and paraxial (ABCD) transfer matrices through an
//! ordered [`OpticalStack`] of spherical and planar refracting [`Surface`]s and
//! ideal thin [`PerfectLens`]es, with wavelength dependent refractive indices.
//!
//! The optical axis is $z$; rays travel toward increasing $z$.
//! Wavelengths are in micrometers.

pub mod error;
pub mod glass;
pub mod index;
pub mod perfect_lens;
pub mod ray;
pub mod stack;
pub mod surface;
pub mod trace;
pub mod vector;
pub use error::{Error, Result};
pub use index::{Index, IndexSpec, Sellmeier};
pub use perfect_lens::PerfectLens;
pub use ray::{collimated, fan, fan_degrees, new_ray, Bundle, Fate, Ray, Status};
pub use stack::{Element, Layer, OpticalStack};
pub use surface::Surface;
pub use trace::Trace;
pub use vector::{Arithmetic, Displacement};

use nalgebra::Matrix2;
use std::{fmt, sync::Arc};

pub type Vector = [f64; 3];

/// Wavelength used when none is given, in micrometers
pub const DEFAULT_WAVELENGTH: f64 = 0.5;

/// An element of an [`OpticalStack`]
///
/// Implementors are immutable: translations and mirror images are new values.
pub trait Optic: fmt::Debug + Send + Sync {
    /// Reference point; its $z$ coordinate orders the stack
    fn center(&self) -> Vector;
    /// Clear aperture radius, `None` if unclipped
    fn clip_radius(&self) -> Option<f64>;
    /// Medium behind the surface, `None` if the incoming medium carries through
    fn index(&self) -> Option<&Index>;
    /// Index of the medium behind the surface at `wavelength`
    fn n_out(&self, n_in: f64, wavelength: f64) -> f64 {
        self.index().map_or(n_in, |n| n.eval(wavelength))
    }
    /// Number of points a ray adds to its path crossing the surface
    fn hits(&self) -> usize {
        1
    }
    /// Traces one ray across the surface, pushing exactly [`hits`](Optic::hits) points onto `path`
    fn refract(&self, ray: &mut Ray, n_in: f64, n_out: f64, path: &mut Vec<Vector>);
    /// Paraxial transfer matrix and outgoing index for rays coming from a medium of index `n_in`
    fn matrix(&self, n_in: f64, wavelength: f64) -> (Matrix2<f64>, f64);
    /// Translated copy
    fn shifted(&self, delta: Vector) -> Arc<dyn Optic>;
    /// Copy mirrored about the plane at $z=$ `plane`, with an optional new medium behind it
    fn mirrored(&self, plane: f64, index: Option<Index>) -> Arc<dyn Optic>;
    /// Cross-section profile as $(z,x)$ points
    fn edge(&self, r_clip: f64, force_clip: bool, curve_points: usize) -> Vec<[f64; 2]>;
    /// Checks the geometry is usable in a stack
    fn check(&self) -> Result<()>;
    /// Traces a batch of rays across the surface
    ///
    /// Returns the points added to each ray path and the outgoing index.
    fn trace_rays(&self, rays: &mut [Ray], n_in: f64, wavelength: f64) -> (Vec<Vec<Vector>>, f64) {
        let n_out = self.n_out(n_in, wavelength);
        let paths = rays
            .iter_mut()
            .map(|ray| {
                let mut path = Vec::with_capacity(self.hits());
                self.refract(ray, n_in, n_out, &mut path);
                path
            })
            .collect();
        (paths, n_out)
    }
}
