use super::{
    Bundle, Displacement, Error, Fate, Index, IndexSpec, Optic, PerfectLens, Ray, Result,
    Surface, Trace, Vector,
};
use log::debug;
use nalgebra::Matrix2;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Paraxial propagation over the axial distance `d`
pub fn advance(m: Matrix2<f64>, d: f64) -> Matrix2<f64> {
    Matrix2::new(1f64, d, 0f64, 1f64) * m
}

/// A member of an [`OpticalStack`] under construction
///
/// A nested stack contributes its surfaces only: the medium in front of it
/// is the one left by the preceding surfaces (or the outer stack's own).
#[derive(Debug, Clone)]
pub enum Layer {
    Optic(Arc<dyn Optic>),
    Stack(OpticalStack),
}
impl From<Surface> for Layer {
    fn from(surface: Surface) -> Self {
        Layer::Optic(Arc::new(surface))
    }
}
impl From<PerfectLens> for Layer {
    fn from(lens: PerfectLens) -> Self {
        Layer::Optic(Arc::new(lens))
    }
}
impl From<Arc<dyn Optic>> for Layer {
    fn from(optic: Arc<dyn Optic>) -> Self {
        Layer::Optic(optic)
    }
}
impl From<OpticalStack> for Layer {
    fn from(stack: OpticalStack) -> Self {
        Layer::Stack(stack)
    }
}

/// # Optical stack
///
/// Surfaces sorted by the axial position of their centers, in the order a
/// ray meets them, immersed in a medium of index `n0` in front of the first one.
/// Nested stacks are flattened into their surfaces when the stack is built.
/// A stack never changes; [`offset`](OpticalStack::offset) and
/// [`flip`](OpticalStack::flip) return new stacks.
#[derive(Debug, Clone)]
pub struct OpticalStack {
    n0: Index,
    surfaces: Vec<Arc<dyn Optic>>,
}
impl Default for OpticalStack {
    fn default() -> Self {
        Self {
            n0: Index::default(),
            surfaces: vec![],
        }
    }
}
impl OpticalStack {
    /// Creates a new `OpticalStack` in a medium of index 1
    pub fn new<I, L>(layers: I) -> Result<Self>
    where
        I: IntoIterator<Item = L>,
        L: Into<Layer>,
    {
        let mut surfaces: Vec<Arc<dyn Optic>> = vec![];
        for layer in layers {
            match layer.into() {
                Layer::Optic(optic) => {
                    optic.check()?;
                    surfaces.push(optic);
                }
                Layer::Stack(stack) => {
                    debug!(
                        "flattening a nested stack of {} surfaces, its front medium {:?} is dropped",
                        stack.len(),
                        stack.n0
                    );
                    surfaces.extend(stack.surfaces)
                }
            }
        }
        Ok(Self::from_sorted(Index::default(), surfaces))
    }
    fn from_sorted(n0: Index, mut surfaces: Vec<Arc<dyn Optic>>) -> Self {
        surfaces.sort_by(|a, b| a.center()[2].total_cmp(&b.center()[2]));
        debug!(
            "optical stack with {} surfaces from z={:?} to z={:?}",
            surfaces.len(),
            surfaces.first().map(|s| s.center()[2]),
            surfaces.last().map(|s| s.center()[2]),
        );
        Self { n0, surfaces }
    }
    /// Sets the index of the medium in front of the first surface
    pub fn in_medium<S: Into<IndexSpec>>(self, n0: S) -> Result<Self> {
        Ok(Self {
            n0: n0.into().resolve()?,
            ..self
        })
    }
    pub fn n0(&self) -> &Index {
        &self.n0
    }
    pub fn surfaces(&self) -> &[Arc<dyn Optic>] {
        &self.surfaces
    }
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
    /// Center of the first surface
    pub fn start(&self) -> Option<Vector> {
        self.surfaces.first().map(|s| s.center())
    }
    /// Center of the last surface
    pub fn end(&self) -> Option<Vector> {
        self.surfaces.last().map(|s| s.center())
    }
    /// Translates every surface by `delta`, a bare number being an axial shift
    pub fn offset<D: Into<Displacement>>(&self, delta: D) -> Self {
        let delta: Vector = delta.into().into();
        Self::from_sorted(
            self.n0.clone(),
            self.surfaces.iter().map(|s| s.shifted(delta)).collect(),
        )
    }
    /// Turns the stack end-for-end
    ///
    /// Surface positions are mirrored so that the reversed stack ends at `end`
    /// (the current last surface if `None`), then shifted by `offset` along the axis.
    /// Media are re-threaded so that each surface now leads into the medium
    /// that used to precede it, e.g. a lens stays glass between its faces.
    pub fn flip(&self, offset: f64, end: Option<f64>) -> Self {
        let (start, last) = match (self.start(), self.end()) {
            (Some(start), Some(last)) => (start[2], last[2]),
            _ => return self.clone(),
        };
        let plane = 0.5 * (start + end.unwrap_or(last) + offset);
        let mut medium = self.n0.clone();
        let mut surfaces: Vec<Arc<dyn Optic>> = self
            .surfaces
            .iter()
            .map(|s| match s.index() {
                Some(index) => {
                    let before = std::mem::replace(&mut medium, index.clone());
                    s.mirrored(plane, Some(before))
                }
                None => s.mirrored(plane, None),
            })
            .collect();
        // mirrored positions are decreasing: reverse so that ties keep the reversed traversal order
        surfaces.reverse();
        Self::from_sorted(self.n0.clone(), surfaces)
    }
    /// Traces `rays` through every surface up to the plane `z_final`
    ///
    /// Live rays are then propagated in straight lines to `z_final`.
    pub fn trace(&self, rays: &[Ray], z_final: f64, wavelength: f64) -> Trace {
        let mut n = self.n0.eval(wavelength);
        let media: Vec<(&Arc<dyn Optic>, f64, f64)> = self
            .surfaces
            .iter()
            .take_while(|s| s.center()[2] <= z_final)
            .map(|s| {
                let n_in = n;
                n = s.n_out(n_in, wavelength);
                (s, n_in, n)
            })
            .collect();
        let trace_ray = |ray: &Ray| -> (Vec<Vector>, Ray) {
            let mut ray = *ray;
            let mut path = vec![ray.p];
            for (surface, n_in, n_out) in media.iter() {
                surface.refract(&mut ray, *n_in, *n_out, &mut path);
            }
            ray.trace_to_z(z_final);
            path.push(ray.p);
            (path, ray)
        };
        #[cfg(feature = "parallel")]
        let (paths, rays): (Vec<_>, Vec<_>) = rays.par_iter().map(trace_ray).unzip();
        #[cfg(not(feature = "parallel"))]
        let (paths, rays): (Vec<_>, Vec<_>) = rays.iter().map(trace_ray).unzip();
        debug!(
            "traced {} rays through {} surfaces to z={}: {} alive, {} missed, {} clipped, {} TIR, {} stalled",
            rays.len(),
            media.len(),
            z_final,
            rays.alive(),
            rays.dead(Fate::Missed),
            rays.dead(Fate::Clipped),
            rays.dead(Fate::TotalInternalReflection),
            rays.dead(Fate::Stalled),
        );
        Trace::new(paths, rays, z_final)
    }
    /// Traces rays given as separate origins and (not necessarily unit) directions
    ///
    /// A single origin or a single direction is shared by the whole bundle.
    pub fn trace_rays(
        &self,
        origins: &[Vector],
        directions: &[Vector],
        z_final: f64,
        wavelength: f64,
    ) -> Result<Trace> {
        let rays: Vec<Ray> = match (origins.len(), directions.len()) {
            (1, _) => directions.iter().map(|&u| Ray::new(origins[0], u)).collect(),
            (_, 1) => origins.iter().map(|&p| Ray::new(p, directions[0])).collect(),
            (n, m) if n == m => origins
                .iter()
                .zip(directions.iter())
                .map(|(&p, &u)| Ray::new(p, u))
                .collect(),
            (origins, directions) => {
                return Err(Error::ShapeMismatch {
                    origins,
                    directions,
                })
            }
        };
        Ok(self.trace(&rays, z_final, wavelength))
    }
    /// Paraxial transfer matrix from the plane $z=0$ to the plane `z_final`
    ///
    /// If `z_final` is `None`, the matrix is computed to the plane where the
    /// axial point $z=0$ is imaged, and that plane is returned with the matrix.
    /// The object plane imaged at infinity gives a non-finite position.
    pub fn matrix(&self, wavelength: f64, z_final: Option<f64>) -> Result<(Matrix2<f64>, f64)> {
        let zf = match (z_final, self.end()) {
            (Some(zf), _) => zf,
            (None, Some(end)) => end[2],
            (None, None) => return Err(Error::EmptyStack),
        };
        let mut n = self.n0.eval(wavelength);
        let mut m = Matrix2::identity();
        let mut z = 0f64;
        for surface in self.surfaces.iter() {
            let z1 = surface.center()[2];
            if z1 > zf {
                break;
            }
            m = advance(m, z1 - z);
            z = z1;
            let (m1, n1) = surface.matrix(n, wavelength);
            m = m1 * m;
            n = n1;
        }
        let z_final = z_final.unwrap_or_else(|| z - m[(0, 1)] / m[(1, 1)]);
        debug!("paraxial matrix to z={}: {}", z_final, m);
        Ok((advance(m, z_final - z), z_final))
    }
    /// Paraxial image position of the axial point $z=0$
    pub fn focus(&self, wavelength: f64) -> Result<f64> {
        self.matrix(wavelength, None).map(|(_, z)| z)
    }
    /// Cross-section profiles of all surfaces
    pub fn edges(&self, r_clip: f64, force_clip: bool, curve_points: usize) -> Vec<Vec<[f64; 2]>> {
        self.surfaces
            .iter()
            .map(|s| s.edge(r_clip, force_clip, curve_points))
            .collect()
    }
}

/// # Lens element
///
/// Builds the two-surface [`OpticalStack`] of a single lens: an entrance
/// surface of radius $R_1$ into the lens material and an exit surface of radius
/// $R_2$, `thickness` further along the axis, back into the medium `n_after`.
/// Radii default to flat, the clear aperture radius to 10.
#[derive(Debug, Clone)]
pub struct Element {
    index: IndexSpec,
    thickness: f64,
    r1: Option<f64>,
    r2: Option<f64>,
    center: Vector,
    n_after: IndexSpec,
    n0: IndexSpec,
    clip: Option<f64>,
}
impl Element {
    pub fn new<S: Into<IndexSpec>>(index: S, thickness: f64) -> Self {
        Self {
            index: index.into(),
            thickness,
            r1: None,
            r2: None,
            center: [0f64; 3],
            n_after: IndexSpec::Constant(1f64),
            n0: IndexSpec::Constant(1f64),
            clip: Some(10f64),
        }
    }
    /// Builds a lens blank from catalog fields
    pub fn from_blank<S: Into<IndexSpec>>(
        material: S,
        thickness: f64,
        r1: Option<f64>,
        r2: Option<f64>,
        clear_aperture: f64,
    ) -> Result<OpticalStack> {
        let mut element = Element::new(material, thickness).clear_aperture(clear_aperture);
        element.r1 = r1;
        element.r2 = r2;
        element.build()
    }
    pub fn r1(self, r1: f64) -> Self {
        Self {
            r1: Some(r1),
            ..self
        }
    }
    pub fn r2(self, r2: f64) -> Self {
        Self {
            r2: Some(r2),
            ..self
        }
    }
    /// Vertex of the entrance surface
    pub fn center<D: Into<Displacement>>(self, center: D) -> Self {
        Self {
            center: center.into().into(),
            ..self
        }
    }
    /// Medium behind the lens
    pub fn n_after<S: Into<IndexSpec>>(self, n_after: S) -> Self {
        Self {
            n_after: n_after.into(),
            ..self
        }
    }
    /// Medium in front of the lens
    ///
    /// Only holds for the lens on its own: nested in another stack, the lens
    /// sits in whatever medium the preceding surfaces lead into.
    pub fn n0<S: Into<IndexSpec>>(self, n0: S) -> Self {
        Self {
            n0: n0.into(),
            ..self
        }
    }
    /// Clear aperture radius of both surfaces
    pub fn clip(self, clip: f64) -> Self {
        Self {
            clip: Some(clip),
            ..self
        }
    }
    /// Clear aperture diameter of both surfaces
    pub fn clear_aperture(self, clear_aperture: f64) -> Self {
        self.clip(0.5 * clear_aperture)
    }
    pub fn unclipped(self) -> Self {
        Self { clip: None, ..self }
    }
    pub fn build(self) -> Result<OpticalStack> {
        if !(self.thickness.is_finite() && self.thickness >= 0f64) {
            return Err(Error::InvalidStackMember(format!(
                "lens thickness must be finite and non-negative, got {}",
                self.thickness
            )));
        }
        let surface = |index: IndexSpec, center: Vector, radius: Option<f64>| -> Result<Surface> {
            let surface = Surface::new(index, center)?.radius_of_curvature(radius.unwrap_or(0f64));
            Ok(match self.clip {
                Some(clip) => surface.clear_radius(clip),
                None => surface,
            })
        };
        let mut exit = self.center;
        exit[2] += self.thickness;
        OpticalStack::new(vec![
            surface(self.index.clone(), self.center, self.r1)?,
            surface(self.n_after.clone(), exit, self.r2)?,
        ])?
        .in_medium(self.n0.clone())
    }
}
