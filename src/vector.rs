//!
//! # Vector arithmetic
//!
//! Single vectors are `[f64; 3]` with the [`Arithmetic`] extension trait;
//! batches are slices of them and the free functions below map over the batch,
//! one result per vector, in input order.

use super::Vector;

pub trait Arithmetic {
    fn dot(&self, other: &[f64]) -> f64;
    fn cross(&self, other: Self) -> Self;
    fn norm_square(&self) -> f64;
    fn norm(&self) -> f64;
    fn normalize(&mut self) -> Self;
    fn add(&self, other: Self) -> Self;
    fn sub(&self, other: Self) -> Self;
    fn scale(&self, s: f64) -> Self;
}
impl Arithmetic for Vector {
    fn dot(&self, other: &[f64]) -> f64 {
        self[0] * other[0] + self[1] * other[1] + self[2] * other[2]
    }
    fn cross(&self, other: Self) -> Self {
        [
            self[1] * other[2] - self[2] * other[1],
            self[2] * other[0] - self[0] * other[2],
            self[0] * other[1] - self[1] * other[0],
        ]
    }
    fn norm_square(&self) -> f64 {
        self.dot(self)
    }
    fn norm(&self) -> f64 {
        self.norm_square().sqrt()
    }
    /// Divides the vector by its length; a zero vector yields non-finite components
    fn normalize(&mut self) -> Self {
        let n = self.norm();
        self[0] /= n;
        self[1] /= n;
        self[2] /= n;
        *self
    }
    fn add(&self, other: Self) -> Self {
        [self[0] + other[0], self[1] + other[1], self[2] + other[2]]
    }
    fn sub(&self, other: Self) -> Self {
        [self[0] - other[0], self[1] - other[1], self[2] - other[2]]
    }
    fn scale(&self, s: f64) -> Self {
        [self[0] * s, self[1] * s, self[2] * s]
    }
}

/// Euclidean length of every vector
pub fn mag(x: &[Vector]) -> Vec<f64> {
    x.iter().map(|v| v.norm()).collect()
}
/// Pairwise dot products
pub fn dot(x: &[Vector], y: &[Vector]) -> Vec<f64> {
    x.iter().zip(y.iter()).map(|(u, v)| u.dot(v)).collect()
}
/// Pairwise cross products
pub fn cross(x: &[Vector], y: &[Vector]) -> Vec<Vector> {
    x.iter().zip(y.iter()).map(|(u, v)| u.cross(*v)).collect()
}
/// Unit vectors; callers guarantee no zero-length entry
pub fn norm(x: &[Vector]) -> Vec<Vector> {
    x.iter()
        .map(|v| {
            let mut v = *v;
            v.normalize()
        })
        .collect()
}

/// # Displacement
///
/// A position or translation given either as a full vector or as a bare
/// axial distance, i.e. `z` meaning `[0, 0, z]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement(pub Vector);
impl From<f64> for Displacement {
    fn from(z: f64) -> Self {
        Self([0f64, 0f64, z])
    }
}
impl From<Vector> for Displacement {
    fn from(v: Vector) -> Self {
        Self(v)
    }
}
impl From<Displacement> for Vector {
    fn from(d: Displacement) -> Self {
        d.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn batch_ops() {
        let x = [[3., 4., 0.], [0., 0., 2.]];
        let y = [[0., 0., 1.], [1., 0., 0.]];
        assert_eq!(mag(&x), vec![5., 2.]);
        assert_eq!(dot(&x, &y), vec![0., 0.]);
        assert_eq!(cross(&x, &y), vec![[4., -3., 0.], [0., 2., 0.]]);
        let n = norm(&x);
        assert_abs_diff_eq!(n[0][0], 0.6, epsilon = 1e-15);
        assert_abs_diff_eq!(n[0][1], 0.8, epsilon = 1e-15);
        assert_eq!(n[1], [0., 0., 1.]);
    }

    #[test]
    fn cross_is_orthogonal() {
        let u: Vector = [0.3, -1.2, 0.7];
        let v: Vector = [2.0, 0.1, -0.4];
        let w = u.cross(v);
        assert_abs_diff_eq!(w.dot(&u), 0., epsilon = 1e-12);
        assert_abs_diff_eq!(w.dot(&v), 0., epsilon = 1e-12);
    }

    #[test]
    fn zero_vector_normalizes_to_nan() {
        let mut z: Vector = [0.; 3];
        assert!(z.normalize().iter().all(|x| x.is_nan()));
    }

    #[test]
    fn displacement_from_scalar_is_axial() {
        let d: Displacement = 2.5.into();
        assert_eq!(d.0, [0., 0., 2.5]);
    }
}
