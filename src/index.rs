//!
//! # Refractive index
//!
//! An [`IndexSpec`] says how a material's index is given: by name, as a
//! dispersion-free constant or as a custom function of wavelength. It is
//! resolved once, when a surface is built, into an [`Index`] that evaluates
//! without further lookups.
//!
//! Wavelengths are in micrometers throughout, matching the Sellmeier
//! coefficients of the dispersion table.

use super::{glass, Error, Result};
use std::{fmt, sync::Arc};

/// # Sellmeier dispersion formula
///
/// $$ n^2(\lambda) = A + \sum_i \frac{B_i\lambda^2}{\lambda^2 - C_i} $$
/// with $A=1$ unless stated otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Sellmeier {
    a: f64,
    b: Vec<f64>,
    c: Vec<f64>,
}
impl Sellmeier {
    /// Creates a new `Sellmeier` model from the $B$ and $C$ coefficients
    pub fn new(b: Vec<f64>, c: Vec<f64>) -> Result<Self> {
        if b.is_empty() || b.len() != c.len() {
            return Err(Error::InvalidIndex(format!(
                "Sellmeier coefficients need matching, non-empty B and C lists (got {} and {})",
                b.len(),
                c.len()
            )));
        }
        if b.iter().chain(c.iter()).any(|x| !x.is_finite()) {
            return Err(Error::InvalidIndex(
                "Sellmeier coefficients must be finite".to_string(),
            ));
        }
        Ok(Self { a: 1f64, b, c })
    }
    /// Sets the leading constant $A$
    pub fn constant(self, a: f64) -> Self {
        Self { a, ..self }
    }
    /// Index at `wavelength`
    pub fn eval(&self, wavelength: f64) -> f64 {
        let l2 = wavelength * wavelength;
        self.b
            .iter()
            .zip(self.c.iter())
            .fold(self.a, |n2, (b, c)| n2 + b * l2 / (l2 - c))
            .sqrt()
    }
    pub fn eval_many(&self, wavelengths: &[f64]) -> Vec<f64> {
        wavelengths.iter().map(|&l| self.eval(l)).collect()
    }
}

type IndexFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// A resolved refractive index
#[derive(Clone)]
pub enum Index {
    Constant(f64),
    Sellmeier(Arc<Sellmeier>),
    Custom(IndexFn),
}
impl Index {
    /// Resolves a material name against the dispersion table
    pub fn named(name: &str) -> Result<Self> {
        glass::lookup(name)
    }
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Index::Custom(Arc::new(f))
    }
    pub fn eval(&self, wavelength: f64) -> f64 {
        match self {
            Index::Constant(n) => *n,
            Index::Sellmeier(model) => model.eval(wavelength),
            Index::Custom(f) => f(wavelength),
        }
    }
    pub fn eval_many(&self, wavelengths: &[f64]) -> Vec<f64> {
        wavelengths.iter().map(|&l| self.eval(l)).collect()
    }
}
impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Constant(n) => write!(f, "Constant({})", n),
            Index::Sellmeier(model) => write!(f, "{:?}", model),
            Index::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
impl From<Sellmeier> for Index {
    fn from(model: Sellmeier) -> Self {
        Index::Sellmeier(Arc::new(model))
    }
}
impl Default for Index {
    fn default() -> Self {
        Index::Constant(1f64)
    }
}

/// How a refractive index is specified before resolution
#[derive(Clone)]
pub enum IndexSpec {
    Named(String),
    Constant(f64),
    Custom(IndexFn),
    Resolved(Index),
}
impl IndexSpec {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        IndexSpec::Custom(Arc::new(f))
    }
    /// Turns the specification into an evaluator
    ///
    /// Fails for material names missing from the dispersion table and for
    /// constants that are not finite and positive.
    pub fn resolve(&self) -> Result<Index> {
        match self {
            IndexSpec::Named(name) => glass::lookup(name),
            IndexSpec::Constant(n) if n.is_finite() && *n > 0f64 => Ok(Index::Constant(*n)),
            IndexSpec::Constant(n) => Err(Error::InvalidIndex(format!("{}", n))),
            IndexSpec::Custom(f) => Ok(Index::Custom(f.clone())),
            IndexSpec::Resolved(index) => Ok(index.clone()),
        }
    }
}
impl fmt::Debug for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSpec::Named(name) => write!(f, "Named({:?})", name),
            IndexSpec::Constant(n) => write!(f, "Constant({})", n),
            IndexSpec::Custom(_) => write!(f, "Custom(..)"),
            IndexSpec::Resolved(index) => write!(f, "Resolved({:?})", index),
        }
    }
}
impl From<&str> for IndexSpec {
    fn from(name: &str) -> Self {
        IndexSpec::Named(name.to_string())
    }
}
impl From<String> for IndexSpec {
    fn from(name: String) -> Self {
        IndexSpec::Named(name)
    }
}
impl From<f64> for IndexSpec {
    fn from(n: f64) -> Self {
        IndexSpec::Constant(n)
    }
}
impl From<Index> for IndexSpec {
    fn from(index: Index) -> Self {
        IndexSpec::Resolved(index)
    }
}
impl From<Sellmeier> for IndexSpec {
    fn from(model: Sellmeier) -> Self {
        IndexSpec::Resolved(model.into())
    }
}

/// Evaluates an index specification at `wavelength`
pub fn eval(spec: &IndexSpec, wavelength: f64) -> Result<f64> {
    Ok(spec.resolve()?.eval(wavelength))
}

/// Names of the materials in the dispersion table
pub fn materials() -> Result<Vec<String>> {
    Ok(glass::table()?.names())
}
