//! Errors raised while building indices, surfaces and stacks.
//!
//! Rays that miss a surface, get clipped or are totally internally reflected
//! are not errors; they are carried as [`Status::Dead`](crate::Status) on the ray.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("index specified as \"{0}\", but this is not a known material")]
    UnknownMaterial(String),

    #[error("invalid index specification: {0}")]
    InvalidIndex(String),

    #[error("invalid stack member: {0}")]
    InvalidStackMember(String),

    #[error("{origins} ray origins do not match {directions} ray directions")]
    ShapeMismatch { origins: usize, directions: usize },

    #[error("optical stack has no surfaces")]
    EmptyStack,

    #[error("dispersion data unavailable: {0}")]
    DataStore(String),
}

pub type Result<T> = std::result::Result<T, Error>;
