use thiserror::Error;

/// Failures the geometry kernel signals to its callers.
///
/// Degenerate but recoverable constructions (coincident circles, rays
/// that miss) return `None` instead; only genuinely invalid states
/// surface as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// A front could not be closed: some circle has no touching
    /// neighbour to its angular left.
    #[error("no valid front: a circle has no touching left neighbour")]
    NoFront,
    /// The leading coefficient of a quadratic solve was zero.
    #[error("not a quadratic equation: leading coefficient is zero")]
    Math,
}
