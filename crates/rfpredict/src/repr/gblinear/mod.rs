//! Linear model canonical representation.

mod model;

pub use model::LinearModel;
