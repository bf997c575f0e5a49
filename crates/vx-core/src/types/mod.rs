//! Core type definitions

mod bound;
mod eye;
mod frustum;
mod pose;

pub use bound::*;
pub use eye::*;
pub use frustum::*;
pub use pose::*;
