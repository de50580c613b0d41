//!
//! Expected (template) and actual (observed) topology data.
//!

mod actual;
mod expected;

pub use actual::*;
pub use expected::*;
