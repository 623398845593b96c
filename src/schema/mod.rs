//! Typed shapes of the definition payload and of composition results.

pub mod category;
pub mod definition;
pub mod hint;
pub mod result;
