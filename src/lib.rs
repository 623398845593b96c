//! Trap Forge: trap and cache composition for virtual tabletops.
//!
//! Resolves a layered definition database (bundled base plus an author's
//! override layer), classifies categories into a primary/subcategory
//! hierarchy with inherited trigger phrases, picks tiered hint sets, and
//! normalizes template text into a single consistent narrative sentence.

pub mod core;
pub mod schema;
