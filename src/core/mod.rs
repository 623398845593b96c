//! Definition resolution and narrative composition.

pub mod classify;
pub mod config;
pub mod flavor;
pub mod hints;
pub mod merge;
pub mod persist;
pub mod pipeline;
pub mod slug;
pub mod spawn;
pub mod store;
pub mod triggers;
