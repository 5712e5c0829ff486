//! Report definitions, the registry that holds them, and the dispatcher
//! that drives one selection through query, normalization and rendering.

pub mod catalog;
pub mod definition;
pub mod dispatch;
pub mod params;
pub mod registry;
