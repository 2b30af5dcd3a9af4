//! API handlers module

pub mod analysis;
pub mod documents;
pub mod health;
pub mod page;
pub mod qa;
