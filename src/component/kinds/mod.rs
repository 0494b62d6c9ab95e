//! Built-in component kinds.

pub mod basic;
pub mod basic_array;
pub mod chain;
pub mod chain_spline;
pub mod hand;
pub mod leg;
pub mod limb;
pub mod main;
