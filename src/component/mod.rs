//! Components: the unit of build logic and its staged lifecycle.

pub(crate) mod catalog;
pub(crate) mod context;
pub(crate) mod kind;
pub mod kinds;
pub(crate) mod lifecycle;
pub(crate) mod record;
pub mod rig;
