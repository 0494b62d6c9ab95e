//! Typed component settings.

pub(crate) mod store;
