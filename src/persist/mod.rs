//! Persistence collaborator used to save and load component records.

pub(crate) mod store;
