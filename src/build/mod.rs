//! Driving a whole rig: planning, stage passes and reporting.

pub(crate) mod options;
pub(crate) mod orchestrator;
pub(crate) mod plan;
pub(crate) mod report;
pub(crate) mod rig_file;
