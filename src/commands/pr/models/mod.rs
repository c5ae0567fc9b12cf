//! Pure data normalization for change requests: no I/O except
//! `snapshot::build_snapshot`, which takes the client as a parameter.

pub mod check;
pub mod patch;
pub mod path_tree;
pub mod patchset;
pub mod snapshot;
pub mod thread;
pub mod thread_filter;
