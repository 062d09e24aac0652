//! Route groups, one module per mount point.

pub mod patients;
pub mod records;
pub mod users;
