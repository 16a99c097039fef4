//! Building groups: the unit of heat-rejection aggregation.

pub mod assignment;
pub mod resolver;

pub use assignment::{Assignment, Group, SharedSystemConflict, is_group_id};
pub use resolver::{GroupRow, Resolution, ResolutionMode, derive_groups, resolve, resolve_rows};
