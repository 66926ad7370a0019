//! Operator policy applied to listed records
//!
//! - [`match_pattern`]: regex test of a record name
//! - [`IgnorePolicy`]: exception rules keeping records out of the managed set
//! - [`CreateDirective`]: a record the operator wants managed even if the
//!   provider does not have it yet

pub mod directive;
pub mod ignore;
pub mod matcher;

pub use directive::CreateDirective;
pub use ignore::{ConflictInfo, IgnorePolicy, IgnoreRule, Verdict};
pub use matcher::match_pattern;
