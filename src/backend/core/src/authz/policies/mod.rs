//! Per-resource-type access policies.
//!
//! Each module bundles the rule set, the scope builder, and the params
//! whitelists for one resource type. The conventions are shared:
//!
//! - `manage` is the catch-all; `update` / `destroy` / `undiscard` reuse it
//!   unless the type needs a narrower predicate;
//! - `new`, `edit`, `remove`, `destroy_all`, `undiscard_all` are aliases;
//! - missing rules deny;
//! - scope builders return the empty sentinel for roles with no visibility.

pub mod collectivities;
pub mod ddfips;
pub mod offices;
pub mod packages;
pub mod publishers;
pub mod reports;
pub mod users;
