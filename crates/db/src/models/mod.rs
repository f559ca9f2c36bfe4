//! Row types for the PostgreSQL tables and their conversion into domain
//! entities.

pub mod membership;
pub mod project;
pub mod team;
pub mod time_entry;

pub use membership::MembershipRow;
pub use project::ProjectRow;
pub use team::TeamRow;
pub use time_entry::TimeEntryRow;
