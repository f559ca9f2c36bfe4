//! Domain entities.
//!
//! Each submodule contains:
//! - The entity struct as storage returns it (with its three lifecycle stamps)
//! - The input struct a use-case hands to a repository for inserts/updates

pub mod membership;
pub mod project;
pub mod team;
pub mod time_entry;

pub use membership::Membership;
pub use project::{NewProject, Project};
pub use team::{NewTeam, Team, TeamNames};
pub use time_entry::{NewTimeEntry, TimeEntry, TimeEntryInput, TimeEntryUpdate};
