//! Table-level queries, one zero-sized repo per table.
//!
//! Every function is generic over [`sqlx::PgExecutor`] so it runs against the
//! pool or inside a transaction (`&mut *tx`) alike. Bookkeeping timestamps are
//! passed in by the caller.

pub mod membership_repo;
pub mod project_repo;
pub mod team_repo;
pub mod time_entry_repo;

pub use membership_repo::MembershipRepo;
pub use project_repo::ProjectRepo;
pub use team_repo::TeamRepo;
pub use time_entry_repo::TimeEntryRepo;
