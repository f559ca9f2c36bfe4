//! Timeasy use-cases.
//!
//! Each service enforces input invariants, loads the target through the
//! persistence ports, asks the authorisation kernel and only then writes.

pub mod lookup;
pub mod project;
pub mod sync;
pub mod team;
pub mod time_entry;

use std::sync::Arc;

use timeasy_core::clock::Clock;
use timeasy_core::ports::{
    MembershipRepository, ProjectRepository, SyncRepository, TeamRepository, TimeEntryRepository,
};

pub use lookup::TeamLookup;
pub use project::ProjectService;
pub use sync::SyncService;
pub use team::TeamService;
pub use time_entry::TimeEntryService;

/// All use-case services wired to one storage adapter.
#[derive(Clone)]
pub struct Services {
    pub projects: ProjectService,
    pub teams: TeamService,
    pub time_entries: TimeEntryService,
    pub sync: SyncService,
}

impl Services {
    pub fn new<S>(store: Arc<S>, clock: Arc<dyn Clock>) -> Self
    where
        S: TeamRepository
            + MembershipRepository
            + ProjectRepository
            + TimeEntryRepository
            + SyncRepository
            + 'static,
    {
        let teams = TeamService::new(store.clone(), store.clone());
        let lookup: Arc<dyn TeamLookup> = Arc::new(teams.clone());
        Self {
            projects: ProjectService::new(store.clone(), lookup.clone()),
            time_entries: TimeEntryService::new(
                store.clone(),
                store.clone(),
                lookup.clone(),
                clock.clone(),
            ),
            sync: SyncService::new(store.clone(), store.clone(), store, lookup, clock),
            teams,
        }
    }
}
