//! Shared fixtures: the services wired to the in-process store and a clock
//! the test advances by hand.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use timeasy_core::clock::ManualClock;
use timeasy_core::identity::Caller;
use timeasy_core::models::{Project, Team, TeamNames, TimeEntry, TimeEntryInput};
use timeasy_db::MemoryStore;
use timeasy_usecase::Services;
use uuid::Uuid;

pub struct Harness {
    pub services: Services,
    pub clock: ManualClock,
}

pub fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn harness() -> Harness {
    harness_at(utc(2023, 8, 1))
}

pub fn harness_at(start: DateTime<Utc>) -> Harness {
    let clock = ManualClock::new(start);
    let store = Arc::new(MemoryStore::new(Arc::new(clock.clone())));
    Harness {
        services: Services::new(store, Arc::new(clock.clone())),
        clock,
    }
}

pub fn alice() -> Caller {
    Caller::user(Uuid::from_u128(0xA))
}

pub fn bob() -> Caller {
    Caller::user(Uuid::from_u128(0xB))
}

pub fn carol_admin() -> Caller {
    Caller::admin(Uuid::from_u128(0xC))
}

pub fn dave() -> Caller {
    Caller::user(Uuid::from_u128(0xD))
}

pub fn entry_input(project_id: Uuid, start: DateTime<Utc>) -> TimeEntryInput {
    TimeEntryInput {
        project_id,
        description: "work".to_string(),
        start_time: Some(start),
        end_time: None,
    }
}

impl Harness {
    pub async fn project(&self, name: &str, owner: &Caller) -> Project {
        self.services.projects.create(name, owner).await.unwrap()
    }

    pub async fn team(&self, name: &str, founder: &Caller) -> Team {
        self.services
            .teams
            .create(TeamNames::new(name), founder)
            .await
            .unwrap()
    }

    pub async fn entry(&self, project: &Project, owner: &Caller) -> TimeEntry {
        self.services
            .time_entries
            .create(entry_input(project.id, self.clock_now()), owner)
            .await
            .unwrap()
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        use timeasy_core::clock::Clock;
        self.clock.now()
    }
}
