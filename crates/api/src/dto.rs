//! JSON request and response bodies.
//!
//! Field names are camelCase and every instant travels as whole seconds
//! since the UNIX epoch (`*UTCUnix`), with `0` standing for "unset".
//! Incoming stamps are bounded to `0..=253402300799` (9999-12-31T23:59:59Z)
//! and rejected with `INCOMPLETE` outside it.

use serde::{Deserialize, Serialize};
use timeasy_core::error::CoreError;
use timeasy_core::models::{Membership, Project, Team, TeamNames, TimeEntry, TimeEntryInput};
use timeasy_core::roles::RoleSet;
use timeasy_core::sync::{Change, ChangeType, ProjectUpsert, SyncBatch, TimeEntryUpsert};
use timeasy_core::types::{optional_from_unix, optional_to_unix, to_unix, EntityId};
use validator::Validate;

/// Nil ids on the wire mean "no team".
fn team_ref(id: Option<EntityId>) -> Option<EntityId> {
    id.filter(|id| !id.is_nil())
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(length(max = 255))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeamInput {
    #[validate(length(max = 255))]
    pub name1: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub name2: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub name3: String,
}

impl From<TeamInput> for TeamNames {
    fn from(input: TeamInput) -> Self {
        TeamNames {
            name1: input.name1,
            name2: input.name2,
            name3: input.name3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddMemberInput {
    pub id: EntityId,
    /// Defaults to `USER` when absent or empty.
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RolesInput {
    pub roles: Vec<String>,
}

/// Role names from a client are parsed strictly; an unknown name is `INCOMPLETE`.
pub fn parse_roles(names: &[String]) -> Result<RoleSet, CoreError> {
    RoleSet::parse_strict(names)
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTeamAssignmentInput {
    pub project_id: EntityId,
    pub team_id: EntityId,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TimeEntryInputDto {
    #[serde(default)]
    #[validate(length(max = 4000))]
    pub description: String,
    #[serde(rename = "startTimeUTCUnix", default)]
    #[validate(range(min = 0_i64, max = 253402300799_i64))]
    pub start_time_utc_unix: i64,
    #[serde(rename = "endTimeUTCUnix", default)]
    #[validate(range(min = 0_i64, max = 253402300799_i64))]
    pub end_time_utc_unix: i64,
    #[serde(rename = "projectId")]
    pub project_id: EntityId,
}

impl From<TimeEntryInputDto> for TimeEntryInput {
    fn from(dto: TimeEntryInputDto) -> Self {
        TimeEntryInput {
            project_id: dto.project_id,
            description: dto.description,
            start_time: optional_from_unix(dto.start_time_utc_unix),
            end_time: optional_from_unix(dto.end_time_utc_unix),
        }
    }
}

/// `GET /timeentries` filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryQuery {
    pub project_id: Option<EntityId>,
    pub user_id: Option<EntityId>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    pub id: EntityId,
    pub name: String,
    pub owner_user_id: EntityId,
    pub team_id: Option<EntityId>,
}

impl From<Project> for ProjectDto {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            owner_user_id: project.owner_user_id,
            team_id: project.team_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamDto {
    pub id: EntityId,
    pub name1: String,
    pub name2: String,
    pub name3: String,
}

impl From<Team> for TeamDto {
    fn from(team: Team) -> Self {
        Self {
            id: team.id,
            name1: team.name1,
            name2: team.name2,
            name3: team.name3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipDto {
    pub user_id: EntityId,
    pub team_id: EntityId,
    pub roles: RoleSet,
}

impl From<Membership> for MembershipDto {
    fn from(membership: Membership) -> Self {
        Self {
            user_id: membership.user_id,
            team_id: membership.team_id,
            roles: membership.roles,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeEntryDto {
    pub id: EntityId,
    #[serde(rename = "ownerUserId")]
    pub owner_user_id: EntityId,
    #[serde(rename = "projectId")]
    pub project_id: EntityId,
    pub description: String,
    #[serde(rename = "startTimeUTCUnix")]
    pub start_time_utc_unix: i64,
    #[serde(rename = "endTimeUTCUnix")]
    pub end_time_utc_unix: i64,
}

impl From<TimeEntry> for TimeEntryDto {
    fn from(entry: TimeEntry) -> Self {
        Self {
            id: entry.id,
            owner_user_id: entry.owner_user_id,
            project_id: entry.project_id,
            description: entry.description,
            start_time_utc_unix: to_unix(entry.start_time),
            end_time_utc_unix: optional_to_unix(entry.end_time),
        }
    }
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangedProjectDto {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "teamId", default)]
    pub team_id: Option<EntityId>,
    #[serde(rename = "changeType")]
    pub change_type: ChangeType,
    /// Informational; the server stamps changes itself.
    #[serde(rename = "changeTimestampUTCUnix", default)]
    pub change_timestamp_utc_unix: i64,
}

impl From<Change<Project>> for ChangedProjectDto {
    fn from(change: Change<Project>) -> Self {
        Self {
            id: change.item.id,
            name: change.item.name,
            team_id: change.item.team_id,
            change_type: change.change_type,
            change_timestamp_utc_unix: to_unix(change.change_timestamp),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangedTimeEntryDto {
    pub id: EntityId,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "startTimeUTCUnix", default)]
    #[validate(range(min = 0_i64, max = 253402300799_i64))]
    pub start_time_utc_unix: i64,
    #[serde(rename = "endTimeUTCUnix", default)]
    #[validate(range(min = 0_i64, max = 253402300799_i64))]
    pub end_time_utc_unix: i64,
    #[serde(rename = "projectId")]
    pub project_id: EntityId,
    #[serde(rename = "changeType")]
    pub change_type: ChangeType,
    #[serde(rename = "changeTimestampUTCUnix", default)]
    pub change_timestamp_utc_unix: i64,
}

impl From<Change<TimeEntry>> for ChangedTimeEntryDto {
    fn from(change: Change<TimeEntry>) -> Self {
        Self {
            id: change.item.id,
            description: change.item.description,
            start_time_utc_unix: to_unix(change.item.start_time),
            end_time_utc_unix: optional_to_unix(change.item.end_time),
            project_id: change.item.project_id,
            change_type: change.change_type,
            change_timestamp_utc_unix: to_unix(change.change_timestamp),
        }
    }
}

/// Body of the sync endpoints in both directions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SyncEntries {
    #[serde(default)]
    pub projects: Vec<ChangedProjectDto>,
    #[serde(default)]
    #[validate(nested)]
    pub time_entries: Vec<ChangedTimeEntryDto>,
}

impl From<SyncEntries> for SyncBatch {
    /// `NEW` and `CHANGED` rows become upserts, `DELETED` rows deletions.
    fn from(entries: SyncEntries) -> Self {
        let mut batch = SyncBatch::default();

        for project in entries.projects {
            match project.change_type {
                ChangeType::Deleted => batch.projects_to_delete.push(project.id),
                ChangeType::New | ChangeType::Changed => {
                    batch.projects_to_upsert.push(ProjectUpsert {
                        id: project.id,
                        name: project.name,
                        team_id: team_ref(project.team_id),
                    })
                }
            }
        }

        for entry in entries.time_entries {
            match entry.change_type {
                ChangeType::Deleted => batch.entries_to_delete.push(entry.id),
                ChangeType::New | ChangeType::Changed => {
                    batch.entries_to_upsert.push(TimeEntryUpsert {
                        id: entry.id,
                        project_id: entry.project_id,
                        description: entry.description,
                        start_time: optional_from_unix(entry.start_time_utc_unix),
                        end_time: optional_from_unix(entry.end_time_utc_unix),
                    })
                }
            }
        }

        batch
    }
}
