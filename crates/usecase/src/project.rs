//! Project use-case.

use std::sync::Arc;

use timeasy_core::access::ProjectAction;
use timeasy_core::error::{CoreError, CoreResult};
use timeasy_core::identity::Caller;
use timeasy_core::models::{NewProject, Project};
use timeasy_core::ports::ProjectRepository;
use timeasy_core::types::EntityId;
use timeasy_core::validation::require_name;

use crate::lookup::{authorize_attach, authorize_project, TeamLookup};

#[derive(Clone)]
pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    teams: Arc<dyn TeamLookup>,
}

impl ProjectService {
    pub fn new(projects: Arc<dyn ProjectRepository>, teams: Arc<dyn TeamLookup>) -> Self {
        Self { projects, teams }
    }

    async fn load(&self, id: EntityId) -> CoreResult<Project> {
        self.projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("project", id))
    }

    /// Load a live project and check `action` on it.
    async fn load_authorized(
        &self,
        id: EntityId,
        caller: &Caller,
        action: ProjectAction,
    ) -> CoreResult<Project> {
        let project = self.load(id).await?;
        authorize_project(self.teams.as_ref(), caller, &project, action).await?;
        Ok(project)
    }

    /// Create a project owned by the caller, not shared with any team.
    pub async fn create(&self, name: &str, caller: &Caller) -> CoreResult<Project> {
        let input = NewProject::new(name, caller.user_id);
        input.validate()?;
        let project = self.projects.insert(&input).await?;
        tracing::info!(project_id = %project.id, user_id = %caller.user_id, "Project created");
        Ok(project)
    }

    pub async fn read(&self, id: EntityId, caller: &Caller) -> CoreResult<Project> {
        self.load_authorized(id, caller, ProjectAction::Read).await
    }

    /// Projects the caller owns or sees through a team, by name. Global
    /// admins see every project.
    pub async fn list(&self, caller: &Caller) -> CoreResult<Vec<Project>> {
        if caller.is_global_admin() {
            self.projects.list_all().await
        } else {
            self.projects.list_visible_to(caller.user_id).await
        }
    }

    pub async fn update(&self, id: EntityId, name: &str, caller: &Caller) -> CoreResult<Project> {
        require_name("project name", name)?;
        self.load_authorized(id, caller, ProjectAction::Update).await?;
        let project = self.projects.update_name(id, name).await?;
        tracing::info!(project_id = %id, user_id = %caller.user_id, "Project updated");
        Ok(project)
    }

    /// Soft-delete the project together with its time entries.
    pub async fn delete(&self, id: EntityId, caller: &Caller) -> CoreResult<()> {
        self.load_authorized(id, caller, ProjectAction::Delete).await?;
        self.projects.soft_delete(id).await?;
        tracing::info!(project_id = %id, user_id = %caller.user_id, "Project deleted");
        Ok(())
    }

    /// Share the project with `team_id`, or move it there from its current
    /// team. The caller needs assign rights on the project and must be an
    /// admin of the target team.
    pub async fn assign_to_team(
        &self,
        project_id: EntityId,
        team_id: EntityId,
        caller: &Caller,
    ) -> CoreResult<Project> {
        self.load_authorized(project_id, caller, ProjectAction::AssignToTeam)
            .await?;
        authorize_attach(self.teams.as_ref(), caller, team_id).await?;
        let project = self.projects.set_team(project_id, Some(team_id)).await?;
        tracing::info!(
            project_id = %project_id,
            team_id = %team_id,
            user_id = %caller.user_id,
            "Project assigned to team"
        );
        Ok(project)
    }

    /// Detach the project from its team. Only the owner or a global admin
    /// may do this.
    pub async fn clear_team(&self, project_id: EntityId, caller: &Caller) -> CoreResult<Project> {
        self.load_authorized(project_id, caller, ProjectAction::ClearTeam)
            .await?;
        let project = self.projects.set_team(project_id, None).await?;
        tracing::info!(project_id = %project_id, user_id = %caller.user_id, "Project team cleared");
        Ok(project)
    }
}
