use std::fmt::{Display, Formatter};

use lattice_core::{IntegrationId, ProjectId, WorkflowId};

/// Read patterns supported by integration storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationQuery {
    /// One record by identity.
    ById(IntegrationId),
    /// One record by project key and record name.
    ByProjectKeyAndName {
        /// Unique textual project key.
        project_key: String,
        /// Record name within the project.
        name: String,
    },
    /// Every record of a project.
    ByProjectId(ProjectId),
    /// Every record linked to a workflow.
    ByWorkflowId(WorkflowId),
}

impl Display for IntegrationQuery {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ById(id) => write!(formatter, "integration '{id}'"),
            Self::ByProjectKeyAndName { project_key, name } => {
                write!(formatter, "integration '{name}' in project '{project_key}'")
            }
            Self::ByProjectId(project_id) => {
                write!(formatter, "integrations of project '{project_id}'")
            }
            Self::ByWorkflowId(workflow_id) => {
                write!(formatter, "integrations of workflow '{workflow_id}'")
            }
        }
    }
}
