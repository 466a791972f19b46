// src/usecase/mod.rs

pub mod ingest_pulse;
pub mod register_config;
pub mod status_snapshot;
pub mod toggle_maintenance;

use crate::domain::error::SentinelError;
use crate::domain::model::Project;
use crate::repository::store::Store;

/// Resolución y autenticación de proyecto, compartida por los casos de uso.
///
/// Con `project_id` explícito el token almacenado debe coincidir (forbidden
/// si no); sin él, se busca el proyecto único dueño del token (unauthorized
/// si no existe).
pub(crate) async fn authorize_project(
    store: &dyn Store,
    token: &str,
    project_id: Option<&str>,
) -> Result<Project, SentinelError> {
    if token.is_empty() {
        return Err(SentinelError::Unauthorized);
    }
    match project_id {
        Some(id) => {
            let project = store
                .get_project(id)
                .await?
                .ok_or_else(|| SentinelError::NotFound(format!("project '{}'", id)))?;
            if project.token != token {
                return Err(SentinelError::Forbidden(id.to_string()));
            }
            Ok(project)
        }
        None => store
            .find_project_by_token(token)
            .await?
            .ok_or(SentinelError::Unauthorized),
    }
}
