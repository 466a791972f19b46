// src/adapter/http/middleware.rs

use axum::{
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;

/// Token de proyecto extraído del request, disponible vía extensions.
#[derive(Debug, Clone)]
pub struct ProjectToken(pub String);

/// Middleware de autenticación: acepta `Authorization: Bearer <token>` y el
/// header legado `X-Project-Token`. Sin token responde 401; la verificación
/// contra el proyecto destino ocurre en el caso de uso (403 si no coincide).
pub async fn require_project_token<B>(
    mut req: Request<B>,
    next: Next<B>,
) -> Result<Response, StatusCode> {
    let bearer = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    let token = bearer.or_else(|| {
        req.headers()
            .get("x-project-token")
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
    });

    match token {
        Some(token) if !token.trim().is_empty() => {
            req.extensions_mut().insert(ProjectToken(token));
            Ok(next.run(req).await)
        }
        _ => {
            warn!("request without project token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
