use axum::{
    body::{Body, to_bytes},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::error;

use crate::error::AppError;

/// Token del portador extraído del encabezado Authorization; las rutas
/// protegidas lo reciben como extensión.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Exige un token Bearer no vacío y lo deja disponible para el handler. La
/// validez real de la sesión la juzga el proveedor de identidad en cada
/// operación.
pub async fn requerir_token(mut req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|valor| valor.to_str().ok())
        .and_then(|valor| valor.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match token {
        Some(token) => {
            let token = token.to_string();
            req.extensions_mut().insert(BearerToken(token));
            Ok(next.run(req).await)
        }
        None => Err(AppError::InvalidCredential(
            "Token no proporcionado".to_string(),
        )),
    }
}

/// Registra en el log el cuerpo de las respuestas 5xx antes de devolverlas.
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;

    if response.status().is_server_error() {
        let (mut parts, body) = response.into_parts();
        let bytes = match to_bytes(body, 1024).await {
            Ok(b) => b,
            Err(e) => {
                error!("no se pudo leer el cuerpo de la respuesta de error: {e}");
                return Response::from_parts(parts, Body::empty());
            }
        };
        error!(
            "error del servidor - status: {}, cuerpo: {}",
            parts.status,
            String::from_utf8_lossy(&bytes)
        );

        parts.headers.remove(axum::http::header::CONTENT_LENGTH);
        Response::from_parts(parts, Body::from(bytes))
    } else {
        response
    }
}
