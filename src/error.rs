use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::db::ErrorAlmacen;

/// Errores visibles por el cliente HTTP.
#[derive(Debug, Error)]
pub enum AppError {
    /// Archivo ausente o ilegible, hojas sin coincidencias, cero filas, parámetro faltante.
    #[error("{0}")]
    Validacion(String),

    /// Token ausente o inválido.
    #[error("{0}")]
    NoAutenticado(String),

    /// Rol insuficiente o usuario sin identidad de promotor resoluble.
    #[error("{0}")]
    Permiso(String),

    #[error("{0}")]
    NoEncontrado(String),

    /// Falla del almacenamiento; `detalle` trae el error original.
    #[error("{mensaje}")]
    Almacenamiento { mensaje: String, detalle: String },

    #[error("{0}")]
    Interno(String),
}

impl AppError {
    pub fn almacenamiento(mensaje: &str, err: ErrorAlmacen) -> Self {
        AppError::Almacenamiento { mensaje: mensaje.to_string(), detalle: err.to_string() }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validacion(_) => StatusCode::BAD_REQUEST,
            AppError::NoAutenticado(_) => StatusCode::UNAUTHORIZED,
            AppError::Permiso(_) => StatusCode::FORBIDDEN,
            AppError::NoEncontrado(_) => StatusCode::NOT_FOUND,
            AppError::Almacenamiento { .. } | AppError::Interno(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Almacenamiento { mensaje, detalle } => json!({"error": mensaje, "detail": detalle}),
            otro => json!({"error": otro.to_string()}),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::Interno(format!("tarea bloqueante cancelada: {}", err))
    }
}

/// Errores al cargar la configuración o los catálogos.
#[derive(Debug, Error)]
pub enum ErrorConfig {
    #[error("no se pudo leer el archivo: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),

    #[error("valor inválido para {variable}: {valor}")]
    Valor { variable: String, valor: String },
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codigos_http_por_clase() {
        assert_eq!(AppError::Validacion("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NoAutenticado("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Permiso("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NoEncontrado("x".into()).status_code(), StatusCode::NOT_FOUND);
        let e = AppError::Almacenamiento { mensaje: "m".into(), detalle: "d".into() };
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
