//! Autenticación con token simple `dummy-<id>-<millis>`.

use tracing::{info, warn};

use crate::db::Almacen;
use crate::error::{AppError, AppResult};
use crate::models::Usuario;

const PREFIJO_TOKEN: &str = "dummy-";

pub fn generar_token(usuario_id: i64, millis: i64) -> String {
    format!("{}{}-{}", PREFIJO_TOKEN, usuario_id, millis)
}

/// Devuelve el id de usuario contenido en el token, o `None` si no tiene el formato.
pub fn decodificar_token(token: &str) -> Option<i64> {
    let resto = token.trim().strip_prefix(PREFIJO_TOKEN)?;
    let (id, sello) = resto.split_once('-')?;
    if sello.is_empty() {
        return None;
    }
    id.parse().ok()
}

/// Extrae el token de un valor de cabecera `Authorization: Bearer <token>`.
pub fn token_de_cabecera(valor: &str) -> Option<&str> {
    let valor = valor.trim();
    let (esquema, token) = valor.split_once(' ')?;
    if !esquema.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Resuelve el usuario dueño del token.
pub fn usuario_de_token(almacen: &dyn Almacen, token: &str) -> AppResult<Usuario> {
    let id = decodificar_token(token).ok_or_else(|| AppError::NoAutenticado("Token inválido".to_string()))?;
    almacen
        .usuario_por_id(id)
        .map_err(|e| AppError::almacenamiento("Error validando el token", e))?
        .ok_or_else(|| AppError::NoAutenticado("Usuario no encontrado".to_string()))
}

/// Valida email y contraseña y emite un token nuevo.
pub fn login(almacen: &dyn Almacen, email: &str, password: &str, millis: i64) -> AppResult<(String, Usuario)> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validacion("Email y contraseña son obligatorios".to_string()));
    }
    let credenciales = almacen
        .credenciales(email)
        .map_err(|e| AppError::almacenamiento("Error consultando el usuario", e))?;
    match credenciales {
        Some((usuario, guardada)) if guardada == password => {
            info!(usuario = %usuario.email, "login correcto");
            Ok((generar_token(usuario.id, millis), usuario))
        }
        _ => {
            warn!(email = %email.trim(), "login rechazado");
            Err(AppError::NoAutenticado("Credenciales inválidas".to_string()))
        }
    }
}
