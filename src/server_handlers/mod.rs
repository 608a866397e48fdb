pub mod auth;
pub mod cnc;
pub mod matinal;
pub mod plan_comercial;
pub mod productos;
pub mod stats;

pub use auth::*;
pub use cnc::*;
pub use matinal::*;
pub use plan_comercial::*;
pub use productos::*;
pub use stats::*;

use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::stream::StreamExt;
use tracing::warn;

use crate::auth::{token_de_cabecera, usuario_de_token};
use crate::consulta::{consultar_hoy, Consulta};
use crate::error::{AppError, AppResult};
use crate::ingesta::{cargar_libro, ContextoCarga};
use crate::models::{Dataset, Usuario};
use crate::perfil::Perfil;
use crate::server::AppState;

/// Resuelve el usuario a partir de `Authorization: Bearer <token>`.
pub(crate) async fn autenticar(req: &HttpRequest, state: &web::Data<AppState>) -> AppResult<Usuario> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(token_de_cabecera)
        .map(str::to_string)
        .ok_or_else(|| AppError::NoAutenticado("Falta el token de acceso".to_string()))?;
    let almacen = state.almacen.clone();
    web::block(move || usuario_de_token(almacen.as_ref(), &token)).await?
}

pub(crate) async fn autenticar_admin(req: &HttpRequest, state: &web::Data<AppState>) -> AppResult<Usuario> {
    let usuario = autenticar(req, state).await?;
    if !usuario.es_admin() {
        return Err(AppError::Permiso("Se requiere rol de administrador".to_string()));
    }
    Ok(usuario)
}

/// Lee el campo `file` del multipart completo en memoria, con tope de tamaño.
pub(crate) async fn leer_archivo(mut payload: Multipart, limite: usize) -> AppResult<Vec<u8>> {
    while let Some(campo) = payload.next().await {
        let mut campo = campo.map_err(|e| AppError::Validacion(format!("Multipart inválido: {}", e)))?;
        if campo.content_disposition().get_name() != Some("file") {
            continue;
        }
        let mut bytes = Vec::new();
        while let Some(chunk) = campo.next().await {
            let chunk = chunk.map_err(|e| AppError::Validacion(format!("Error leyendo el archivo: {}", e)))?;
            if bytes.len() + chunk.len() > limite {
                warn!(limite, "archivo rechazado por tamaño");
                return Err(AppError::Validacion(format!(
                    "El archivo supera el máximo de {} MB",
                    limite / (1024 * 1024)
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(bytes);
    }
    Err(AppError::Validacion("No se recibió ningún archivo (campo 'file')".to_string()))
}

/// Flujo común de los tres endpoints de carga.
pub(crate) async fn cargar_dataset(
    req: HttpRequest,
    payload: Multipart,
    state: web::Data<AppState>,
    dataset: Dataset,
) -> AppResult<HttpResponse> {
    let usuario = autenticar_admin(&req, &state).await?;
    let bytes = leer_archivo(payload, state.max_upload_bytes).await?;
    let st = state.clone();
    let resultado = web::block(move || {
        let ctx = ContextoCarga { almacen: st.almacen.as_ref(), catalogos: &st.catalogos, reloj: st.reloj.as_ref() };
        cargar_libro(&bytes, &Perfil::para(dataset), &usuario, &ctx)
    })
    .await??;
    Ok(HttpResponse::Ok().json(resultado))
}

/// Consulta del día para el usuario autenticado.
pub(crate) async fn consultar(
    state: &web::Data<AppState>,
    usuario: Usuario,
    dataset: Dataset,
    hoja: Option<String>,
    promotor_id_admin: Option<i64>,
) -> AppResult<Consulta> {
    let st = state.clone();
    web::block(move || {
        consultar_hoy(
            st.almacen.as_ref(),
            &st.catalogos,
            st.reloj.ahora(),
            &usuario,
            dataset,
            hoja.as_deref(),
            promotor_id_admin,
        )
    })
    .await?
}

/// Parámetro de query obligatorio y no vacío.
pub(crate) fn parametro(query: &HashMap<String, String>, nombre: &str) -> AppResult<String> {
    query
        .get(nombre)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validacion(format!("Falta el parámetro {}", nombre)))
}
