use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use super::{autenticar, cargar_dataset, consultar, parametro};
use crate::error::AppResult;
use crate::models::Dataset;
use crate::server::AppState;

/// POST /cnc/upload (admin, multipart `file`)
pub async fn cnc_upload_handler(
    req: HttpRequest,
    payload: Multipart,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    cargar_dataset(req, payload, state, Dataset::Cnc).await
}

/// GET /cnc/data?sheet=...
pub async fn cnc_data_handler(
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let usuario = autenticar(&req, &state).await?;
    let hoja = parametro(&query, "sheet")?;
    let consulta = consultar(&state, usuario, Dataset::Cnc, Some(hoja), None).await?;
    Ok(HttpResponse::Ok().json(json!({
        "dia": consulta.dia,
        "total": consulta.registros.len(),
        "cnc": consulta.registros,
    })))
}
