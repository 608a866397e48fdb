use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use super::{autenticar, cargar_dataset, consultar, parametro};
use crate::error::{AppError, AppResult};
use crate::ingesta::mes_de_carga;
use crate::models::Dataset;
use crate::server::AppState;

/// POST /plan-comercial/upload (admin, multipart `file`)
pub async fn plan_upload_handler(
    req: HttpRequest,
    payload: Multipart,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    cargar_dataset(req, payload, state, Dataset::PlanComercial).await
}

/// GET /plan-comercial/sheets: hojas cargadas en el mes en curso.
pub async fn plan_sheets_handler(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    autenticar(&req, &state).await?;
    let st = state.clone();
    let hojas = web::block(move || {
        let mes = mes_de_carga(st.reloj.ahora());
        st.almacen
            .hojas_del_mes(Dataset::PlanComercial, &mes)
            .map_err(|e| AppError::almacenamiento("Error obteniendo las hojas", e))
    })
    .await??;
    Ok(HttpResponse::Ok().json(json!({"sheets": hojas})))
}

/// GET /plan-comercial/data?sheet=...
pub async fn plan_data_handler(
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let usuario = autenticar(&req, &state).await?;
    let hoja = parametro(&query, "sheet")?;
    let consulta = consultar(&state, usuario, Dataset::PlanComercial, Some(hoja), None).await?;
    Ok(HttpResponse::Ok().json(json!({
        "dia": consulta.dia,
        "total": consulta.registros.len(),
        "rows": consulta.registros,
    })))
}
