use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::{autenticar, cargar_dataset, consultar};
use crate::consulta::{agrupar_por_accion, fecha_actual};
use crate::error::{AppError, AppResult};
use crate::models::{Dataset, EstadoVenta};
use crate::server::AppState;

/// POST /matinal/upload (admin, multipart `file`)
pub async fn matinal_upload_handler(
    req: HttpRequest,
    payload: Multipart,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    cargar_dataset(req, payload, state, Dataset::Matinal).await
}

/// GET /matinal/data?promotorId=...
///
/// Acciones del día agrupadas. `promotorId` sólo lo respeta un admin.
pub async fn matinal_data_handler(
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let usuario = autenticar(&req, &state).await?;
    let promotor_id = match query.get("promotorId").map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(v) => Some(
            v.parse::<i64>()
                .map_err(|_| AppError::Validacion(format!("promotorId inválido: {}", v)))?,
        ),
        None => None,
    };
    let consulta = consultar(&state, usuario, Dataset::Matinal, None, promotor_id).await?;
    let total = consulta.registros.len();
    Ok(HttpResponse::Ok().json(json!({
        "dia": consulta.dia,
        "total": total,
        "actions": agrupar_por_accion(consulta.registros),
    })))
}

/// GET /matinal/sales-status: marcas de venta del usuario para hoy.
pub async fn sales_status_handler(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let usuario = autenticar(&req, &state).await?;
    let st = state.clone();
    let (fecha, items) = web::block(move || {
        let fecha = fecha_actual(st.reloj.ahora());
        let items = st
            .almacen
            .estados_venta(&fecha, usuario.id)
            .map_err(|e| AppError::almacenamiento("Error obteniendo el estado de ventas", e))?;
        Ok::<_, AppError>((fecha, items))
    })
    .await??;
    Ok(HttpResponse::Ok().json(json!({"fecha": fecha, "items": items})))
}

#[derive(Deserialize)]
pub struct MarcaVenta {
    #[serde(default)]
    codigo_pdv: String,
    #[serde(default)]
    accion: String,
    sold: bool,
}

/// POST /matinal/sales-status `{codigo_pdv, accion, sold}`
pub async fn set_sales_status_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<MarcaVenta>,
) -> AppResult<HttpResponse> {
    let usuario = autenticar(&req, &state).await?;
    let marca = body.into_inner();
    let codigo_pdv = marca.codigo_pdv.trim().to_string();
    if codigo_pdv.is_empty() {
        return Err(AppError::Validacion("Falta codigo_pdv".to_string()));
    }
    let estado = EstadoVenta { codigo_pdv, accion: marca.accion.trim().to_string(), sold: marca.sold };
    let st = state.clone();
    web::block(move || {
        let fecha = fecha_actual(st.reloj.ahora());
        st.almacen
            .guardar_estado_venta(&fecha, usuario.id, &estado)
            .map_err(|e| AppError::almacenamiento("Error guardando el estado de venta", e))
    })
    .await??;
    Ok(HttpResponse::Ok().json(json!({"success": true})))
}
