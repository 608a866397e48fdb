use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use super::autenticar_admin;
use crate::error::{AppError, AppResult};
use crate::server::AppState;

/// GET /stats/products
pub async fn stats_products_handler(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    autenticar_admin(&req, &state).await?;
    let almacen = state.almacen.clone();
    let total = web::block(move || {
        almacen
            .contar_productos()
            .map_err(|e| AppError::almacenamiento("Error obteniendo total de productos", e))
    })
    .await??;
    Ok(HttpResponse::Ok().json(json!({"totalProducts": total})))
}

/// GET /stats/flyers
pub async fn stats_flyers_handler(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    autenticar_admin(&req, &state).await?;
    let almacen = state.almacen.clone();
    let total = web::block(move || {
        almacen
            .flyers_generados()
            .map_err(|e| AppError::almacenamiento("Error obteniendo total de flyers", e))
    })
    .await??;
    Ok(HttpResponse::Ok().json(json!({"flyersGenerated": total})))
}

/// POST /stats/flyers/increment
pub async fn stats_flyers_increment_handler(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    autenticar_admin(&req, &state).await?;
    let almacen = state.almacen.clone();
    web::block(move || {
        almacen
            .incrementar_flyers()
            .map_err(|e| AppError::almacenamiento("Error incrementando total de flyers", e))
    })
    .await??;
    Ok(HttpResponse::Ok().json(json!({"success": true})))
}
