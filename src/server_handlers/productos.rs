use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::info;

use super::{autenticar, autenticar_admin};
use crate::error::{AppError, AppResult};
use crate::models::DatosProducto;
use crate::server::AppState;

fn no_encontrado(id: i64) -> AppError {
    AppError::NoEncontrado(format!("Producto {} no encontrado", id))
}

/// GET /products
pub async fn products_list_handler(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    autenticar(&req, &state).await?;
    let almacen = state.almacen.clone();
    let productos = web::block(move || {
        almacen.productos().map_err(|e| AppError::almacenamiento("Error obteniendo productos", e))
    })
    .await??;
    Ok(HttpResponse::Ok().json(productos))
}

/// GET /products/{id}
pub async fn product_get_handler(
    req: HttpRequest,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    autenticar(&req, &state).await?;
    let id = path.into_inner();
    let almacen = state.almacen.clone();
    let producto = web::block(move || {
        almacen.producto(id).map_err(|e| AppError::almacenamiento("Error obteniendo el producto", e))
    })
    .await??
    .ok_or_else(|| no_encontrado(id))?;
    Ok(HttpResponse::Ok().json(producto))
}

/// POST /products (admin)
pub async fn product_create_handler(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<DatosProducto>,
) -> AppResult<HttpResponse> {
    autenticar_admin(&req, &state).await?;
    let nuevo = body.into_inner().en_producto_nuevo().map_err(AppError::Validacion)?;
    let almacen = state.almacen.clone();
    let creado = web::block(move || {
        almacen.crear_producto(&nuevo).map_err(|e| AppError::almacenamiento("Error creando el producto", e))
    })
    .await??;
    info!(id = creado.id, nombre = %creado.name, "producto creado");
    Ok(HttpResponse::Created().json(creado))
}

/// PUT /products/{id} (admin). Los campos ausentes conservan su valor.
pub async fn product_update_handler(
    req: HttpRequest,
    path: web::Path<i64>,
    state: web::Data<AppState>,
    body: web::Json<DatosProducto>,
) -> AppResult<HttpResponse> {
    autenticar_admin(&req, &state).await?;
    let id = path.into_inner();
    let cambios = body.into_inner();
    let almacen = state.almacen.clone();
    let actualizado = web::block(move || {
        let actual = almacen
            .producto(id)
            .map_err(|e| AppError::almacenamiento("Error obteniendo el producto", e))?
            .ok_or_else(|| no_encontrado(id))?;
        let producto = cambios.aplicar(actual);
        if producto.name.trim().is_empty() {
            return Err(AppError::Validacion("name no puede quedar vacío".to_string()));
        }
        let existe = almacen
            .actualizar_producto(&producto)
            .map_err(|e| AppError::almacenamiento("Error actualizando el producto", e))?;
        if existe { Ok(producto) } else { Err(no_encontrado(id)) }
    })
    .await??;
    Ok(HttpResponse::Ok().json(actualizado))
}

/// DELETE /products/{id} (admin)
pub async fn product_delete_handler(
    req: HttpRequest,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    autenticar_admin(&req, &state).await?;
    let id = path.into_inner();
    let almacen = state.almacen.clone();
    let borrado = web::block(move || {
        almacen.eliminar_producto(id).map_err(|e| AppError::almacenamiento("Error eliminando el producto", e))
    })
    .await??;
    if !borrado {
        return Err(no_encontrado(id));
    }
    info!(id, "producto eliminado");
    Ok(HttpResponse::Ok().json(json!({"success": true})))
}
