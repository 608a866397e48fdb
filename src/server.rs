use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, Responder};
use serde_json::json;
use tracing::info;

use crate::catalogos::Catalogos;
use crate::db::Almacen;
use crate::reloj::Reloj;
use crate::server_handlers::*;

/// Estado compartido por todos los handlers.
#[derive(Clone)]
pub struct AppState {
    pub almacen: Arc<dyn Almacen>,
    pub catalogos: Arc<Catalogos>,
    pub reloj: Arc<dyn Reloj>,
    pub max_upload_bytes: usize,
}

async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

/// Registra todas las rutas. Se usa tanto en `run_server` como en los tests.
pub fn configurar(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_handler))
        .service(
            web::scope("/auth")
                .route("/login", web::post().to(login_handler))
                .route("/me", web::get().to(me_handler)),
        )
        .service(
            web::scope("/cnc")
                .route("/upload", web::post().to(cnc_upload_handler))
                .route("/data", web::get().to(cnc_data_handler)),
        )
        .service(
            web::scope("/plan-comercial")
                .route("/upload", web::post().to(plan_upload_handler))
                .route("/sheets", web::get().to(plan_sheets_handler))
                .route("/data", web::get().to(plan_data_handler)),
        )
        .service(
            web::scope("/matinal")
                .route("/upload", web::post().to(matinal_upload_handler))
                .route("/data", web::get().to(matinal_data_handler))
                .route("/sales-status", web::get().to(sales_status_handler))
                .route("/sales-status", web::post().to(set_sales_status_handler)),
        )
        .service(
            web::scope("/products")
                .route("", web::get().to(products_list_handler))
                .route("", web::post().to(product_create_handler))
                .route("/{id}", web::get().to(product_get_handler))
                .route("/{id}", web::put().to(product_update_handler))
                .route("/{id}", web::delete().to(product_delete_handler)),
        )
        .service(
            web::scope("/stats")
                .route("/products", web::get().to(stats_products_handler))
                .route("/flyers", web::get().to(stats_flyers_handler))
                .route("/flyers/increment", web::post().to(stats_flyers_increment_handler)),
        );
}

/// Arranca el servidor HTTP con el estado ya construido.
pub async fn run_server(bind: &str, state: AppState) -> std::io::Result<()> {
    info!(bind, "iniciando servidor");
    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .configure(configurar)
    })
    .bind(bind)?
    .run()
    .await
}
