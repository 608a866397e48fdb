// --- Plan Comercial - Archivo principal ---

use std::sync::Arc;

use plan_comercial::catalogos::Catalogos;
use plan_comercial::config::Settings;
use plan_comercial::db::{abrir_almacen, Almacen};
use plan_comercial::models::NuevoUsuario;
use plan_comercial::reloj::RelojSistema;
use plan_comercial::{run_server, AppState};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn io_error<E: std::fmt::Display>(e: E) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

// Crea el admin configurado si todavía no existe.
fn asegurar_admin(almacen: &dyn Almacen, settings: &Settings) -> std::io::Result<()> {
    let (Some(email), Some(password)) = (&settings.admin_email, &settings.admin_password) else {
        return Ok(());
    };
    if almacen.credenciales(email).map_err(io_error)?.is_some() {
        return Ok(());
    }
    let admin = almacen
        .crear_usuario(&NuevoUsuario {
            email: email.clone(),
            password: password.clone(),
            role: "admin".to_string(),
            promotor_nombre: None,
        })
        .map_err(io_error)?;
    info!(email = %admin.email, "usuario admin creado");
    Ok(())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::desde_entorno().map_err(io_error)?;

    let catalogos = match &settings.promotores_path {
        Some(path) => Catalogos::con_promotores_de_archivo(path).map_err(|e| {
            error!(path = %path, error = %e, "no se pudo leer la tabla de promotores");
            io_error(e)
        })?,
        None => {
            warn!("PROMOTORES_PATH no definido; Matinal sólo funcionará para admins");
            Catalogos::default()
        }
    };
    info!(promotores = catalogos.promotores.len(), "catálogos cargados");

    let almacen = abrir_almacen(&settings.database_url).map_err(io_error)?;
    asegurar_admin(almacen.as_ref(), &settings)?;

    let state = AppState {
        almacen,
        catalogos: Arc::new(catalogos),
        reloj: Arc::new(RelojSistema),
        max_upload_bytes: settings.max_upload_bytes,
    };
    run_server(&settings.bind(), state).await
}
