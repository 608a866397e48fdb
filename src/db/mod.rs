//! Almacenamiento: SQLite (por defecto) o Postgres según el esquema de `DATABASE_URL`.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::models::{Dataset, EstadoVenta, NuevoUsuario, Producto, Registro, Usuario};

mod pg;
mod sqlite;

pub use self::pg::PostgresAlmacen;
pub use self::sqlite::SqliteAlmacen;

#[derive(Debug, Error)]
pub enum ErrorAlmacen {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("postgres: {0}")]
    Postgres(#[from] postgres::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("conexión bloqueada por un pánico previo")]
    Bloqueo,

    #[error("el hilo de base de datos terminó con pánico")]
    Hilo,

    #[error("esquema de DATABASE_URL no soportado: {0}")]
    Esquema(String),

    #[error("{0}")]
    Inconsistente(String),
}

/// Operaciones de persistencia que usan el pipeline de carga y los handlers.
/// Todas son bloqueantes; desde actix se llaman dentro de `web::block`.
pub trait Almacen: Send + Sync {
    /// Crea las tablas si no existen.
    fn inicializar(&self) -> Result<(), ErrorAlmacen>;

    /// Borra todos los registros del mes para el dataset e inserta los nuevos,
    /// en una sola transacción. Devuelve la cantidad insertada.
    fn reemplazar_mes(&self, dataset: Dataset, mes: &str, registros: &[Registro]) -> Result<usize, ErrorAlmacen>;

    /// Registros del mes en orden de inserción, opcionalmente de una sola hoja.
    fn registros_del_mes(&self, dataset: Dataset, mes: &str, hoja: Option<&str>) -> Result<Vec<Registro>, ErrorAlmacen>;

    /// Nombres de hoja presentes en el mes, en el orden en que se cargaron.
    fn hojas_del_mes(&self, dataset: Dataset, mes: &str) -> Result<Vec<String>, ErrorAlmacen>;

    fn usuario_por_id(&self, id: i64) -> Result<Option<Usuario>, ErrorAlmacen>;

    /// Usuario activo y su contraseña almacenada.
    fn credenciales(&self, email: &str) -> Result<Option<(Usuario, String)>, ErrorAlmacen>;

    fn crear_usuario(&self, nuevo: &NuevoUsuario) -> Result<Usuario, ErrorAlmacen>;

    fn estados_venta(&self, fecha: &str, usuario_id: i64) -> Result<Vec<EstadoVenta>, ErrorAlmacen>;

    /// Inserta o actualiza la marca para `(fecha, usuario, pdv, acción)`.
    fn guardar_estado_venta(&self, fecha: &str, usuario_id: i64, estado: &EstadoVenta) -> Result<(), ErrorAlmacen>;

    fn productos(&self) -> Result<Vec<Producto>, ErrorAlmacen>;
    fn producto(&self, id: i64) -> Result<Option<Producto>, ErrorAlmacen>;
    /// Ignora `producto.id` y devuelve el producto con el id asignado.
    fn crear_producto(&self, producto: &Producto) -> Result<Producto, ErrorAlmacen>;
    /// `false` si el id no existe.
    fn actualizar_producto(&self, producto: &Producto) -> Result<bool, ErrorAlmacen>;
    fn eliminar_producto(&self, id: i64) -> Result<bool, ErrorAlmacen>;
    fn contar_productos(&self) -> Result<i64, ErrorAlmacen>;

    fn flyers_generados(&self) -> Result<i64, ErrorAlmacen>;
    /// Suma uno al contador y devuelve el valor nuevo.
    fn incrementar_flyers(&self) -> Result<i64, ErrorAlmacen>;
}

pub(crate) const CONTADOR_FLYERS: &str = "flyers_generated";

/// Abre el almacén indicado por la URL: `sqlite://ruta`, `file://ruta`,
/// `postgres://...` o una ruta simple (SQLite).
pub fn abrir_almacen(database_url: &str) -> Result<Arc<dyn Almacen>, ErrorAlmacen> {
    let url = database_url.trim();
    let almacen: Arc<dyn Almacen> = if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        info!("usando Postgres");
        Arc::new(PostgresAlmacen::new(url))
    } else if let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("file://")) {
        info!(path, "usando SQLite");
        Arc::new(SqliteAlmacen::abrir(path)?)
    } else if url.contains("://") {
        return Err(ErrorAlmacen::Esquema(url.to_string()));
    } else {
        info!(path = url, "usando SQLite");
        Arc::new(SqliteAlmacen::abrir(url)?)
    };
    almacen.inicializar()?;
    Ok(almacen)
}

// Un registro sólo puede ir a la tabla de su propio dataset.
pub(crate) fn verificar_dataset(dataset: Dataset, registros: &[Registro]) -> Result<(), ErrorAlmacen> {
    match registros.iter().find(|r| r.datos.dataset() != dataset) {
        Some(r) => Err(ErrorAlmacen::Inconsistente(format!(
            "registro de {} en una carga de {}",
            r.datos.dataset().nombre(),
            dataset.nombre()
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn esquema_desconocido_falla() {
        assert!(matches!(abrir_almacen("mysql://localhost/db"), Err(ErrorAlmacen::Esquema(_))));
    }

    #[test]
    fn sqlite_en_archivo_crea_directorio() {
        let dir = std::env::temp_dir().join(format!("plan-comercial-{}", std::process::id()));
        let ruta = dir.join("sub").join("datos.db");
        let url = format!("sqlite://{}", ruta.display());
        let almacen = abrir_almacen(&url).unwrap();
        assert_eq!(almacen.contar_productos().unwrap(), 0);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
