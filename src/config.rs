//! Configuración desde variables de entorno (con `.env` si existe).

use std::env;

use crate::error::ErrorConfig;

pub const DATABASE_URL_POR_DEFECTO: &str = "sqlite://data/plan_comercial.db";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// JSON `{ "nombre": id }` que reemplaza la tabla de promotores.
    pub promotores_path: Option<String>,
    pub max_upload_bytes: usize,
    /// Admin a crear al arrancar si no existe.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: DATABASE_URL_POR_DEFECTO.to_string(),
            promotores_path: None,
            max_upload_bytes: 20 * 1024 * 1024,
            admin_email: None,
            admin_password: None,
        }
    }
}

impl Settings {
    pub fn desde_entorno() -> Result<Self, ErrorConfig> {
        let _ = dotenv::dotenv();
        Settings::desde(|clave| env::var(clave).ok())
    }

    /// Igual que `desde_entorno` pero con una fuente de variables arbitraria.
    pub fn desde<F>(leer: F) -> Result<Self, ErrorConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let leer = |clave: &str| leer(clave).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let base = Settings::default();

        let port = match leer("PORT") {
            Some(p) => p.parse().map_err(|_| ErrorConfig::Valor { variable: "PORT".into(), valor: p })?,
            None => base.port,
        };
        let max_upload_bytes = match leer("MAX_UPLOAD_MB") {
            Some(mb) => {
                let n: usize = mb
                    .parse()
                    .map_err(|_| ErrorConfig::Valor { variable: "MAX_UPLOAD_MB".into(), valor: mb.clone() })?;
                n * 1024 * 1024
            }
            None => base.max_upload_bytes,
        };

        Ok(Settings {
            host: leer("HOST").unwrap_or(base.host),
            port,
            database_url: leer("DATABASE_URL").unwrap_or(base.database_url),
            promotores_path: leer("PROMOTORES_PATH"),
            max_upload_bytes,
            admin_email: leer("ADMIN_EMAIL"),
            admin_password: leer("ADMIN_PASSWORD"),
        })
    }

    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
