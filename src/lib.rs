// Biblioteca raíz del crate `plan_comercial`.
// Ingesta de planillas (CNC, Plan Comercial, Matinal) y API HTTP que las consulta.
pub mod auth;
pub mod catalogos;
pub mod config;
pub mod consulta;
pub mod db;
pub mod error;
pub mod excel;
pub mod ingesta;
pub mod models;
pub mod perfil;
pub mod reloj;
pub mod server;
pub mod server_handlers;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::{configurar, run_server, AppState};
