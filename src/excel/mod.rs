//! Módulo `excel` dividido en submódulos.
//!
//! Submódulos:
//! - `io`: lectura del libro a grillas de texto
//! - `normalizar`: claves de encabezado, nombres y días
//! - `encabezados`: ubicación de la fila de encabezados y mapeo de columnas
//! - `extraer`: filas a registros normalizados

/// Helpers de IO para lectura de libros
pub mod io;

/// Normalización de textos y días: `normalize_days`, `normalizar_clave`
pub mod normalizar;

/// Localizador de encabezados: `find_header_row`
pub mod encabezados;

/// Extractor de filas: `extraer_filas`
pub mod extraer;

pub use encabezados::{find_header_row, mapear_columnas};
pub use extraer::extraer_filas;
pub use io::{leer_libro, Hoja};
pub use normalizar::{normalize_days, normalizar_clave, Dia};
