//! Pipeline de carga: libro -> hojas seleccionadas -> encabezado -> registros ->
//! reemplazo del mes en el almacén.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalogos::Catalogos;
use crate::db::Almacen;
use crate::error::{AppError, AppResult};
use crate::excel::{extraer_filas, find_header_row, leer_libro, Hoja};
use crate::models::{Registro, Usuario};
use crate::perfil::{Perfil, SeleccionHojas};
use crate::reloj::Reloj;

/// Dependencias que la carga recibe desde afuera.
pub struct ContextoCarga<'a> {
    pub almacen: &'a dyn Almacen,
    pub catalogos: &'a Catalogos,
    pub reloj: &'a dyn Reloj,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultadoCarga {
    pub success: bool,
    pub uploaded_month: String,
    pub rows_inserted: usize,
}

/// Clave de mes `YYYY-MM` a partir de la hora de carga.
pub fn mes_de_carga(ahora: NaiveDateTime) -> String {
    ahora.format("%Y-%m").to_string()
}

/// Extrae los registros de todas las hojas que el perfil selecciona.
///
/// Las hojas sin encabezado reconocible se omiten, salvo cuando el perfil pide
/// una hoja única: ahí la carga falla. También falla si no queda ningún registro.
pub fn extraer_libro(hojas: &[Hoja], perfil: &Perfil, catalogos: &Catalogos, mes: &str) -> AppResult<Vec<Registro>> {
    let mut seleccionadas = hojas.iter().filter(|h| perfil.hojas.acepta(&h.nombre)).peekable();
    if seleccionadas.peek().is_none() {
        let mensaje = match &perfil.hojas {
            SeleccionHojas::Exacta(nombre) => format!("No se encontró la hoja {}", nombre),
            SeleccionHojas::Prefijo(prefijo) => format!("Ninguna hoja empieza con {}", prefijo),
            SeleccionHojas::Todas => "El archivo no tiene hojas".to_string(),
        };
        return Err(AppError::Validacion(mensaje));
    }
    let limite = if perfil.hojas.es_unica() { 1 } else { usize::MAX };

    let mut registros = Vec::new();
    for hoja in seleccionadas.take(limite) {
        match find_header_row(&hoja.filas, &perfil.encabezado, &catalogos.encabezados) {
            Some(idx) => {
                let extraidos = extraer_filas(hoja, idx, perfil, catalogos, mes);
                debug!(hoja = %hoja.nombre, fila_encabezado = idx, registros = extraidos.len(), "hoja procesada");
                registros.extend(extraidos);
            }
            None if perfil.hojas.es_unica() => {
                return Err(AppError::Validacion(format!(
                    "La hoja {} no tiene los encabezados esperados",
                    hoja.nombre
                )));
            }
            None => warn!(hoja = %hoja.nombre, "hoja sin encabezado reconocible, se omite"),
        }
    }

    if registros.is_empty() {
        return Err(AppError::Validacion(format!(
            "No se encontraron filas válidas para {}",
            perfil.dataset.nombre()
        )));
    }
    Ok(registros)
}

/// Carga un libro completo para el dataset del perfil y reemplaza el mes actual.
pub fn cargar_libro(
    bytes: &[u8],
    perfil: &Perfil,
    solicitante: &Usuario,
    ctx: &ContextoCarga<'_>,
) -> AppResult<ResultadoCarga> {
    if !solicitante.es_admin() {
        return Err(AppError::Permiso("Sólo un administrador puede cargar planillas".to_string()));
    }
    if bytes.is_empty() {
        return Err(AppError::Validacion("No se recibió ningún archivo".to_string()));
    }

    let hojas = leer_libro(bytes).map_err(|e| AppError::Validacion(format!("No se pudo leer el Excel: {}", e)))?;
    let mes = mes_de_carga(ctx.reloj.ahora());
    let registros = extraer_libro(&hojas, perfil, ctx.catalogos, &mes)?;

    let insertados = ctx
        .almacen
        .reemplazar_mes(perfil.dataset, &mes, &registros)
        .map_err(|e| AppError::almacenamiento("Error guardando los registros", e))?;

    info!(
        dataset = perfil.dataset.nombre(),
        mes = %mes,
        insertados,
        usuario = %solicitante.email,
        "carga completada"
    );
    Ok(ResultadoCarga { success: true, uploaded_month: mes, rows_inserted: insertados })
}
