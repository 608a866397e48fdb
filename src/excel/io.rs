use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::debug;

/// Hoja de un libro como grilla de textos recortados.
#[derive(Debug, Clone, PartialEq)]
pub struct Hoja {
    pub nombre: String,
    pub filas: Vec<Vec<String>>,
}

impl Hoja {
    pub fn new<S: Into<String>>(nombre: S, filas: Vec<Vec<String>>) -> Self {
        Hoja { nombre: nombre.into(), filas }
    }
}

/// Texto de una celda tal como lo escribió quien llenó la planilla. Los
/// números enteros salen sin decimales (IDs de promotor, códigos de PDV que
/// Excel guardó como número) y las celdas vacías o con error quedan en "".
pub fn texto_de_celda(valor: &Data) -> String {
    match valor {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Int(n) => n.to_string(),
        Data::Float(x) if x.fract() == 0.0 && x.abs() < 1e15 => (*x as i64).to_string(),
        Data::Float(x) => x.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(fecha) => fecha.to_string(),
    }
}

/// Lee un libro completo (xlsx/xls/xlsb/ods) desde memoria, en el orden de
/// hojas que reporta la librería. Las hojas que no se pueden leer quedan vacías.
pub fn leer_libro(bytes: &[u8]) -> Result<Vec<Hoja>, calamine::Error> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let nombres = workbook.sheet_names().to_owned();

    let mut hojas = Vec::with_capacity(nombres.len());
    for nombre in nombres {
        let filas = match workbook.worksheet_range(&nombre) {
            Ok(range) => range
                .rows()
                .map(|r| r.iter().map(texto_de_celda).collect())
                .collect(),
            Err(e) => {
                debug!(hoja = %nombre, error = %e, "hoja ilegible, se toma como vacía");
                Vec::new()
            }
        };
        hojas.push(Hoja { nombre, filas });
    }
    Ok(hojas)
}

/// Devuelve el texto de la celda o "" si la fila es más corta.
pub fn celda(fila: &[String], idx: usize) -> &str {
    fila.get(idx).map(String::as_str).unwrap_or("")
}

pub fn fila_vacia(fila: &[String]) -> bool {
    fila.iter().all(|c| c.trim().is_empty())
}
