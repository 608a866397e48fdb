//! Ubicación de la fila de encabezados y mapeo de columnas a campos.

use std::collections::{HashMap, HashSet};

use crate::catalogos::{AliasEncabezados, Campo};
use crate::excel::normalizar::normalizar_clave;
use crate::perfil::EstrategiaEncabezado;

/// Devuelve el índice de la fila de encabezados o `None` si ninguna fila cumple.
pub fn find_header_row(
    filas: &[Vec<String>],
    estrategia: &EstrategiaEncabezado,
    alias: &AliasEncabezados,
) -> Option<usize> {
    filas.iter().position(|fila| match estrategia {
        EstrategiaEncabezado::ClaveUnica(campo) => {
            fila.iter().any(|c| alias.coincide(*campo, &normalizar_clave(c)))
        }
        EstrategiaEncabezado::TodosLosGrupos(grupos) => {
            let claves: HashSet<String> = fila.iter().map(|c| normalizar_clave(c)).collect();
            grupos
                .iter()
                .all(|g| claves.iter().any(|k| alias.coincide(*g, k)))
        }
        EstrategiaEncabezado::Generica { min_celdas } => {
            fila.iter().filter(|c| !c.trim().is_empty()).count() >= *min_celdas
        }
    })
}

/// Asocia cada campo a una columna libre cuyo encabezado normalizado sea uno
/// de sus alias. Manda el orden de los alias: "id promotor" gana sobre
/// "promotor" aunque esté más a la derecha; a igual alias, la columna más a la
/// izquierda. Una columna se asigna a un solo campo y los campos se resuelven
/// en el orden recibido.
pub fn mapear_columnas(
    encabezado: &[String],
    campos: &[Campo],
    alias: &AliasEncabezados,
) -> HashMap<Campo, usize> {
    let claves: Vec<String> = encabezado.iter().map(|h| normalizar_clave(h)).collect();
    let mut columnas: HashMap<Campo, usize> = HashMap::new();
    let mut usadas: HashSet<usize> = HashSet::new();

    for campo in campos {
        let encontrada = alias
            .alias(*campo)
            .iter()
            .find_map(|a| (0..claves.len()).find(|i| !usadas.contains(i) && claves[*i] == *a));
        if let Some(i) = encontrada {
            columnas.insert(*campo, i);
            usadas.insert(i);
        }
    }
    columnas
}
