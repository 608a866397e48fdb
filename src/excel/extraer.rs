//! Extracción de registros normalizados a partir de una hoja y su fila de encabezados.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::catalogos::{Campo, Catalogos};
use crate::excel::encabezados::mapear_columnas;
use crate::excel::io::{celda, fila_vacia, Hoja};
use crate::excel::normalizar::{limpiar, normalizar_clave, normalize_days, Dia};
use crate::models::{Dataset, Datos, Promotor, Registro};
use crate::perfil::Perfil;

/// Recorre las filas posteriores al encabezado y arma los registros.
///
/// Se descartan en silencio las filas vacías, las que no traen algún campo
/// requerido y las que no resuelven ningún día. En Matinal una fila produce un
/// registro por cada columna de acción marcada con "X" y ninguno si no hay marcas.
pub fn extraer_filas(
    hoja: &Hoja,
    fila_encabezado: usize,
    perfil: &Perfil,
    catalogos: &Catalogos,
    mes: &str,
) -> Vec<Registro> {
    let Some(encabezado) = hoja.filas.get(fila_encabezado) else {
        return Vec::new();
    };
    let columnas = mapear_columnas(encabezado, &perfil.campos, &catalogos.encabezados);
    let acciones = if perfil.marcas {
        columnas_de_accion(encabezado, &columnas, perfil, catalogos)
    } else {
        Vec::new()
    };
    let claves_plan = if perfil.dataset == Dataset::PlanComercial {
        claves_unicas(encabezado)
    } else {
        Vec::new()
    };

    let mut registros = Vec::new();
    for fila in hoja.filas.iter().skip(fila_encabezado + 1) {
        if fila_vacia(fila) {
            continue;
        }
        let valor = |campo: Campo| columnas.get(&campo).and_then(|&i| limpiar(celda(fila, i)));

        if perfil.requeridos.iter().any(|c| valor(*c).is_none()) {
            continue;
        }
        let dias = match columnas.get(&perfil.campo_dias) {
            Some(&i) => normalize_days(celda(fila, i), &catalogos.dias),
            None if perfil.todos_los_dias_sin_columna => Dia::TODOS.to_vec(),
            None => Vec::new(),
        };
        if dias.is_empty() {
            continue;
        }

        let base = |promotor: Promotor, datos: Datos| Registro {
            id: None,
            sheet_name: hoja.nombre.clone(),
            uploaded_month: mes.to_string(),
            promotor,
            dias: dias.clone(),
            datos,
        };

        match perfil.dataset {
            Dataset::Cnc => {
                let (Some(codigo), Some(cliente), Some(nombre)) =
                    (valor(Campo::Codigo), valor(Campo::Cliente), valor(Campo::Promotor))
                else {
                    continue;
                };
                registros.push(base(
                    Promotor::Nombre { promotor_nombre: nombre },
                    Datos::Cnc {
                        codigo,
                        cliente,
                        canal: valor(Campo::Canal),
                        subregion: valor(Campo::Subregion),
                        distribuidor: valor(Campo::Distribuidor),
                    },
                ));
            }
            Dataset::PlanComercial => {
                let nombre = valor(Campo::Promotor).unwrap_or_else(|| hoja.nombre.trim().to_string());
                let mut row_json = Map::new();
                for (i, clave) in &claves_plan {
                    let v = limpiar(celda(fila, *i)).map(Value::String).unwrap_or(Value::Null);
                    row_json.insert(clave.clone(), v);
                }
                registros.push(base(Promotor::Nombre { promotor_nombre: nombre }, Datos::PlanComercial { row_json }));
            }
            Dataset::Matinal => {
                let (Some(id), Some(codigo_pdv), Some(frecuencia_raw)) =
                    (valor(Campo::PromotorId), valor(Campo::CodigoPdv), valor(Campo::Frecuencia))
                else {
                    continue;
                };
                let Ok(promotor_id) = id.parse::<i64>() else {
                    continue;
                };
                let razon_social = valor(Campo::RazonSocial);
                for (i, accion) in &acciones {
                    if !celda(fila, *i).trim().eq_ignore_ascii_case("x") {
                        continue;
                    }
                    registros.push(base(
                        Promotor::Id { promotor_id },
                        Datos::Matinal {
                            codigo_pdv: codigo_pdv.clone(),
                            razon_social: razon_social.clone(),
                            frecuencia_raw: frecuencia_raw.clone(),
                            accion: accion.clone(),
                        },
                    ));
                }
            }
        }
    }
    registros
}

// Columnas con encabezado no vacío que no quedaron asignadas a un campo ni
// llevan el nombre de uno de los campos del perfil.
fn columnas_de_accion(
    encabezado: &[String],
    columnas: &HashMap<Campo, usize>,
    perfil: &Perfil,
    catalogos: &Catalogos,
) -> Vec<(usize, String)> {
    let usadas: HashSet<usize> = columnas.values().copied().collect();
    let es_campo = |h: &str| {
        let clave = normalizar_clave(h);
        perfil.campos.iter().any(|c| catalogos.encabezados.coincide(*c, &clave))
    };
    encabezado
        .iter()
        .enumerate()
        .filter(|(i, h)| !usadas.contains(i) && !es_campo(h))
        .filter_map(|(i, h)| limpiar(h).map(|n| (i, n)))
        .collect()
}

// Encabezados repetidos reciben sufijo " (2)", " (3)"... saltando los que ya
// existan como encabezado literal.
fn claves_unicas(encabezado: &[String]) -> Vec<(usize, String)> {
    let mut tomadas: HashSet<String> = HashSet::new();
    let mut claves = Vec::new();
    for (i, h) in encabezado.iter().enumerate() {
        let Some(base) = limpiar(h) else { continue };
        let mut clave = base.clone();
        let mut n = 1;
        while tomadas.contains(&clave) {
            n += 1;
            clave = format!("{} ({})", base, n);
        }
        tomadas.insert(clave.clone());
        claves.push((i, clave));
    }
    claves
}
