//! Lectura de los registros del mes filtrados por día y por el alcance del usuario.

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::catalogos::Catalogos;
use crate::db::Almacen;
use crate::error::{AppError, AppResult};
use crate::excel::normalizar::{normalizar_nombre, quitar_acentos, Dia};
use crate::ingesta::mes_de_carga;
use crate::models::{Dataset, Datos, Registro, Usuario};

pub fn dia_actual(ahora: NaiveDateTime) -> Dia {
    Dia::desde_weekday(ahora.weekday())
}

/// Fecha `YYYY-MM-DD`, clave de las marcas de venta.
pub fn fecha_actual(ahora: NaiveDateTime) -> String {
    ahora.format("%Y-%m-%d").to_string()
}

/// Qué registros puede ver quien consulta.
#[derive(Debug, Clone, PartialEq)]
pub enum Alcance {
    Todo,
    PromotorNombre(String),
    PromotorId(i64),
}

impl Alcance {
    pub fn incluye(&self, registro: &Registro) -> bool {
        match self {
            Alcance::Todo => true,
            Alcance::PromotorNombre(nombre) => registro
                .promotor_nombre()
                .is_some_and(|p| normalizar_nombre(p) == normalizar_nombre(nombre)),
            Alcance::PromotorId(id) => registro.promotor_id() == Some(*id),
        }
    }
}

/// Resuelve el alcance. Un admin ve todo (en Matinal puede acotar a un
/// `promotor_id`); el resto necesita nombre de promotor y, para Matinal, que
/// ese nombre tenga ID en la tabla de promotores.
pub fn alcance_para(
    usuario: &Usuario,
    dataset: Dataset,
    catalogos: &Catalogos,
    promotor_id_admin: Option<i64>,
) -> AppResult<Alcance> {
    if usuario.es_admin() {
        return Ok(match (dataset, promotor_id_admin) {
            (Dataset::Matinal, Some(id)) => Alcance::PromotorId(id),
            _ => Alcance::Todo,
        });
    }

    let nombre = usuario
        .promotor_nombre
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Permiso("El usuario no tiene un promotor asociado".to_string()))?;

    match dataset {
        Dataset::Matinal => catalogos
            .promotores
            .id_de(nombre)
            .map(Alcance::PromotorId)
            .ok_or_else(|| AppError::Permiso(format!("No se encontró el ID del promotor {}", nombre))),
        _ => Ok(Alcance::PromotorNombre(nombre.to_string())),
    }
}

/// Deja los registros del alcance que están activos en `dia`, sin cambiar el orden.
pub fn filtrar(registros: Vec<Registro>, alcance: &Alcance, dia: Dia) -> Vec<Registro> {
    registros
        .into_iter()
        .filter(|r| alcance.incluye(r) && r.activo_en(dia))
        .collect()
}

/// Resultado de una consulta del día.
#[derive(Debug, Clone)]
pub struct Consulta {
    pub dia: Dia,
    pub registros: Vec<Registro>,
}

/// Registros del mes en curso visibles para `usuario` y activos hoy.
/// El permiso se resuelve antes de leer el almacén.
pub fn consultar_hoy(
    almacen: &dyn Almacen,
    catalogos: &Catalogos,
    ahora: NaiveDateTime,
    usuario: &Usuario,
    dataset: Dataset,
    hoja: Option<&str>,
    promotor_id_admin: Option<i64>,
) -> AppResult<Consulta> {
    let alcance = alcance_para(usuario, dataset, catalogos, promotor_id_admin)?;
    let dia = dia_actual(ahora);
    let mes = mes_de_carga(ahora);
    let todos = almacen
        .registros_del_mes(dataset, &mes, hoja)
        .map_err(|e| AppError::almacenamiento("Error obteniendo los registros", e))?;
    let total_mes = todos.len();
    let registros = filtrar(todos, &alcance, dia);
    debug!(dataset = dataset.nombre(), mes = %mes, dia = %dia, total_mes, visibles = registros.len(), "consulta");
    Ok(Consulta { dia, registros })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClienteAccion {
    pub codigo_pdv: String,
    pub razon_social: Option<String>,
    pub frecuencia_raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrupoAccion {
    pub name: String,
    pub clients: Vec<ClienteAccion>,
}

fn clave_orden(nombre: &str) -> String {
    quitar_acentos(nombre).to_lowercase()
}

/// Agrupa registros Matinal por acción, ordenando los grupos por nombre sin
/// distinguir acentos ni mayúsculas. Dentro de cada grupo se conserva el orden.
pub fn agrupar_por_accion(registros: Vec<Registro>) -> Vec<GrupoAccion> {
    let mut grupos: Vec<GrupoAccion> = Vec::new();
    for r in registros {
        let Datos::Matinal { codigo_pdv, razon_social, frecuencia_raw, accion } = r.datos else {
            continue;
        };
        let cliente = ClienteAccion { codigo_pdv, razon_social, frecuencia_raw };
        match grupos.iter_mut().find(|g| g.name == accion) {
            Some(grupo) => grupo.clients.push(cliente),
            None => grupos.push(GrupoAccion { name: accion, clients: vec![cliente] }),
        }
    }
    grupos.sort_by(|a, b| clave_orden(&a.name).cmp(&clave_orden(&b.name)).then_with(|| a.name.cmp(&b.name)));
    grupos
}
