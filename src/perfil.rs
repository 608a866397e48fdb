//! Perfiles de planilla: qué hojas se leen, cómo se ubica el encabezado y qué
//! campos son obligatorios. Un único pipeline de carga recibe el perfil.

use crate::catalogos::Campo;
use crate::models::Dataset;

/// Qué hojas del libro participan en la carga.
#[derive(Debug, Clone, PartialEq)]
pub enum SeleccionHojas {
    Todas,
    /// Hojas cuyo nombre empieza con el prefijo (sin distinguir mayúsculas).
    Prefijo(&'static str),
    /// Una sola hoja con ese nombre exacto (sin distinguir mayúsculas); si falta, la carga falla.
    Exacta(&'static str),
}

impl SeleccionHojas {
    pub fn acepta(&self, nombre: &str) -> bool {
        let nombre = nombre.trim().to_uppercase();
        match self {
            SeleccionHojas::Todas => true,
            SeleccionHojas::Prefijo(p) => nombre.starts_with(&p.to_uppercase()),
            SeleccionHojas::Exacta(n) => nombre == n.to_uppercase(),
        }
    }

    pub fn es_unica(&self) -> bool {
        matches!(self, SeleccionHojas::Exacta(_))
    }
}

/// Cómo se reconoce la fila de encabezados.
#[derive(Debug, Clone, PartialEq)]
pub enum EstrategiaEncabezado {
    /// Primera fila con una celda que sea alias del campo.
    ClaveUnica(Campo),
    /// Primera fila que contenga al menos un alias de cada grupo.
    TodosLosGrupos(Vec<Campo>),
    /// Primera fila con al menos `min_celdas` celdas no vacías.
    Generica { min_celdas: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Perfil {
    pub dataset: Dataset,
    pub hojas: SeleccionHojas,
    pub encabezado: EstrategiaEncabezado,
    /// Campos a ubicar en el encabezado, en orden de prioridad.
    pub campos: Vec<Campo>,
    pub requeridos: Vec<Campo>,
    /// Columna de la que salen los días.
    pub campo_dias: Campo,
    /// Si la hoja no trae columna de días, el registro vale para todos.
    pub todos_los_dias_sin_columna: bool,
    /// Abre un registro por cada columna marcada con "X".
    pub marcas: bool,
}

impl Perfil {
    pub fn cnc() -> Self {
        Perfil {
            dataset: Dataset::Cnc,
            hojas: SeleccionHojas::Prefijo("CNC"),
            encabezado: EstrategiaEncabezado::ClaveUnica(Campo::Codigo),
            campos: vec![
                Campo::Codigo,
                Campo::Cliente,
                Campo::Promotor,
                Campo::Dia,
                Campo::Canal,
                Campo::Subregion,
                Campo::Distribuidor,
            ],
            requeridos: vec![Campo::Codigo, Campo::Cliente, Campo::Promotor, Campo::Dia],
            campo_dias: Campo::Dia,
            todos_los_dias_sin_columna: false,
            marcas: false,
        }
    }

    pub fn plan_comercial() -> Self {
        Perfil {
            dataset: Dataset::PlanComercial,
            hojas: SeleccionHojas::Todas,
            encabezado: EstrategiaEncabezado::Generica { min_celdas: 2 },
            campos: vec![Campo::Promotor, Campo::Dia],
            requeridos: vec![],
            campo_dias: Campo::Dia,
            todos_los_dias_sin_columna: true,
            marcas: false,
        }
    }

    pub fn matinal() -> Self {
        let grupos = vec![Campo::PromotorId, Campo::Frecuencia, Campo::CodigoPdv, Campo::RazonSocial];
        Perfil {
            dataset: Dataset::Matinal,
            hojas: SeleccionHojas::Exacta("MATINAL"),
            encabezado: EstrategiaEncabezado::TodosLosGrupos(grupos.clone()),
            campos: grupos,
            requeridos: vec![Campo::PromotorId, Campo::CodigoPdv, Campo::Frecuencia],
            campo_dias: Campo::Frecuencia,
            todos_los_dias_sin_columna: false,
            marcas: true,
        }
    }

    pub fn para(dataset: Dataset) -> Self {
        match dataset {
            Dataset::Cnc => Perfil::cnc(),
            Dataset::PlanComercial => Perfil::plan_comercial(),
            Dataset::Matinal => Perfil::matinal(),
        }
    }
}
