// Estructuras de datos principales

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::excel::normalizar::Dia;

/// Tipo de planilla cargada; cada uno se guarda en su propia tabla.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Cnc,
    PlanComercial,
    Matinal,
}

impl Dataset {
    pub fn tabla(&self) -> &'static str {
        match self {
            Dataset::Cnc => "cnc_registros",
            Dataset::PlanComercial => "plan_comercial_registros",
            Dataset::Matinal => "matinal_registros",
        }
    }

    pub fn nombre(&self) -> &'static str {
        match self {
            Dataset::Cnc => "CNC",
            Dataset::PlanComercial => "Plan Comercial",
            Dataset::Matinal => "Matinal",
        }
    }
}

/// Identidad del promotor dueño del registro.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Promotor {
    Nombre { promotor_nombre: String },
    Id { promotor_id: i64 },
}

/// Campos propios de cada tipo de planilla.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Datos {
    Cnc {
        codigo: String,
        cliente: String,
        canal: Option<String>,
        subregion: Option<String>,
        distribuidor: Option<String>,
    },
    /// Fila completa, encabezado original -> valor, en el orden de la planilla.
    PlanComercial { row_json: Map<String, Value> },
    Matinal {
        codigo_pdv: String,
        razon_social: Option<String>,
        frecuencia_raw: String,
        accion: String,
    },
}

impl Datos {
    pub fn dataset(&self) -> Dataset {
        match self {
            Datos::Cnc { .. } => Dataset::Cnc,
            Datos::PlanComercial { .. } => Dataset::PlanComercial,
            Datos::Matinal { .. } => Dataset::Matinal,
        }
    }
}

/// Registro normalizado de una carga.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registro {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub sheet_name: String,
    pub uploaded_month: String,
    #[serde(flatten)]
    pub promotor: Promotor,
    /// Nunca vacío en un registro extraído.
    pub dias: Vec<Dia>,
    #[serde(flatten)]
    pub datos: Datos,
}

impl Registro {
    pub fn promotor_nombre(&self) -> Option<&str> {
        match &self.promotor {
            Promotor::Nombre { promotor_nombre } => Some(promotor_nombre),
            Promotor::Id { .. } => None,
        }
    }

    pub fn promotor_id(&self) -> Option<i64> {
        match self.promotor {
            Promotor::Id { promotor_id } => Some(promotor_id),
            Promotor::Nombre { .. } => None,
        }
    }

    pub fn accion(&self) -> Option<&str> {
        match &self.datos {
            Datos::Matinal { accion, .. } => Some(accion),
            _ => None,
        }
    }

    pub fn activo_en(&self, dia: Dia) -> bool {
        self.dias.contains(&dia)
    }
}

/// Usuario autenticado (sin contraseña).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usuario {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub promotor_nombre: Option<String>,
}

impl Usuario {
    pub fn es_admin(&self) -> bool {
        self.role.trim().eq_ignore_ascii_case("admin")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevoUsuario {
    pub email: String,
    pub password: String,
    pub role: String,
    pub promotor_nombre: Option<String>,
}

/// Producto del catálogo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Producto {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub imageurl: Option<String>,
    pub category: Option<String>,
    pub has_tiers: bool,
    /// Lista JSON de tramos de descuento.
    pub discount_tiers: Value,
}

/// Cuerpo de alta/edición de producto. En la edición, los campos ausentes
/// conservan el valor actual.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatosProducto {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub imageurl: Option<String>,
    pub category: Option<String>,
    pub has_tiers: Option<bool>,
    pub discount_tiers: Option<Vec<Value>>,
}

impl DatosProducto {
    /// Arma un producto nuevo; `name` y `price` son obligatorios.
    pub fn en_producto_nuevo(self) -> Result<Producto, String> {
        let name = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let (Some(name), Some(price)) = (name, self.price) else {
            return Err("name y price son obligatorios".to_string());
        };
        Ok(Producto {
            id: 0,
            name: name.to_string(),
            price,
            imageurl: self.imageurl,
            category: self.category,
            has_tiers: self.has_tiers.unwrap_or(false),
            discount_tiers: normalizar_tramos(self.discount_tiers.unwrap_or_default()),
        })
    }

    /// Aplica sólo los campos presentes sobre el producto actual.
    pub fn aplicar(self, mut actual: Producto) -> Producto {
        if let Some(name) = self.name {
            actual.name = name;
        }
        if let Some(price) = self.price {
            actual.price = price;
        }
        if self.imageurl.is_some() {
            actual.imageurl = self.imageurl;
        }
        if self.category.is_some() {
            actual.category = self.category;
        }
        if let Some(has_tiers) = self.has_tiers {
            actual.has_tiers = has_tiers;
        }
        if let Some(tramos) = self.discount_tiers {
            actual.discount_tiers = normalizar_tramos(tramos);
        }
        actual
    }
}

/// Los tramos pueden llegar como objetos o como strings con JSON adentro.
pub fn normalizar_tramos(tramos: Vec<Value>) -> Value {
    let tramos = tramos
        .into_iter()
        .map(|t| match t {
            Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
            otro => otro,
        })
        .collect();
    Value::Array(tramos)
}

/// Marca de venta de la Vespertina para un PDV y acción.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstadoVenta {
    pub codigo_pdv: String,
    pub accion: String,
    pub sold: bool,
}
