//! Tablas de alias y búsqueda que se construyen una sola vez al arrancar y se
//! pasan explícitamente a normalizador, localizador de encabezados y consultas.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ErrorConfig;
use crate::excel::normalizar::{normalizar_clave, normalizar_nombre, Dia};

/// Alias de días: combinaciones ("LUJU") y alias simples ("LUNES", "LUN", "LU").
#[derive(Debug, Clone)]
pub struct AliasDias {
    combos: HashMap<String, Vec<Dia>>,
    /// Ordenados de mayor a menor longitud.
    alias: Vec<(String, Dia)>,
}

impl AliasDias {
    pub fn new(combos: Vec<(&str, Vec<Dia>)>, alias: Vec<(&str, Dia)>) -> Self {
        let combos = combos.into_iter().map(|(k, v)| (k.to_uppercase(), v)).collect();
        let mut alias: Vec<(String, Dia)> = alias.into_iter().map(|(k, d)| (k.to_uppercase(), d)).collect();
        alias.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        AliasDias { combos, alias }
    }

    /// Resuelve un token ya limpio (mayúsculas, sólo letras, sin acentos).
    pub fn resolver(&self, token: &str) -> Vec<Dia> {
        if let Some(dias) = self.combos.get(token) {
            return dias.clone();
        }
        self.segmentar(token).unwrap_or_default()
    }

    // El token tiene que quedar cubierto completo por alias consecutivos.
    // `eleccion[i]` guarda el primer alias (el más largo) que, puesto en la
    // posición `i`, deja un resto también cubrible; se llena de atrás hacia adelante.
    fn segmentar(&self, token: &str) -> Option<Vec<Dia>> {
        let n = token.len();
        let mut eleccion: Vec<Option<(usize, Dia)>> = vec![None; n + 1];
        let mut cubrible = vec![false; n + 1];
        cubrible[n] = true;
        for i in (0..n).rev() {
            let Some(resto) = token.get(i..) else { continue };
            for (alias, dia) in &self.alias {
                if resto.starts_with(alias.as_str()) && cubrible[i + alias.len()] {
                    eleccion[i] = Some((alias.len(), *dia));
                    cubrible[i] = true;
                    break;
                }
            }
        }
        if !cubrible[0] {
            return None;
        }

        let mut dias = Vec::new();
        let mut i = 0;
        while i < n {
            let (largo, dia) = eleccion[i]?;
            dias.push(dia);
            i += largo;
        }
        Some(dias)
    }
}

impl Default for AliasDias {
    fn default() -> Self {
        AliasDias::new(
            vec![
                ("LUJU", vec![Dia::Lun, Dia::Jue]),
                ("MAVI", vec![Dia::Mar, Dia::Vie]),
                ("MISA", vec![Dia::Mie, Dia::Sab]),
            ],
            vec![
                ("LUNES", Dia::Lun),
                ("MARTES", Dia::Mar),
                ("MIERCOLES", Dia::Mie),
                ("JUEVES", Dia::Jue),
                ("VIERNES", Dia::Vie),
                ("SABADO", Dia::Sab),
                ("DOMINGO", Dia::Dom),
                ("LUN", Dia::Lun),
                ("MAR", Dia::Mar),
                ("MIE", Dia::Mie),
                ("JUE", Dia::Jue),
                ("VIE", Dia::Vie),
                ("SAB", Dia::Sab),
                ("DOM", Dia::Dom),
                ("LU", Dia::Lun),
                ("MA", Dia::Mar),
                ("MI", Dia::Mie),
                ("JU", Dia::Jue),
                ("VI", Dia::Vie),
                ("SA", Dia::Sab),
                ("DO", Dia::Dom),
            ],
        )
    }
}

/// Campo lógico que puede aparecer como columna en una planilla.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Campo {
    Codigo,
    Cliente,
    Promotor,
    Dia,
    Canal,
    Subregion,
    Distribuidor,
    PromotorId,
    Frecuencia,
    CodigoPdv,
    RazonSocial,
}

/// Alias de encabezado por campo, ya normalizados con `normalizar_clave`.
#[derive(Debug, Clone)]
pub struct AliasEncabezados {
    campos: HashMap<Campo, Vec<String>>,
}

impl AliasEncabezados {
    pub fn new(campos: Vec<(Campo, Vec<&str>)>) -> Self {
        let campos = campos
            .into_iter()
            .map(|(campo, alias)| (campo, alias.into_iter().map(normalizar_clave).collect()))
            .collect();
        AliasEncabezados { campos }
    }

    pub fn alias(&self, campo: Campo) -> &[String] {
        self.campos.get(&campo).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `clave` debe venir normalizada.
    pub fn coincide(&self, campo: Campo, clave: &str) -> bool {
        !clave.is_empty() && self.alias(campo).iter().any(|a| a == clave)
    }
}

impl Default for AliasEncabezados {
    fn default() -> Self {
        AliasEncabezados::new(vec![
            (Campo::Codigo, vec!["codigo", "cod", "codigo cliente", "cod cliente"]),
            (Campo::Cliente, vec!["cliente", "nombre cliente", "razon social"]),
            (Campo::Promotor, vec!["promotor", "promotora", "vendedor", "vendedora", "nombre promotor"]),
            (Campo::Dia, vec!["dia", "dias", "dia visita", "dias visita", "frecuencia", "dia de visita"]),
            (Campo::Canal, vec!["canal"]),
            (Campo::Subregion, vec!["subregion", "sub region"]),
            (Campo::Distribuidor, vec!["distribuidor", "distribuidora"]),
            (
                Campo::PromotorId,
                vec!["id promotor", "promotor id", "promotor", "id vendedor", "vendedor", "cod promotor", "codigo promotor"],
            ),
            (Campo::Frecuencia, vec!["frecuencia", "frecuencia visita", "frec", "dia", "dias", "dia visita"]),
            (Campo::CodigoPdv, vec!["codigo pdv", "cod pdv", "pdv", "codigo", "cod cliente", "codigo cliente"]),
            (Campo::RazonSocial, vec!["razon social", "cliente", "nombre pdv", "nombre cliente", "nombre fantasia"]),
        ])
    }
}

/// Tabla estática nombre de promotor -> ID numérico (Matinal).
#[derive(Debug, Clone, Default)]
pub struct Promotores {
    ids: HashMap<String, i64>,
}

impl Promotores {
    pub fn new<I, S>(pares: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let ids = pares.into_iter().map(|(n, id)| (normalizar_nombre(n.as_ref()), id)).collect();
        Promotores { ids }
    }

    pub fn id_de(&self, nombre: &str) -> Option<i64> {
        self.ids.get(&normalizar_nombre(nombre)).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Conjunto inmutable de catálogos compartido por toda la aplicación.
#[derive(Debug, Clone, Default)]
pub struct Catalogos {
    pub dias: AliasDias,
    pub encabezados: AliasEncabezados,
    pub promotores: Promotores,
}

impl Catalogos {
    /// Catálogos por defecto con la tabla de promotores leída de un JSON
    /// `{ "Juan Perez": 10, ... }`.
    pub fn con_promotores_de_archivo<P: AsRef<Path>>(path: P) -> Result<Self, ErrorConfig> {
        let texto = std::fs::read_to_string(path.as_ref())?;
        let mapa: HashMap<String, i64> = serde_json::from_str(&texto)?;
        Ok(Catalogos { promotores: Promotores::new(mapa), ..Catalogos::default() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_se_normalizan_al_construir() {
        let enc = AliasEncabezados::default();
        assert!(enc.coincide(Campo::RazonSocial, "razonsocial"));
        assert!(enc.coincide(Campo::Codigo, "codigo"));
        assert!(!enc.coincide(Campo::Codigo, ""));
    }

    #[test]
    fn segmentacion_con_retroceso() {
        let dias = AliasDias::default();
        assert_eq!(dias.resolver("DOMA"), vec![Dia::Dom, Dia::Mar]);
        assert_eq!(dias.resolver("MARTES"), vec![Dia::Mar]);
        assert_eq!(dias.resolver("LUNESVI"), vec![Dia::Lun, Dia::Vie]);
        assert!(dias.resolver("SEMANAL").is_empty());
    }

    #[test]
    fn token_del_largo_maximo_de_celda() {
        // 32.767 caracteres, el máximo que admite una celda de Excel.
        let token = format!("{}DOM", "LU".repeat(16_382));
        assert_eq!(token.len(), 32_767);
        let resueltos = AliasDias::default().resolver(&token);
        assert_eq!(resueltos.len(), 16_383);
        assert_eq!(resueltos.first(), Some(&Dia::Lun));
        assert_eq!(resueltos.last(), Some(&Dia::Dom));

        let sin_cierre = format!("{}X", "LU".repeat(16_383));
        assert!(AliasDias::default().resolver(&sin_cierre).is_empty());
    }

    #[test]
    fn promotores_ignoran_mayusculas_y_espacios() {
        let p = Promotores::new(vec![("Juan Perez", 10)]);
        assert_eq!(p.id_de("JUAN  PEREZ "), Some(10));
        assert_eq!(p.id_de("Maria"), None);
    }
}
