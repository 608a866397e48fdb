//! Normalización de textos provenientes de las planillas: claves de
//! encabezado, nombres de promotor y días de visita.

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::catalogos::AliasDias;

/// Código canónico de día de semana.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dia {
    Dom,
    Lun,
    Mar,
    Mie,
    Jue,
    Vie,
    Sab,
}

impl Dia {
    pub const TODOS: [Dia; 7] = [Dia::Dom, Dia::Lun, Dia::Mar, Dia::Mie, Dia::Jue, Dia::Vie, Dia::Sab];

    pub fn codigo(&self) -> &'static str {
        match self {
            Dia::Dom => "DOM",
            Dia::Lun => "LUN",
            Dia::Mar => "MAR",
            Dia::Mie => "MIE",
            Dia::Jue => "JUE",
            Dia::Vie => "VIE",
            Dia::Sab => "SAB",
        }
    }

    pub fn desde_codigo(codigo: &str) -> Option<Dia> {
        Dia::TODOS.iter().copied().find(|d| d.codigo().eq_ignore_ascii_case(codigo.trim()))
    }

    pub fn desde_weekday(dia: chrono::Weekday) -> Dia {
        use chrono::Weekday;
        match dia {
            Weekday::Mon => Dia::Lun,
            Weekday::Tue => Dia::Mar,
            Weekday::Wed => Dia::Mie,
            Weekday::Thu => Dia::Jue,
            Weekday::Fri => Dia::Vie,
            Weekday::Sat => Dia::Sab,
            Weekday::Sun => Dia::Dom,
        }
    }
}

impl fmt::Display for Dia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codigo())
    }
}

/// Quita acentos (descomposición NFD + eliminación de marcas combinantes).
pub fn quitar_acentos(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Clave normalizada de encabezado: sin acentos, minúsculas y sólo letras.
///
/// Se aplica igual a las celdas de la planilla y a las listas de alias;
/// `normalizar_clave("Código ") == "codigo"`.
pub fn normalizar_clave(s: &str) -> String {
    quitar_acentos(s)
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normaliza nombres de promotor para compararlos sin importar mayúsculas ni espacios.
pub fn normalizar_nombre(s: &str) -> String {
    s.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect()
}

/// Recorta el texto y devuelve `None` si queda vacío.
pub fn limpiar(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

fn token_de_dia(token: &str) -> String {
    quitar_acentos(token)
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Convierte un texto libre de días o frecuencia ("Lu, Ma", "LUJU",
/// "Lunes y Jueves") en la lista de códigos canónicos, sin duplicados y en
/// orden de primera aparición. Los tokens no reconocidos se ignoran.
pub fn normalize_days(raw: &str, alias: &AliasDias) -> Vec<Dia> {
    let mut dias: Vec<Dia> = Vec::new();
    let separadores = |c: char| matches!(c, ',' | ';' | '/' | '-') || c.is_whitespace();
    for token in raw.split(separadores) {
        let limpio = token_de_dia(token);
        if limpio.is_empty() {
            continue;
        }
        for dia in alias.resolver(&limpio) {
            if !dias.contains(&dia) {
                dias.push(dia);
            }
        }
    }
    dias
}

/// Serializa los días como "LUN,JUE" para almacenarlos en una columna de texto.
pub fn dias_a_texto(dias: &[Dia]) -> String {
    dias.iter().map(Dia::codigo).collect::<Vec<_>>().join(",")
}

pub fn dias_desde_texto(s: &str) -> Vec<Dia> {
    s.split(',').filter_map(Dia::desde_codigo).collect()
}
