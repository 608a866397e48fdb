//! Fuente de la hora actual. El mes de carga y el día de consulta salen de acá,
//! así los tests pueden fijar la fecha.

use chrono::{Local, NaiveDateTime};

pub trait Reloj: Send + Sync {
    fn ahora(&self) -> NaiveDateTime;
}

/// Hora local del servidor.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelojSistema;

impl Reloj for RelojSistema {
    fn ahora(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RelojFijo(pub NaiveDateTime);

impl Reloj for RelojFijo {
    fn ahora(&self) -> NaiveDateTime {
        self.0
    }
}
