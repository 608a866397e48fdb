use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use tracing::debug;

use super::{verificar_dataset, Almacen, ErrorAlmacen, CONTADOR_FLYERS};
use crate::excel::normalizar::{dias_a_texto, dias_desde_texto};
use crate::models::{Dataset, Datos, EstadoVenta, NuevoUsuario, Producto, Promotor, Registro, Usuario};

const ESQUEMA: &str = "
    CREATE TABLE IF NOT EXISTS cnc_registros (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sheet_name TEXT NOT NULL,
        uploaded_month TEXT NOT NULL,
        codigo TEXT NOT NULL,
        cliente TEXT NOT NULL,
        promotor_nombre TEXT NOT NULL,
        canal TEXT,
        subregion TEXT,
        distribuidor TEXT,
        dias TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_cnc_mes ON cnc_registros (uploaded_month, sheet_name);

    CREATE TABLE IF NOT EXISTS plan_comercial_registros (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sheet_name TEXT NOT NULL,
        uploaded_month TEXT NOT NULL,
        promotor_nombre TEXT NOT NULL,
        dias TEXT NOT NULL,
        row_json TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_plan_mes ON plan_comercial_registros (uploaded_month, sheet_name);

    CREATE TABLE IF NOT EXISTS matinal_registros (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sheet_name TEXT NOT NULL,
        uploaded_month TEXT NOT NULL,
        promotor_id INTEGER NOT NULL,
        codigo_pdv TEXT NOT NULL,
        razon_social TEXT,
        frecuencia_raw TEXT NOT NULL,
        accion TEXT NOT NULL,
        dias TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_matinal_mes ON matinal_registros (uploaded_month, promotor_id);

    CREATE TABLE IF NOT EXISTS matinal_ventas (
        fecha TEXT NOT NULL,
        usuario_id INTEGER NOT NULL,
        codigo_pdv TEXT NOT NULL,
        accion TEXT NOT NULL,
        sold INTEGER NOT NULL,
        PRIMARY KEY (fecha, usuario_id, codigo_pdv, accion)
    );

    CREATE TABLE IF NOT EXISTS usuarios (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        role TEXT NOT NULL,
        promotor_nombre TEXT,
        activo INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        price REAL NOT NULL,
        imageurl TEXT,
        category TEXT,
        has_tiers INTEGER NOT NULL DEFAULT 0,
        discount_tiers TEXT NOT NULL DEFAULT '[]'
    );

    CREATE TABLE IF NOT EXISTS stats (
        name TEXT PRIMARY KEY,
        value INTEGER NOT NULL
    );
";

/// Almacén SQLite sobre una única conexión protegida por mutex.
pub struct SqliteAlmacen {
    conn: Mutex<Connection>,
}

impl SqliteAlmacen {
    /// Abre (o crea) el archivo, creando el directorio padre si hace falta.
    pub fn abrir<P: AsRef<Path>>(path: P) -> Result<Self, ErrorAlmacen> {
        if let Some(dir) = path.as_ref().parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(SqliteAlmacen { conn: Mutex::new(conn) })
    }

    /// Base en memoria, usada en tests.
    pub fn en_memoria() -> Result<Self, ErrorAlmacen> {
        let almacen = SqliteAlmacen { conn: Mutex::new(Connection::open_in_memory()?) };
        almacen.inicializar()?;
        Ok(almacen)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ErrorAlmacen> {
        self.conn.lock().map_err(|_| ErrorAlmacen::Bloqueo)
    }
}

fn insertar(tx: &Transaction<'_>, r: &Registro) -> Result<(), ErrorAlmacen> {
    let dias = dias_a_texto(&r.dias);
    match (&r.promotor, &r.datos) {
        (Promotor::Nombre { promotor_nombre }, Datos::Cnc { codigo, cliente, canal, subregion, distribuidor }) => {
            tx.execute(
                "INSERT INTO cnc_registros (sheet_name, uploaded_month, codigo, cliente, promotor_nombre, canal, subregion, distribuidor, dias)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![r.sheet_name, r.uploaded_month, codigo, cliente, promotor_nombre, canal, subregion, distribuidor, dias],
            )?;
        }
        (Promotor::Nombre { promotor_nombre }, Datos::PlanComercial { row_json }) => {
            let json = serde_json::to_string(row_json)?;
            tx.execute(
                "INSERT INTO plan_comercial_registros (sheet_name, uploaded_month, promotor_nombre, dias, row_json)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![r.sheet_name, r.uploaded_month, promotor_nombre, dias, json],
            )?;
        }
        (Promotor::Id { promotor_id }, Datos::Matinal { codigo_pdv, razon_social, frecuencia_raw, accion }) => {
            tx.execute(
                "INSERT INTO matinal_registros (sheet_name, uploaded_month, promotor_id, codigo_pdv, razon_social, frecuencia_raw, accion, dias)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![r.sheet_name, r.uploaded_month, promotor_id, codigo_pdv, razon_social, frecuencia_raw, accion, dias],
            )?;
        }
        _ => {
            return Err(ErrorAlmacen::Inconsistente(format!(
                "identidad de promotor no corresponde a {}",
                r.datos.dataset().nombre()
            )));
        }
    }
    Ok(())
}

fn fila_cnc(row: &Row<'_>) -> rusqlite::Result<Registro> {
    let dias: String = row.get(9)?;
    Ok(Registro {
        id: Some(row.get(0)?),
        sheet_name: row.get(1)?,
        uploaded_month: row.get(2)?,
        promotor: Promotor::Nombre { promotor_nombre: row.get(3)? },
        dias: dias_desde_texto(&dias),
        datos: Datos::Cnc {
            codigo: row.get(4)?,
            cliente: row.get(5)?,
            canal: row.get(6)?,
            subregion: row.get(7)?,
            distribuidor: row.get(8)?,
        },
    })
}

fn fila_matinal(row: &Row<'_>) -> rusqlite::Result<Registro> {
    let dias: String = row.get(8)?;
    Ok(Registro {
        id: Some(row.get(0)?),
        sheet_name: row.get(1)?,
        uploaded_month: row.get(2)?,
        promotor: Promotor::Id { promotor_id: row.get(3)? },
        dias: dias_desde_texto(&dias),
        datos: Datos::Matinal {
            codigo_pdv: row.get(4)?,
            razon_social: row.get(5)?,
            frecuencia_raw: row.get(6)?,
            accion: row.get(7)?,
        },
    })
}

fn fila_usuario(row: &Row<'_>) -> rusqlite::Result<Usuario> {
    Ok(Usuario {
        id: row.get(0)?,
        email: row.get(1)?,
        role: row.get(2)?,
        promotor_nombre: row.get(3)?,
    })
}

// discount_tiers se devuelve como texto y se parsea fuera del closure.
fn fila_producto(row: &Row<'_>) -> rusqlite::Result<(Producto, String)> {
    let producto = Producto {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        imageurl: row.get(3)?,
        category: row.get(4)?,
        has_tiers: row.get(5)?,
        discount_tiers: serde_json::Value::Null,
    };
    Ok((producto, row.get(6)?))
}

fn con_tramos((mut producto, tramos): (Producto, String)) -> Result<Producto, ErrorAlmacen> {
    producto.discount_tiers = serde_json::from_str(&tramos)?;
    Ok(producto)
}

const SELECT_PRODUCTO: &str =
    "SELECT id, name, price, imageurl, category, has_tiers, discount_tiers FROM products";

impl Almacen for SqliteAlmacen {
    fn inicializar(&self) -> Result<(), ErrorAlmacen> {
        self.conn()?.execute_batch(ESQUEMA)?;
        Ok(())
    }

    fn reemplazar_mes(&self, dataset: Dataset, mes: &str, registros: &[Registro]) -> Result<usize, ErrorAlmacen> {
        verificar_dataset(dataset, registros)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let borrados = tx.execute(
            &format!("DELETE FROM {} WHERE uploaded_month = ?1", dataset.tabla()),
            params![mes],
        )?;
        for r in registros {
            insertar(&tx, r)?;
        }
        tx.commit()?;
        debug!(dataset = dataset.nombre(), mes, borrados, insertados = registros.len(), "mes reemplazado");
        Ok(registros.len())
    }

    fn registros_del_mes(&self, dataset: Dataset, mes: &str, hoja: Option<&str>) -> Result<Vec<Registro>, ErrorAlmacen> {
        let conn = self.conn()?;
        let filtro = "WHERE uploaded_month = ?1 AND (?2 IS NULL OR sheet_name = ?2) ORDER BY id";
        let registros = match dataset {
            Dataset::Cnc => {
                let sql = format!(
                    "SELECT id, sheet_name, uploaded_month, promotor_nombre, codigo, cliente, canal, subregion, distribuidor, dias
                     FROM cnc_registros {}",
                    filtro
                );
                let mut stmt = conn.prepare(&sql)?;
                let filas = stmt.query_map(params![mes, hoja], fila_cnc)?;
                filas.collect::<rusqlite::Result<Vec<_>>>()?
            }
            Dataset::PlanComercial => {
                let sql = format!(
                    "SELECT id, sheet_name, uploaded_month, promotor_nombre, dias, row_json
                     FROM plan_comercial_registros {}",
                    filtro
                );
                let mut stmt = conn.prepare(&sql)?;
                let filas = stmt.query_map(params![mes, hoja], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                })?;
                let mut out = Vec::new();
                for fila in filas {
                    let (id, sheet_name, uploaded_month, promotor_nombre, dias, json) = fila?;
                    out.push(Registro {
                        id: Some(id),
                        sheet_name,
                        uploaded_month,
                        promotor: Promotor::Nombre { promotor_nombre },
                        dias: dias_desde_texto(&dias),
                        datos: Datos::PlanComercial { row_json: serde_json::from_str(&json)? },
                    });
                }
                out
            }
            Dataset::Matinal => {
                let sql = format!(
                    "SELECT id, sheet_name, uploaded_month, promotor_id, codigo_pdv, razon_social, frecuencia_raw, accion, dias
                     FROM matinal_registros {}",
                    filtro
                );
                let mut stmt = conn.prepare(&sql)?;
                let filas = stmt.query_map(params![mes, hoja], fila_matinal)?;
                filas.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(registros)
    }

    fn hojas_del_mes(&self, dataset: Dataset, mes: &str) -> Result<Vec<String>, ErrorAlmacen> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT sheet_name FROM {} WHERE uploaded_month = ?1 GROUP BY sheet_name ORDER BY MIN(id)",
            dataset.tabla()
        );
        let mut stmt = conn.prepare(&sql)?;
        let hojas = stmt.query_map(params![mes], |row| row.get(0))?;
        Ok(hojas.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    fn usuario_por_id(&self, id: i64) -> Result<Option<Usuario>, ErrorAlmacen> {
        let conn = self.conn()?;
        let usuario = conn
            .query_row(
                "SELECT id, email, role, promotor_nombre FROM usuarios WHERE id = ?1 AND activo = 1",
                params![id],
                fila_usuario,
            )
            .optional()?;
        Ok(usuario)
    }

    fn credenciales(&self, email: &str) -> Result<Option<(Usuario, String)>, ErrorAlmacen> {
        let conn = self.conn()?;
        let fila = conn
            .query_row(
                "SELECT id, email, role, promotor_nombre, password FROM usuarios
                 WHERE lower(email) = lower(?1) AND activo = 1",
                params![email.trim()],
                |row| Ok((fila_usuario(row)?, row.get::<_, String>(4)?)),
            )
            .optional()?;
        Ok(fila)
    }

    fn crear_usuario(&self, nuevo: &NuevoUsuario) -> Result<Usuario, ErrorAlmacen> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO usuarios (email, password, role, promotor_nombre) VALUES (?1, ?2, ?3, ?4)",
            params![nuevo.email.trim(), nuevo.password, nuevo.role, nuevo.promotor_nombre],
        )?;
        Ok(Usuario {
            id: conn.last_insert_rowid(),
            email: nuevo.email.trim().to_string(),
            role: nuevo.role.clone(),
            promotor_nombre: nuevo.promotor_nombre.clone(),
        })
    }

    fn estados_venta(&self, fecha: &str, usuario_id: i64) -> Result<Vec<EstadoVenta>, ErrorAlmacen> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT codigo_pdv, accion, sold FROM matinal_ventas
             WHERE fecha = ?1 AND usuario_id = ?2 ORDER BY codigo_pdv, accion",
        )?;
        let filas = stmt.query_map(params![fecha, usuario_id], |row| {
            Ok(EstadoVenta { codigo_pdv: row.get(0)?, accion: row.get(1)?, sold: row.get(2)? })
        })?;
        Ok(filas.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn guardar_estado_venta(&self, fecha: &str, usuario_id: i64, estado: &EstadoVenta) -> Result<(), ErrorAlmacen> {
        self.conn()?.execute(
            "INSERT INTO matinal_ventas (fecha, usuario_id, codigo_pdv, accion, sold) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (fecha, usuario_id, codigo_pdv, accion) DO UPDATE SET sold = excluded.sold",
            params![fecha, usuario_id, estado.codigo_pdv, estado.accion, estado.sold],
        )?;
        Ok(())
    }

    fn productos(&self) -> Result<Vec<Producto>, ErrorAlmacen> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_PRODUCTO))?;
        let filas = stmt.query_map([], fila_producto)?;
        let mut out = Vec::new();
        for fila in filas {
            out.push(con_tramos(fila?)?);
        }
        Ok(out)
    }

    fn producto(&self, id: i64) -> Result<Option<Producto>, ErrorAlmacen> {
        let conn = self.conn()?;
        let fila = conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_PRODUCTO), params![id], fila_producto)
            .optional()?;
        fila.map(con_tramos).transpose()
    }

    fn crear_producto(&self, producto: &Producto) -> Result<Producto, ErrorAlmacen> {
        let tramos = serde_json::to_string(&producto.discount_tiers)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO products (name, price, imageurl, category, has_tiers, discount_tiers) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![producto.name, producto.price, producto.imageurl, producto.category, producto.has_tiers, tramos],
        )?;
        Ok(Producto { id: conn.last_insert_rowid(), ..producto.clone() })
    }

    fn actualizar_producto(&self, producto: &Producto) -> Result<bool, ErrorAlmacen> {
        let tramos = serde_json::to_string(&producto.discount_tiers)?;
        let cambiados = self.conn()?.execute(
            "UPDATE products SET name = ?1, price = ?2, imageurl = ?3, category = ?4, has_tiers = ?5, discount_tiers = ?6
             WHERE id = ?7",
            params![producto.name, producto.price, producto.imageurl, producto.category, producto.has_tiers, tramos, producto.id],
        )?;
        Ok(cambiados > 0)
    }

    fn eliminar_producto(&self, id: i64) -> Result<bool, ErrorAlmacen> {
        let borrados = self.conn()?.execute("DELETE FROM products WHERE id = ?1", params![id])?;
        Ok(borrados > 0)
    }

    fn contar_productos(&self) -> Result<i64, ErrorAlmacen> {
        let n = self.conn()?.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(n)
    }

    fn flyers_generados(&self) -> Result<i64, ErrorAlmacen> {
        let n = self
            .conn()?
            .query_row("SELECT value FROM stats WHERE name = ?1", params![CONTADOR_FLYERS], |row| row.get(0))
            .optional()?;
        Ok(n.unwrap_or(0))
    }

    fn incrementar_flyers(&self) -> Result<i64, ErrorAlmacen> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO stats (name, value) VALUES (?1, 1)
             ON CONFLICT (name) DO UPDATE SET value = stats.value + 1",
            params![CONTADOR_FLYERS],
        )?;
        let n = conn.query_row("SELECT value FROM stats WHERE name = ?1", params![CONTADOR_FLYERS], |row| row.get(0))?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::normalizar::Dia;
    use serde_json::{json, Map, Value};

    fn cnc(codigo: &str, hoja: &str, mes: &str) -> Registro {
        Registro {
            id: None,
            sheet_name: hoja.into(),
            uploaded_month: mes.into(),
            promotor: Promotor::Nombre { promotor_nombre: "Juan Perez".into() },
            dias: vec![Dia::Lun, Dia::Jue],
            datos: Datos::Cnc {
                codigo: codigo.into(),
                cliente: "Kiosco".into(),
                canal: Some("Tradicional".into()),
                subregion: None,
                distribuidor: None,
            },
        }
    }

    #[test]
    fn reemplazo_sustituye_el_mes_completo() {
        let db = SqliteAlmacen::en_memoria().unwrap();
        db.reemplazar_mes(Dataset::Cnc, "2024-03", &[cnc("1", "CNC A", "2024-03"), cnc("2", "CNC B", "2024-03")])
            .unwrap();
        db.reemplazar_mes(Dataset::Cnc, "2024-02", &[cnc("9", "CNC A", "2024-02")]).unwrap();
        db.reemplazar_mes(Dataset::Cnc, "2024-03", &[cnc("3", "CNC A", "2024-03")]).unwrap();

        let marzo = db.registros_del_mes(Dataset::Cnc, "2024-03", None).unwrap();
        assert_eq!(marzo.len(), 1);
        assert!(matches!(&marzo[0].datos, Datos::Cnc { codigo, .. } if codigo == "3"));
        assert_eq!(marzo[0].dias, vec![Dia::Lun, Dia::Jue]);
        assert_eq!(db.registros_del_mes(Dataset::Cnc, "2024-02", None).unwrap().len(), 1);
    }

    #[test]
    fn registro_de_otro_dataset_no_borra_nada() {
        let db = SqliteAlmacen::en_memoria().unwrap();
        db.reemplazar_mes(Dataset::Cnc, "2024-03", &[cnc("1", "CNC A", "2024-03")]).unwrap();
        let err = db.reemplazar_mes(Dataset::Matinal, "2024-03", &[cnc("2", "CNC A", "2024-03")]);
        assert!(err.is_err());
        assert_eq!(db.registros_del_mes(Dataset::Cnc, "2024-03", None).unwrap().len(), 1);
    }

    #[test]
    fn falla_a_mitad_de_la_insercion_revierte_el_borrado() {
        let db = SqliteAlmacen::en_memoria().unwrap();
        db.reemplazar_mes(Dataset::Cnc, "2024-03", &[cnc("1", "CNC A", "2024-03"), cnc("2", "CNC A", "2024-03")])
            .unwrap();

        // Pasa la verificación de dataset pero no se puede insertar: el DELETE ya corrió.
        let roto = Registro { promotor: Promotor::Id { promotor_id: 7 }, ..cnc("9", "CNC B", "2024-03") };
        let err = db.reemplazar_mes(Dataset::Cnc, "2024-03", &[cnc("3", "CNC B", "2024-03"), roto]);
        assert!(matches!(err, Err(ErrorAlmacen::Inconsistente(_))));

        let quedan = db.registros_del_mes(Dataset::Cnc, "2024-03", None).unwrap();
        let codigos: Vec<&str> = quedan
            .iter()
            .filter_map(|r| match &r.datos {
                Datos::Cnc { codigo, .. } => Some(codigo.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(codigos, vec!["1", "2"]);
        assert_eq!(db.hojas_del_mes(Dataset::Cnc, "2024-03").unwrap(), vec!["CNC A"]);
    }

    #[test]
    fn filtro_por_hoja_y_orden_de_hojas() {
        let db = SqliteAlmacen::en_memoria().unwrap();
        db.reemplazar_mes(
            Dataset::Cnc,
            "2024-03",
            &[cnc("1", "CNC Z", "2024-03"), cnc("2", "CNC A", "2024-03"), cnc("3", "CNC Z", "2024-03")],
        )
        .unwrap();
        assert_eq!(db.registros_del_mes(Dataset::Cnc, "2024-03", Some("CNC Z")).unwrap().len(), 2);
        assert_eq!(db.hojas_del_mes(Dataset::Cnc, "2024-03").unwrap(), vec!["CNC Z", "CNC A"]);
    }

    #[test]
    fn plan_comercial_conserva_orden_de_columnas() {
        let db = SqliteAlmacen::en_memoria().unwrap();
        let mut row_json = Map::new();
        row_json.insert("Zona".into(), json!("Sur"));
        row_json.insert("Cliente".into(), json!("Kiosco"));
        row_json.insert("Obs".into(), Value::Null);
        let r = Registro {
            id: None,
            sheet_name: "Juan".into(),
            uploaded_month: "2024-03".into(),
            promotor: Promotor::Nombre { promotor_nombre: "Juan".into() },
            dias: Dia::TODOS.to_vec(),
            datos: Datos::PlanComercial { row_json },
        };
        db.reemplazar_mes(Dataset::PlanComercial, "2024-03", &[r]).unwrap();
        let leidos = db.registros_del_mes(Dataset::PlanComercial, "2024-03", Some("Juan")).unwrap();
        match &leidos[0].datos {
            Datos::PlanComercial { row_json } => {
                assert_eq!(row_json.keys().collect::<Vec<_>>(), vec!["Zona", "Cliente", "Obs"]);
            }
            otro => panic!("inesperado: {:?}", otro),
        }
    }

    #[test]
    fn estados_de_venta_se_actualizan() {
        let db = SqliteAlmacen::en_memoria().unwrap();
        let mut e = EstadoVenta { codigo_pdv: "P-1".into(), accion: "Volanteo".into(), sold: true };
        db.guardar_estado_venta("2024-03-04", 5, &e).unwrap();
        e.sold = false;
        db.guardar_estado_venta("2024-03-04", 5, &e).unwrap();
        let estados = db.estados_venta("2024-03-04", 5).unwrap();
        assert_eq!(estados, vec![e]);
        assert!(db.estados_venta("2024-03-05", 5).unwrap().is_empty());
    }

    #[test]
    fn usuarios_y_credenciales() {
        let db = SqliteAlmacen::en_memoria().unwrap();
        let u = db
            .crear_usuario(&NuevoUsuario {
                email: "ana@empresa.cl".into(),
                password: "secreta".into(),
                role: "promotor".into(),
                promotor_nombre: Some("Ana Gil".into()),
            })
            .unwrap();
        let (leido, pass) = db.credenciales("ANA@empresa.cl").unwrap().unwrap();
        assert_eq!(leido, u);
        assert_eq!(pass, "secreta");
        assert_eq!(db.usuario_por_id(u.id).unwrap(), Some(u));
        assert_eq!(db.usuario_por_id(999).unwrap(), None);
    }

    #[test]
    fn productos_y_contador() {
        let db = SqliteAlmacen::en_memoria().unwrap();
        let p = db
            .crear_producto(&Producto {
                id: 0,
                name: "Lays".into(),
                price: 990.0,
                imageurl: None,
                category: Some("Snacks".into()),
                has_tiers: true,
                discount_tiers: json!([{"min": 3, "pct": 10}]),
            })
            .unwrap();
        assert!(p.id > 0);
        assert_eq!(db.producto(p.id).unwrap(), Some(p.clone()));
        assert!(db.actualizar_producto(&Producto { price: 890.0, ..p.clone() }).unwrap());
        assert_eq!(db.productos().unwrap()[0].price, 890.0);
        assert_eq!(db.contar_productos().unwrap(), 1);
        assert!(db.eliminar_producto(p.id).unwrap());
        assert!(!db.eliminar_producto(p.id).unwrap());

        assert_eq!(db.flyers_generados().unwrap(), 0);
        db.incrementar_flyers().unwrap();
        assert_eq!(db.incrementar_flyers().unwrap(), 2);
    }
}
