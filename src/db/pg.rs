use postgres::{Client, NoTls, Row, Transaction};
use tracing::debug;

use super::{verificar_dataset, Almacen, ErrorAlmacen, CONTADOR_FLYERS};
use crate::excel::normalizar::{dias_a_texto, dias_desde_texto};
use crate::models::{Dataset, Datos, EstadoVenta, NuevoUsuario, Producto, Promotor, Registro, Usuario};

// row_json y discount_tiers van como TEXT: JSONB reordena las claves.
const ESQUEMA: &str = "
    CREATE TABLE IF NOT EXISTS cnc_registros (
        id BIGSERIAL PRIMARY KEY,
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
        id BIGSERIAL PRIMARY KEY,
        sheet_name TEXT NOT NULL,
        uploaded_month TEXT NOT NULL,
        promotor_nombre TEXT NOT NULL,
        dias TEXT NOT NULL,
        row_json TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_plan_mes ON plan_comercial_registros (uploaded_month, sheet_name);

    CREATE TABLE IF NOT EXISTS matinal_registros (
        id BIGSERIAL PRIMARY KEY,
        sheet_name TEXT NOT NULL,
        uploaded_month TEXT NOT NULL,
        promotor_id BIGINT NOT NULL,
        codigo_pdv TEXT NOT NULL,
        razon_social TEXT,
        frecuencia_raw TEXT NOT NULL,
        accion TEXT NOT NULL,
        dias TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_matinal_mes ON matinal_registros (uploaded_month, promotor_id);

    CREATE TABLE IF NOT EXISTS matinal_ventas (
        fecha TEXT NOT NULL,
        usuario_id BIGINT NOT NULL,
        codigo_pdv TEXT NOT NULL,
        accion TEXT NOT NULL,
        sold BOOLEAN NOT NULL,
        PRIMARY KEY (fecha, usuario_id, codigo_pdv, accion)
    );

    CREATE TABLE IF NOT EXISTS usuarios (
        id BIGSERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        role TEXT NOT NULL,
        promotor_nombre TEXT,
        activo BOOLEAN NOT NULL DEFAULT TRUE
    );

    CREATE TABLE IF NOT EXISTS products (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        price DOUBLE PRECISION NOT NULL,
        imageurl TEXT,
        category TEXT,
        has_tiers BOOLEAN NOT NULL DEFAULT FALSE,
        discount_tiers TEXT NOT NULL DEFAULT '[]'
    );

    CREATE TABLE IF NOT EXISTS stats (
        name TEXT PRIMARY KEY,
        value BIGINT NOT NULL
    );
";

const SELECT_PRODUCTO: &str =
    "SELECT id, name, price, imageurl, category, has_tiers, discount_tiers FROM products";

/// Almacén Postgres. Sólo guarda la URL; cada operación abre su cliente en un
/// hilo propio, porque el cliente síncrono levanta su propio runtime y no
/// puede hacerlo dentro del de actix.
pub struct PostgresAlmacen {
    url: String,
}

impl PostgresAlmacen {
    pub fn new(url: &str) -> Self {
        PostgresAlmacen { url: url.to_string() }
    }

    fn en_hilo<T, F>(&self, op: F) -> Result<T, ErrorAlmacen>
    where
        T: Send + 'static,
        F: FnOnce(&mut Client) -> Result<T, ErrorAlmacen> + Send + 'static,
    {
        let url = self.url.clone();
        let handle = std::thread::spawn(move || -> Result<T, ErrorAlmacen> {
            let mut client = Client::connect(&url, NoTls)?;
            op(&mut client)
        });
        handle.join().map_err(|_| ErrorAlmacen::Hilo)?
    }
}

fn insertar(tx: &mut Transaction<'_>, r: &Registro) -> Result<(), ErrorAlmacen> {
    let dias = dias_a_texto(&r.dias);
    match (&r.promotor, &r.datos) {
        (Promotor::Nombre { promotor_nombre }, Datos::Cnc { codigo, cliente, canal, subregion, distribuidor }) => {
            tx.execute(
                "INSERT INTO cnc_registros (sheet_name, uploaded_month, codigo, cliente, promotor_nombre, canal, subregion, distribuidor, dias)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                &[&r.sheet_name, &r.uploaded_month, codigo, cliente, promotor_nombre, canal, subregion, distribuidor, &dias],
            )?;
        }
        (Promotor::Nombre { promotor_nombre }, Datos::PlanComercial { row_json }) => {
            let json = serde_json::to_string(row_json)?;
            tx.execute(
                "INSERT INTO plan_comercial_registros (sheet_name, uploaded_month, promotor_nombre, dias, row_json)
                 VALUES ($1, $2, $3, $4, $5)",
                &[&r.sheet_name, &r.uploaded_month, promotor_nombre, &dias, &json],
            )?;
        }
        (Promotor::Id { promotor_id }, Datos::Matinal { codigo_pdv, razon_social, frecuencia_raw, accion }) => {
            tx.execute(
                "INSERT INTO matinal_registros (sheet_name, uploaded_month, promotor_id, codigo_pdv, razon_social, frecuencia_raw, accion, dias)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                &[&r.sheet_name, &r.uploaded_month, promotor_id, codigo_pdv, razon_social, frecuencia_raw, accion, &dias],
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

fn registro_desde(dataset: Dataset, row: &Row) -> Result<Registro, ErrorAlmacen> {
    let dias: String = row.get("dias");
    let (promotor, datos) = match dataset {
        Dataset::Cnc => (
            Promotor::Nombre { promotor_nombre: row.get("promotor_nombre") },
            Datos::Cnc {
                codigo: row.get("codigo"),
                cliente: row.get("cliente"),
                canal: row.get("canal"),
                subregion: row.get("subregion"),
                distribuidor: row.get("distribuidor"),
            },
        ),
        Dataset::PlanComercial => {
            let json: String = row.get("row_json");
            (
                Promotor::Nombre { promotor_nombre: row.get("promotor_nombre") },
                Datos::PlanComercial { row_json: serde_json::from_str(&json)? },
            )
        }
        Dataset::Matinal => (
            Promotor::Id { promotor_id: row.get("promotor_id") },
            Datos::Matinal {
                codigo_pdv: row.get("codigo_pdv"),
                razon_social: row.get("razon_social"),
                frecuencia_raw: row.get("frecuencia_raw"),
                accion: row.get("accion"),
            },
        ),
    };
    Ok(Registro {
        id: Some(row.get("id")),
        sheet_name: row.get("sheet_name"),
        uploaded_month: row.get("uploaded_month"),
        promotor,
        dias: dias_desde_texto(&dias),
        datos,
    })
}

fn usuario_desde(row: &Row) -> Usuario {
    Usuario {
        id: row.get("id"),
        email: row.get("email"),
        role: row.get("role"),
        promotor_nombre: row.get("promotor_nombre"),
    }
}

fn producto_desde(row: &Row) -> Result<Producto, ErrorAlmacen> {
    let tramos: String = row.get("discount_tiers");
    Ok(Producto {
        id: row.get("id"),
        name: row.get("name"),
        price: row.get("price"),
        imageurl: row.get("imageurl"),
        category: row.get("category"),
        has_tiers: row.get("has_tiers"),
        discount_tiers: serde_json::from_str(&tramos)?,
    })
}

impl Almacen for PostgresAlmacen {
    fn inicializar(&self) -> Result<(), ErrorAlmacen> {
        self.en_hilo(|client| {
            client.batch_execute(ESQUEMA)?;
            Ok(())
        })
    }

    fn reemplazar_mes(&self, dataset: Dataset, mes: &str, registros: &[Registro]) -> Result<usize, ErrorAlmacen> {
        verificar_dataset(dataset, registros)?;
        let mes = mes.to_string();
        let registros = registros.to_vec();
        self.en_hilo(move |client| {
            let mut tx = client.transaction()?;
            let borrar = format!("DELETE FROM {} WHERE uploaded_month = $1", dataset.tabla());
            let borrados = tx.execute(borrar.as_str(), &[&mes])?;
            for r in &registros {
                insertar(&mut tx, r)?;
            }
            tx.commit()?;
            debug!(dataset = dataset.nombre(), mes = %mes, borrados, insertados = registros.len(), "mes reemplazado");
            Ok(registros.len())
        })
    }

    fn registros_del_mes(&self, dataset: Dataset, mes: &str, hoja: Option<&str>) -> Result<Vec<Registro>, ErrorAlmacen> {
        let mes = mes.to_string();
        let hoja = hoja.map(str::to_string);
        self.en_hilo(move |client| {
            let sql = format!(
                "SELECT * FROM {} WHERE uploaded_month = $1 AND ($2::TEXT IS NULL OR sheet_name = $2) ORDER BY id",
                dataset.tabla()
            );
            let filas = client.query(sql.as_str(), &[&mes, &hoja])?;
            filas.iter().map(|row| registro_desde(dataset, row)).collect()
        })
    }

    fn hojas_del_mes(&self, dataset: Dataset, mes: &str) -> Result<Vec<String>, ErrorAlmacen> {
        let mes = mes.to_string();
        self.en_hilo(move |client| {
            let sql = format!(
                "SELECT sheet_name FROM {} WHERE uploaded_month = $1 GROUP BY sheet_name ORDER BY MIN(id)",
                dataset.tabla()
            );
            let filas = client.query(sql.as_str(), &[&mes])?;
            Ok(filas.iter().map(|row| row.get(0)).collect())
        })
    }

    fn usuario_por_id(&self, id: i64) -> Result<Option<Usuario>, ErrorAlmacen> {
        self.en_hilo(move |client| {
            let fila = client.query_opt(
                "SELECT id, email, role, promotor_nombre FROM usuarios WHERE id = $1 AND activo",
                &[&id],
            )?;
            Ok(fila.as_ref().map(usuario_desde))
        })
    }

    fn credenciales(&self, email: &str) -> Result<Option<(Usuario, String)>, ErrorAlmacen> {
        let email = email.trim().to_string();
        self.en_hilo(move |client| {
            let fila = client.query_opt(
                "SELECT id, email, role, promotor_nombre, password FROM usuarios
                 WHERE lower(email) = lower($1) AND activo",
                &[&email],
            )?;
            Ok(fila.map(|row| (usuario_desde(&row), row.get("password"))))
        })
    }

    fn crear_usuario(&self, nuevo: &NuevoUsuario) -> Result<Usuario, ErrorAlmacen> {
        let nuevo = nuevo.clone();
        self.en_hilo(move |client| {
            let row = client.query_one(
                "INSERT INTO usuarios (email, password, role, promotor_nombre) VALUES ($1, $2, $3, $4)
                 RETURNING id, email, role, promotor_nombre",
                &[&nuevo.email.trim(), &nuevo.password, &nuevo.role, &nuevo.promotor_nombre],
            )?;
            Ok(usuario_desde(&row))
        })
    }

    fn estados_venta(&self, fecha: &str, usuario_id: i64) -> Result<Vec<EstadoVenta>, ErrorAlmacen> {
        let fecha = fecha.to_string();
        self.en_hilo(move |client| {
            let filas = client.query(
                "SELECT codigo_pdv, accion, sold FROM matinal_ventas
                 WHERE fecha = $1 AND usuario_id = $2 ORDER BY codigo_pdv, accion",
                &[&fecha, &usuario_id],
            )?;
            Ok(filas
                .iter()
                .map(|row| EstadoVenta { codigo_pdv: row.get(0), accion: row.get(1), sold: row.get(2) })
                .collect())
        })
    }

    fn guardar_estado_venta(&self, fecha: &str, usuario_id: i64, estado: &EstadoVenta) -> Result<(), ErrorAlmacen> {
        let fecha = fecha.to_string();
        let estado = estado.clone();
        self.en_hilo(move |client| {
            client.execute(
                "INSERT INTO matinal_ventas (fecha, usuario_id, codigo_pdv, accion, sold) VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (fecha, usuario_id, codigo_pdv, accion) DO UPDATE SET sold = EXCLUDED.sold",
                &[&fecha, &usuario_id, &estado.codigo_pdv, &estado.accion, &estado.sold],
            )?;
            Ok(())
        })
    }

    fn productos(&self) -> Result<Vec<Producto>, ErrorAlmacen> {
        self.en_hilo(|client| {
            let filas = client.query(format!("{} ORDER BY id", SELECT_PRODUCTO).as_str(), &[])?;
            filas.iter().map(producto_desde).collect()
        })
    }

    fn producto(&self, id: i64) -> Result<Option<Producto>, ErrorAlmacen> {
        self.en_hilo(move |client| {
            let fila = client.query_opt(format!("{} WHERE id = $1", SELECT_PRODUCTO).as_str(), &[&id])?;
            fila.as_ref().map(producto_desde).transpose()
        })
    }

    fn crear_producto(&self, producto: &Producto) -> Result<Producto, ErrorAlmacen> {
        let producto = producto.clone();
        let tramos = serde_json::to_string(&producto.discount_tiers)?;
        self.en_hilo(move |client| {
            let row = client.query_one(
                "INSERT INTO products (name, price, imageurl, category, has_tiers, discount_tiers)
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
                &[&producto.name, &producto.price, &producto.imageurl, &producto.category, &producto.has_tiers, &tramos],
            )?;
            Ok(Producto { id: row.get(0), ..producto })
        })
    }

    fn actualizar_producto(&self, producto: &Producto) -> Result<bool, ErrorAlmacen> {
        let producto = producto.clone();
        let tramos = serde_json::to_string(&producto.discount_tiers)?;
        self.en_hilo(move |client| {
            let n = client.execute(
                "UPDATE products SET name = $1, price = $2, imageurl = $3, category = $4, has_tiers = $5, discount_tiers = $6
                 WHERE id = $7",
                &[&producto.name, &producto.price, &producto.imageurl, &producto.category, &producto.has_tiers, &tramos, &producto.id],
            )?;
            Ok(n > 0)
        })
    }

    fn eliminar_producto(&self, id: i64) -> Result<bool, ErrorAlmacen> {
        self.en_hilo(move |client| Ok(client.execute("DELETE FROM products WHERE id = $1", &[&id])? > 0))
    }

    fn contar_productos(&self) -> Result<i64, ErrorAlmacen> {
        self.en_hilo(|client| Ok(client.query_one("SELECT COUNT(*) FROM products", &[])?.get(0)))
    }

    fn flyers_generados(&self) -> Result<i64, ErrorAlmacen> {
        self.en_hilo(|client| {
            let fila = client.query_opt("SELECT value FROM stats WHERE name = $1", &[&CONTADOR_FLYERS])?;
            Ok(fila.map(|row| row.get(0)).unwrap_or(0))
        })
    }

    fn incrementar_flyers(&self) -> Result<i64, ErrorAlmacen> {
        self.en_hilo(|client| {
            let row = client.query_one(
                "INSERT INTO stats (name, value) VALUES ($1, 1)
                 ON CONFLICT (name) DO UPDATE SET value = stats.value + 1
                 RETURNING value",
                &[&CONTADOR_FLYERS],
            )?;
            Ok(row.get(0))
        })
    }
}
