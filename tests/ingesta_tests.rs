mod common;

use common::*;
use plan_comercial::catalogos::{Catalogos, Promotores};
use plan_comercial::consulta::{agrupar_por_accion, consultar_hoy};
use plan_comercial::db::Almacen;
use plan_comercial::error::AppError;
use plan_comercial::excel::{extraer_filas, find_header_row, leer_libro, Dia};
use plan_comercial::ingesta::{cargar_libro, extraer_libro, ContextoCarga};
use plan_comercial::models::{Dataset, Datos};
use plan_comercial::perfil::Perfil;
use plan_comercial::reloj::RelojFijo;

#[test]
fn escenario_cnc_ung_marzo_2024() {
    let almacen = almacen();
    let catalogos = Catalogos::default();
    let reloj = RelojFijo(lunes());
    let ctx = ContextoCarga { almacen: &almacen, catalogos: &catalogos, reloj: &reloj };
    let admin = crear_usuario(&almacen, "admin@empresa.cl", "admin", None);

    let resultado = cargar_libro(&libro_cnc_ung(), &Perfil::cnc(), &admin, &ctx).unwrap();
    assert!(resultado.success);
    assert_eq!(resultado.uploaded_month, "2024-03");
    assert_eq!(resultado.rows_inserted, 1);

    let guardados = almacen.registros_del_mes(Dataset::Cnc, "2024-03", None).unwrap();
    assert_eq!(guardados.len(), 1);
    let r = &guardados[0];
    assert_eq!(r.sheet_name, "CNC UNG");
    assert_eq!(r.promotor_nombre(), Some("Juan Perez"));
    assert_eq!(r.dias, vec![Dia::Lun]);
    match &r.datos {
        Datos::Cnc { codigo, cliente, .. } => {
            assert_eq!(codigo, "001");
            assert_eq!(cliente, "Kiosco Sur");
        }
        otro => panic!("se esperaba CNC: {:?}", otro),
    }

    let hoy = consultar_hoy(&almacen, &catalogos, lunes(), &admin, Dataset::Cnc, Some("CNC UNG"), None).unwrap();
    assert_eq!(hoy.dia, Dia::Lun);
    assert_eq!(hoy.registros.len(), 1);

    let manana = consultar_hoy(&almacen, &catalogos, martes(), &admin, Dataset::Cnc, Some("CNC UNG"), None).unwrap();
    assert_eq!(manana.dia, Dia::Mar);
    assert!(manana.registros.is_empty());
}

#[test]
fn segunda_carga_del_mes_reemplaza_la_primera() {
    let almacen = almacen();
    let catalogos = Catalogos::default();
    let reloj = RelojFijo(lunes());
    let ctx = ContextoCarga { almacen: &almacen, catalogos: &catalogos, reloj: &reloj };
    let admin = crear_usuario(&almacen, "admin@empresa.cl", "admin", None);

    let a = libro_xlsx(&[(
        "CNC A",
        &[
            &["Codigo", "Cliente", "Promotor", "Dia"],
            &["1", "Uno", "Ana", "Lunes"],
            &["2", "Dos", "Ana", "Martes"],
        ],
    )]);
    let b = libro_xlsx(&[(
        "CNC B",
        &[&["Codigo", "Cliente", "Promotor", "Dia"], &["3", "Tres", "Luis", "Vie"]],
    )]);

    assert_eq!(cargar_libro(&a, &Perfil::cnc(), &admin, &ctx).unwrap().rows_inserted, 2);
    assert_eq!(cargar_libro(&b, &Perfil::cnc(), &admin, &ctx).unwrap().rows_inserted, 1);

    let guardados = almacen.registros_del_mes(Dataset::Cnc, "2024-03", None).unwrap();
    let codigos: Vec<&str> = guardados
        .iter()
        .filter_map(|r| match &r.datos {
            Datos::Cnc { codigo, .. } => Some(codigo.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(codigos, vec!["3"]);
    assert_eq!(almacen.hojas_del_mes(Dataset::Cnc, "2024-03").unwrap(), vec!["CNC B"]);
}

#[test]
fn carga_sin_filas_validas_no_borra_lo_anterior() {
    let almacen = almacen();
    let catalogos = Catalogos::default();
    let reloj = RelojFijo(lunes());
    let ctx = ContextoCarga { almacen: &almacen, catalogos: &catalogos, reloj: &reloj };
    let admin = crear_usuario(&almacen, "admin@empresa.cl", "admin", None);

    cargar_libro(&libro_cnc_ung(), &Perfil::cnc(), &admin, &ctx).unwrap();
    let vacio = libro_xlsx(&[("CNC UNG", &[&["Codigo", "Cliente", "Promotor", "Dia"], &["001", "", "Juan", "Lunes"]])]);
    let err = cargar_libro(&vacio, &Perfil::cnc(), &admin, &ctx).unwrap_err();
    assert!(matches!(err, AppError::Validacion(_)));
    assert_eq!(almacen.registros_del_mes(Dataset::Cnc, "2024-03", None).unwrap().len(), 1);
}

fn libro_matinal() -> Vec<u8> {
    libro_xlsx(&[
        ("Portada", &[&["Plan Matinal Marzo"]]),
        (
            "Matinal",
            &[
                &["Planilla Matinal"],
                &["ID Promotor", "Frecuencia", "Código PDV", "Razón Social", "Volanteo", "Exhibición"],
                &["7", "LUJU", "P-1", "Kiosco Sur", "X", "X"],
                &["7", "MAVI", "P-2", "Bazar Norte", "X", ""],
                &["8", "Lunes", "P-3", "Almacén Luz", "", "x"],
                &["7", "Lunes", "P-4", "Sin marcas", "", ""],
            ],
        ),
    ])
}

#[test]
fn matinal_abre_un_registro_por_marca() {
    let almacen = almacen();
    let catalogos = Catalogos::default();
    let reloj = RelojFijo(lunes());
    let ctx = ContextoCarga { almacen: &almacen, catalogos: &catalogos, reloj: &reloj };
    let admin = crear_usuario(&almacen, "admin@empresa.cl", "admin", None);

    let resultado = cargar_libro(&libro_matinal(), &Perfil::matinal(), &admin, &ctx).unwrap();
    assert_eq!(resultado.rows_inserted, 4);

    let guardados = almacen.registros_del_mes(Dataset::Matinal, "2024-03", None).unwrap();
    let p1: Vec<&str> = guardados
        .iter()
        .filter(|r| matches!(&r.datos, Datos::Matinal { codigo_pdv, .. } if codigo_pdv == "P-1"))
        .filter_map(|r| r.accion())
        .collect();
    assert_eq!(p1, vec!["Volanteo", "Exhibición"]);
    assert!(guardados.iter().all(|r| r.sheet_name == "Matinal"));
}

#[test]
fn promotor_ve_sus_acciones_del_dia_agrupadas() {
    let almacen = almacen();
    let catalogos = Catalogos { promotores: Promotores::new(vec![("Ana Gil", 7)]), ..Catalogos::default() };
    let reloj = RelojFijo(lunes());
    let ctx = ContextoCarga { almacen: &almacen, catalogos: &catalogos, reloj: &reloj };
    let admin = crear_usuario(&almacen, "admin@empresa.cl", "admin", None);
    let ana = crear_usuario(&almacen, "ana@empresa.cl", "promotor", Some("ANA GIL"));
    let pedro = crear_usuario(&almacen, "pedro@empresa.cl", "promotor", Some("Pedro"));

    cargar_libro(&libro_matinal(), &Perfil::matinal(), &admin, &ctx).unwrap();

    let consulta = consultar_hoy(&almacen, &catalogos, lunes(), &ana, Dataset::Matinal, None, None).unwrap();
    let grupos = agrupar_por_accion(consulta.registros);
    let nombres: Vec<&str> = grupos.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(nombres, vec!["Exhibición", "Volanteo"]);
    assert_eq!(grupos[0].clients.len(), 1);
    assert_eq!(grupos[1].clients[0].codigo_pdv, "P-1");
    assert_eq!(grupos[1].clients[0].razon_social.as_deref(), Some("Kiosco Sur"));

    let err = consultar_hoy(&almacen, &catalogos, lunes(), &pedro, Dataset::Matinal, None, None).unwrap_err();
    assert!(matches!(err, AppError::Permiso(_)));

    let todo = consultar_hoy(&almacen, &catalogos, lunes(), &admin, Dataset::Matinal, None, None).unwrap();
    assert_eq!(todo.registros.len(), 3);
    let solo_8 = consultar_hoy(&almacen, &catalogos, lunes(), &admin, Dataset::Matinal, None, Some(8)).unwrap();
    assert_eq!(solo_8.registros.len(), 1);
}

#[test]
fn plan_comercial_por_hoja_y_promotor() {
    let almacen = almacen();
    let catalogos = Catalogos::default();
    let reloj = RelojFijo(lunes());
    let ctx = ContextoCarga { almacen: &almacen, catalogos: &catalogos, reloj: &reloj };
    let admin = crear_usuario(&almacen, "admin@empresa.cl", "admin", None);
    let juan = crear_usuario(&almacen, "juan@empresa.cl", "promotor", Some("Juan Perez"));

    let libro = libro_xlsx(&[
        ("Juan Perez", &[&["Cliente", "Objetivo", "Comentario"], &["Kiosco Sur", "10", "llamar"], &["Bazar", "5", ""]]),
        (
            "Zona Norte",
            &[&["Cliente", "Promotor", "Día"], &["Almacén", "Juan Perez", "Martes"], &["Kiosco", "Ana Gil", "Lunes"]],
        ),
    ]);
    assert_eq!(cargar_libro(&libro, &Perfil::plan_comercial(), &admin, &ctx).unwrap().rows_inserted, 4);
    assert_eq!(
        almacen.hojas_del_mes(Dataset::PlanComercial, "2024-03").unwrap(),
        vec!["Juan Perez", "Zona Norte"]
    );

    let propia = consultar_hoy(&almacen, &catalogos, lunes(), &juan, Dataset::PlanComercial, Some("Juan Perez"), None).unwrap();
    assert_eq!(propia.registros.len(), 2);
    match &propia.registros[1].datos {
        Datos::PlanComercial { row_json } => {
            assert_eq!(row_json.keys().collect::<Vec<_>>(), vec!["Cliente", "Objetivo", "Comentario"]);
            assert!(row_json["Comentario"].is_null());
        }
        otro => panic!("se esperaba Plan Comercial: {:?}", otro),
    }

    // Lunes: la fila de Juan en Zona Norte es de los martes.
    let norte = consultar_hoy(&almacen, &catalogos, lunes(), &juan, Dataset::PlanComercial, Some("Zona Norte"), None).unwrap();
    assert!(norte.registros.is_empty());
    let norte = consultar_hoy(&almacen, &catalogos, martes(), &juan, Dataset::PlanComercial, Some("Zona Norte"), None).unwrap();
    assert_eq!(norte.registros.len(), 1);
}

#[test]
fn extraccion_desde_bytes_es_determinista() {
    let bytes = libro_matinal();
    let catalogos = Catalogos::default();
    let perfil = Perfil::matinal();
    let a = extraer_libro(&leer_libro(&bytes).unwrap(), &perfil, &catalogos, "2024-03").unwrap();
    let b = extraer_libro(&leer_libro(&bytes).unwrap(), &perfil, &catalogos, "2024-03").unwrap();
    assert_eq!(a, b);
    assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
}

#[test]
fn encabezado_se_busca_debajo_de_los_titulos() {
    let bytes = libro_matinal();
    let hojas = leer_libro(&bytes).unwrap();
    let matinal = hojas.iter().find(|h| h.nombre == "Matinal").unwrap();
    let catalogos = Catalogos::default();
    let perfil = Perfil::matinal();
    let idx = find_header_row(&matinal.filas, &perfil.encabezado, &catalogos.encabezados).unwrap();
    assert_eq!(idx, 1);
    assert_eq!(extraer_filas(matinal, idx, &perfil, &catalogos, "2024-03").len(), 4);
}
