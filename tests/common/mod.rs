//! Utilidades compartidas por los tests de integración: libros xlsx armados en
//! memoria, relojes fijos y usuarios de prueba.
#![allow(dead_code)]

use std::io::{Cursor, Write};

use chrono::{NaiveDate, NaiveDateTime};
use plan_comercial::db::{Almacen, SqliteAlmacen};
use plan_comercial::models::{NuevoUsuario, Usuario};
use zip::write::FileOptions;
use zip::CompressionMethod;

fn escapar(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn columna(mut idx: usize) -> String {
    let mut letras = Vec::new();
    loop {
        letras.push((b'A' + (idx % 26) as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letras.iter().rev().collect()
}

fn hoja_xml(filas: &[&[&str]]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (i, fila) in filas.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, i + 1));
        for (j, valor) in fila.iter().enumerate() {
            if valor.is_empty() {
                continue;
            }
            xml.push_str(&format!(
                r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                columna(j),
                i + 1,
                escapar(valor)
            ));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Arma un .xlsx mínimo con una hoja por entrada, todas las celdas como texto.
pub fn libro_xlsx(hojas: &[(&str, &[&[&str]])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let opciones = FileOptions::default().compression_method(CompressionMethod::Stored);

    let mut tipos = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    let mut hojas_wb = String::new();
    let mut rels_wb = String::new();
    for (i, (nombre, _)) in hojas.iter().enumerate() {
        let n = i + 1;
        tipos.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            n
        ));
        hojas_wb.push_str(&format!(r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#, escapar(nombre), n, n));
        rels_wb.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            n, n
        ));
    }
    tipos.push_str("</Types>");

    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{}</sheets></workbook>"#,
        hojas_wb
    );
    let workbook_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        rels_wb
    );
    let root_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

    let mut escribir = |ruta: &str, contenido: &str| {
        zip.start_file(ruta, opciones).unwrap();
        zip.write_all(contenido.as_bytes()).unwrap();
    };
    escribir("[Content_Types].xml", &tipos);
    escribir("_rels/.rels", root_rels);
    escribir("xl/workbook.xml", &workbook);
    escribir("xl/_rels/workbook.xml.rels", &workbook_rels);
    for (i, (_, filas)) in hojas.iter().enumerate() {
        escribir(&format!("xl/worksheets/sheet{}.xml", i + 1), &hoja_xml(filas));
    }

    zip.finish().unwrap().into_inner()
}

/// Lunes 4 de marzo de 2024, 10:00.
pub fn lunes() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(10, 0, 0).unwrap()
}

/// Martes 5 de marzo de 2024, 10:00.
pub fn martes() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(10, 0, 0).unwrap()
}

pub fn crear_usuario(almacen: &dyn Almacen, email: &str, role: &str, promotor: Option<&str>) -> Usuario {
    almacen
        .crear_usuario(&NuevoUsuario {
            email: email.to_string(),
            password: "clave".to_string(),
            role: role.to_string(),
            promotor_nombre: promotor.map(String::from),
        })
        .unwrap()
}

pub fn almacen() -> SqliteAlmacen {
    SqliteAlmacen::en_memoria().unwrap()
}

/// Planilla CNC del escenario base: una fila de Juan Perez los lunes.
pub fn libro_cnc_ung() -> Vec<u8> {
    libro_xlsx(&[(
        "CNC UNG",
        &[
            &["Codigo", "Cliente", "Promotor", "Dia"],
            &["001", "Kiosco Sur", "Juan Perez", "Lunes"],
        ],
    )])
}
