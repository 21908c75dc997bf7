use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::commands::print_banner;
use crate::csv_parser::{parse_csv_with_stats, Record};
use crate::file_utils::{format_bytes, get_file_size};
use crate::query::col;

/// Conteo de registros por `Tipo_Dato`, ordenado por nombre.
pub fn tipo_dato_counts(records: &[Record]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for tipo in records.iter().filter_map(|r| r.get(col::TIPO_DATO)).filter(|t| !t.is_empty()) {
        *counts.entry(tipo.to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn inspeccionar(path: &Path) -> Result<(), Box<dyn Error>> {
    let size = get_file_size(path)?;
    let text = fs::read_to_string(path)?;
    let (records, stats) = parse_csv_with_stats(&text);

    print_banner("Inspección de archivo CSV");
    println!("📄 Archivo: {}", path.display());
    println!("💾 Tamaño: {}", format_bytes(size));
    println!();

    println!("📊 Líneas: {}", stats.lines);
    println!("   En blanco: {}", stats.blank_lines);
    println!("   Registros: {}", stats.records);
    println!("   Filas cortas (completadas con vacío): {}", stats.short_rows);
    println!("   Filas largas (celdas extra descartadas): {}", stats.long_rows);
    println!();

    match records.first() {
        Some(first) => {
            println!("📋 Headers ({}):", first.headers().len());
            for (i, h) in first.headers().iter().enumerate() {
                println!("   [{}] {}", i, h);
            }
        }
        None => println!("❌ Sin registros de datos"),
    }
    println!();

    let tipos = tipo_dato_counts(&records);
    if !tipos.is_empty() {
        println!("🏷️  Tipo_Dato ({} distintos):", tipos.len());
        for (tipo, count) in &tipos {
            println!("   {:<45} {}", tipo, count);
        }
    }

    if stats.short_rows == 0 && stats.long_rows == 0 {
        println!("✅ Todas las filas coinciden con el header");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_parser::parse_csv;

    #[test]
    fn test_tipo_dato_counts() {
        let records = parse_csv(
            "CUIT,Tipo_Dato\n30,Score_Crediticio\n30,Nivel_MODERADO\n27,Score_Crediticio\n27,\n",
        );
        let counts = tipo_dato_counts(&records);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["Score_Crediticio"], 2);
    }

    #[test]
    fn test_inspeccionar_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Crediticio.csv");
        fs::write(&path, "CUIT,Tipo_Dato\n30,Score_Crediticio\n").unwrap();
        assert!(inspeccionar(&path).is_ok());
        assert!(inspeccionar(&dir.path().join("no_existe.csv")).is_err());
    }
}
