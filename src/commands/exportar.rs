use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;
use tracing::info;

use crate::agriculture::CropSummary;
use crate::commands::print_banner;
use crate::config::{ExportFormat, ViewArgs};
use crate::error::ExportError;
use crate::file_utils::ensure_parent_exists;
use crate::loader::DataSet;
use crate::models::Cuit;
use crate::view::ProducerView;

const CROP_HEADER: [&str; 12] = [
    "Cultivo",
    "Tenencia",
    "Provincia",
    "Departamento",
    "Ha_Superficie",
    "Ingreso_Bruto_Total",
    "Ingreso_Neto_Total",
    "Rend5",
    "Rend10",
    "Rend2Peores",
    "KM_Ponderados_Superficie",
    "Margen_Pct",
];

/// Vista completa como JSON indentado.
pub fn write_json<W: Write>(view: &ProducerView, writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, view)?;
    Ok(())
}

/// Cultivos agregados como CSV, un registro por cultivo y tenencia.
pub fn write_crops_csv<W: Write>(cultivos: &[CropSummary], writer: W) -> Result<(), ExportError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    writer.write_record(CROP_HEADER)?;
    for c in cultivos {
        writer.write_record([
            c.cultivo.clone(),
            c.tenencia.to_string(),
            c.provincia.clone(),
            c.departamento.clone(),
            c.hectareas.to_string(),
            c.ingreso_bruto.to_string(),
            c.ingreso_neto.to_string(),
            c.rendimiento_5.to_string(),
            c.rendimiento_10.to_string(),
            c.rendimiento_peor.to_string(),
            c.distancia_promedio.to_string(),
            format!("{:.2}", c.margen),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn exportar(
    data: &DataSet,
    cuit: &str,
    salida: &Path,
    formato: ExportFormat,
    vista: &ViewArgs,
) -> Result<(), ExportError> {
    let cuit = Cuit::new(cuit);
    let view = ProducerView::build_with(data, &cuit, &vista.options());
    if view.snapshot.is_none() {
        return Err(ExportError::ProducerNotFound(cuit.to_string()));
    }

    ensure_parent_exists(salida)?;
    let mut output = BufWriter::new(File::create(salida)?);
    match formato {
        ExportFormat::Json => write_json(&view, &mut output)?,
        ExportFormat::Csv => write_crops_csv(&view.agricultura.cultivos, &mut output)?,
    }
    output.flush()?;

    info!(cuit = %cuit, salida = %salida.display(), formato = ?formato, "vista exportada");
    print_banner("Exportación");
    println!("🆔 {} ({})", cuit, view.razon_social());
    println!("📝 Archivo: {}", salida.display());
    println!("✅ Exportación completa");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_parser::parse_csv;
    use crate::models::Tenencia;

    fn crop(cultivo: &str, tenencia: Tenencia) -> CropSummary {
        CropSummary {
            cultivo: cultivo.to_string(),
            tenencia,
            provincia: "Buenos Aires".to_string(),
            departamento: "Pergamino, Norte".to_string(),
            hectareas: 100.0,
            ingreso_bruto: 50000.0,
            ingreso_neto: 20000.0,
            rendimiento_5: 3.0,
            rendimiento_10: 2.8,
            rendimiento_peor: 1.9,
            distancia_promedio: 120.0,
            margen: 40.0,
            registros: 1,
        }
    }

    #[test]
    fn test_write_crops_csv_quotes_only_when_needed() {
        let mut out = Vec::new();
        write_crops_csv(&[crop("Soja", Tenencia::Propios)], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Cultivo,Tenencia,Provincia"));
        assert_eq!(
            lines[1],
            "Soja,Propios,Buenos Aires,\"Pergamino, Norte\",100,50000,20000,3,2.8,1.9,120,40.00"
        );
    }

    #[test]
    fn test_exportar_missing_producer() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataSet {
            general: parse_csv("CUIT,Razon_Social\n30,LA MARTA\n"),
            ..Default::default()
        };
        let salida = dir.path().join("x.json");
        let err = exportar(&data, "99", &salida, ExportFormat::Json, &ViewArgs::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::ProducerNotFound(ref c) if c == "99"));
        assert!(!salida.exists());
    }

    #[test]
    fn test_exportar_json_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataSet {
            general: parse_csv("CUIT,Razon_Social,Valor_Stock_Total\n30,LA MARTA,1000\n"),
            ..Default::default()
        };
        let salida = dir.path().join("salidas").join("30.json");
        exportar(&data, "30", &salida, ExportFormat::Json, &ViewArgs::default()).unwrap();

        let text = std::fs::read_to_string(&salida).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["cuit"], "30");
        assert_eq!(json["snapshot"]["razon_social"], "LA MARTA");
        assert_eq!(json["credito"]["garantias"]["activos_totales"], 1000.0);
    }
}
