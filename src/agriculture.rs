//! Datos agrícolas: ingresos por tenencia, cultivos por tenencia y rotación.

use serde::Serialize;

use crate::csv_parser::Record;
use crate::models::{ProducerSnapshot, Tenencia};
use crate::query::{self, aggregate_by_key, pct};

const TIPO_ANALISIS: &str = "Tipo_Analisis";
const CULTIVO: &str = "Cultivo";
const TENENCIA: &str = "Tenencia";
const HA_PROMEDIO_ANUAL: &str = "Ha_Promedio_Anual";
const INGRESO_NETO: &str = "Ingreso_Neto_Total";

// Campos sumados por grupo de cultivo, en este orden.
const CROP_FIELDS: [&str; 7] = [
    "Ha_Superficie",
    "Ingreso_Bruto_Total",
    INGRESO_NETO,
    "Rendimiento_5_Anos_Tn_Ha",
    "Rendimiento_10_Anos_Tn_Ha",
    "Rendimiento_2_Peores_Anos_Tn_Ha",
    "KM_Ponderados_Superficie",
];

fn is_marker(value: &str) -> bool {
    matches!(value, "TODOS" | "todos" | "TODAS" | "todas")
}

fn cell<'a>(record: &'a Record, field: &str) -> &'a str {
    record.get(field).unwrap_or("")
}

/// Filtros opcionales; `None` equivale a "todos".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgricultureFilters {
    pub tenencia: Option<String>,
    pub cultivo: Option<String>,
    pub rotacion_provincia: Option<String>,
    pub rotacion_tenencia: Option<String>,
}

fn passes(filter: &Option<String>, value: &str) -> bool {
    filter.as_deref().map_or(true, |f| f == value)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TenureIncome {
    pub propios: f64,
    pub alquilados: f64,
    pub total: f64,
}

/// Ingreso neto por tenencia a partir de las filas `Resumen_Tenencia` / `TODOS`.
pub fn tenure_income(rows: &[&Record]) -> TenureIncome {
    let resumen = |tenencia: Tenencia| {
        rows.iter()
            .find(|r| {
                cell(r, TIPO_ANALISIS) == "Resumen_Tenencia"
                    && cell(r, CULTIVO) == "TODOS"
                    && Tenencia::parse(cell(r, TENENCIA)) == tenencia
            })
            .map_or(0.0, |r| query::numeric_or_zero(r, INGRESO_NETO))
    };
    let propios = resumen(Tenencia::Propios);
    let alquilados = resumen(Tenencia::Alquilados);
    TenureIncome {
        propios,
        alquilados,
        total: propios + alquilados,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropSummary {
    pub cultivo: String,
    pub tenencia: Tenencia,
    pub provincia: String,
    pub departamento: String,
    pub hectareas: f64,
    pub ingreso_bruto: f64,
    pub ingreso_neto: f64,
    pub rendimiento_5: f64,
    pub rendimiento_10: f64,
    pub rendimiento_peor: f64,
    pub distancia_promedio: f64,
    /// Neto / bruto × 100; 0 sin ingreso bruto.
    pub margen: f64,
    pub registros: usize,
}

fn is_productive_detail(record: &Record) -> bool {
    let superficie = query::numeric_or_zero(record, CROP_FIELDS[0]);
    let rend5 = query::numeric_or_zero(record, CROP_FIELDS[3]);
    let rend10 = query::numeric_or_zero(record, CROP_FIELDS[4]);
    cell(record, TIPO_ANALISIS) == "Detalle_Cultivo_Tenencia"
        && !matches!(cell(record, CULTIVO), "TODOS" | "todos")
        && superficie > 0.0
        && (rend5 > 0.0 || rend10 > 0.0)
}

/// Agrupa el detalle por cultivo + tenencia.
pub fn crop_summaries(rows: &[&Record]) -> Vec<CropSummary> {
    let detail: Vec<&Record> = rows.iter().copied().filter(|r| is_productive_detail(r)).collect();
    let groups = aggregate_by_key(
        detail.iter().copied(),
        |r| (cell(r, CULTIVO).to_string(), cell(r, TENENCIA).to_string()),
        &CROP_FIELDS,
    );

    groups
        .into_iter()
        .map(|g| {
            let (cultivo, tenencia) = &g.key;
            let first = detail
                .iter()
                .find(|r| cell(r, CULTIVO) == cultivo && cell(r, TENENCIA) == tenencia);
            CropSummary {
                provincia: first.map_or("", |r| cell(r, "Provincia")).to_string(),
                departamento: first.map_or("", |r| cell(r, "Departamento")).to_string(),
                hectareas: g.sum(0),
                ingreso_bruto: g.sum(1),
                ingreso_neto: g.sum(2),
                rendimiento_5: g.mean(3),
                rendimiento_10: g.mean(4),
                rendimiento_peor: g.mean(5),
                distancia_promedio: g.mean(6),
                margen: g.ratio(2, 1).map_or(0.0, |r| r * 100.0),
                registros: g.count,
                tenencia: Tenencia::parse(tenencia),
                cultivo: cultivo.clone(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CropTotals {
    pub hectareas: f64,
    pub ingreso_bruto: f64,
    pub ingreso_neto: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaShare {
    pub nombre: String,
    pub hectareas: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rotation {
    pub provincias: Vec<String>,
    pub tenencias: Vec<String>,
    pub por_cultivo: Vec<AreaShare>,
    pub por_departamento: Vec<AreaShare>,
}

fn distinct(rows: &[&Record], field: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in rows.iter().map(|r| cell(r, field)).filter(|v| !v.is_empty()) {
        if !out.iter().any(|o| o == value) {
            out.push(value.to_string());
        }
    }
    out
}

/// Hectáreas promedio anuales por cultivo (descarta los de menos de 1 %) y por departamento.
pub fn rotation(
    rows: &[&Record],
    provincia: &Option<String>,
    tenencia: &Option<String>,
) -> Rotation {
    let clean: Vec<&Record> = rows
        .iter()
        .copied()
        .filter(|r| {
            !is_marker(cell(r, CULTIVO))
                && !is_marker(cell(r, "Provincia"))
                && !is_marker(cell(r, "Departamento"))
        })
        .collect();

    let filtered: Vec<&Record> = clean
        .iter()
        .copied()
        .filter(|r| passes(provincia, cell(r, "Provincia")) && passes(tenencia, cell(r, TENENCIA)))
        .filter(|r| query::numeric_or_zero(r, HA_PROMEDIO_ANUAL) > 1.0)
        .collect();

    let by = |field: &'static str| {
        aggregate_by_key(
            filtered.iter().copied(),
            |r| cell(r, field).to_string(),
            &[HA_PROMEDIO_ANUAL],
        )
        .into_iter()
        .map(|g| AreaShare {
            hectareas: g.sum(0),
            nombre: g.key,
        })
        .filter(|a| a.hectareas > 0.0)
        .collect::<Vec<_>>()
    };

    // Cultivos en orden de aparición; se descartan los de menos del 1%
    let cultivos = by(CULTIVO);
    let total: f64 = cultivos.iter().map(|c| c.hectareas).sum();
    let por_cultivo = cultivos
        .into_iter()
        .filter(|c| c.hectareas / total >= 0.01)
        .collect();

    // Departamentos de mayor a menor superficie
    let mut por_departamento = by("Departamento");
    por_departamento.sort_by(|a, b| b.hectareas.total_cmp(&a.hectareas));

    Rotation {
        provincias: distinct(&clean, "Provincia"),
        tenencias: distinct(&clean, TENENCIA),
        por_cultivo,
        por_departamento,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgricultureView {
    pub ha_propias: f64,
    pub ha_alquiladas: f64,
    pub pct_propias: f64,
    pub pct_alquiladas: f64,
    pub ingresos: TenureIncome,
    pub cultivos: Vec<CropSummary>,
    pub totales: CropTotals,
    pub flete_propios: f64,
    pub flete_alquilados: f64,
    pub rotacion: Rotation,
}

impl AgricultureView {
    pub fn build(
        cultivos: &[&Record],
        rotacion: &[&Record],
        snapshot: Option<&ProducerSnapshot>,
        filters: &AgricultureFilters,
    ) -> Self {
        let ha_propias = snapshot.map_or(0.0, |s| s.ha_agricolas_propias);
        let ha_alquiladas = snapshot.map_or(0.0, |s| s.ha_agricolas_alquiladas);
        let ha_totales = ha_propias + ha_alquiladas;

        let all = crop_summaries(cultivos);
        let totales = CropTotals {
            hectareas: all.iter().map(|c| c.hectareas).sum(),
            ingreso_bruto: all.iter().map(|c| c.ingreso_bruto).sum(),
            ingreso_neto: all.iter().map(|c| c.ingreso_neto).sum(),
        };
        let cultivos_filtrados = all
            .into_iter()
            .filter(|c| {
                passes(&filters.tenencia, c.tenencia.as_str())
                    && passes(&filters.cultivo, &c.cultivo)
            })
            .collect();

        Self {
            ha_propias,
            ha_alquiladas,
            pct_propias: pct(ha_propias, ha_totales),
            pct_alquiladas: pct(ha_alquiladas, ha_totales),
            ingresos: tenure_income(cultivos),
            cultivos: cultivos_filtrados,
            totales,
            flete_propios: snapshot.map_or(0.0, |s| s.distancia_puerto_propios),
            flete_alquilados: snapshot.map_or(0.0, |s| s.distancia_puerto_alquilados),
            rotacion: rotation(rotacion, &filters.rotacion_provincia, &filters.rotacion_tenencia),
        }
    }
}
