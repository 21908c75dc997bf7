//! Datos ganaderos: hectáreas no agrícolas, composición del rodeo, precios,
//! ingresos/costos y valuaciones históricas.

use serde::Serialize;

use crate::csv_parser::Record;
use crate::models::ProducerSnapshot;
use crate::query::{self, col, filter_by_tipo, filter_by_tipo_prefix, pct};

/// Cantidad de valuaciones históricas que se muestran.
const MAX_HISTORICAS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAmount {
    pub categoria: String,
    pub valor: f64,
    /// Participación sobre el total de referencia, en %.
    pub porcentaje: f64,
}

/// Etiqueta de un hecho: Categoria, o Subcategoria si está vacía.
fn label(record: &Record) -> String {
    query::text(record, col::CATEGORIA)
        .or_else(|| query::text(record, col::SUBCATEGORIA))
        .unwrap_or("")
        .to_string()
}

fn value(record: &Record) -> f64 {
    query::numeric_or_zero(record, col::VALOR_NUMERICO)
}

fn amounts(rows: &[&Record], total: f64) -> Vec<CategoryAmount> {
    rows.iter()
        .map(|r| CategoryAmount {
            categoria: label(r),
            valor: value(r),
            porcentaje: pct(value(r), total),
        })
        .collect()
}

fn first_value(rows: &[&Record]) -> f64 {
    rows.first().map_or(0.0, |r| value(r))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentArea {
    pub departamento: String,
    pub provincia: String,
    pub tenencia: String,
    pub hectareas: f64,
    /// Sobre las hectáreas no agrícolas de la misma tenencia.
    pub porcentaje: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricValuation {
    pub titulo: String,
    pub valor: f64,
}

fn is_historic(record: &Record) -> bool {
    let contains =
        |field: &str, needle: &str| record.get(field).is_some_and(|v| v.contains(needle));
    matches!(
        record.get(col::TIPO_DATO),
        Some("Valuacion_Stock_Total_Historica") | Some("Valuacion_Stock_Cria_Historica")
    ) || contains(col::CATEGORIA, "Historica")
        || contains(col::SUBCATEGORIA, "Anos")
        || contains(col::DETALLE, "Anos")
}

fn historic_title(record: &Record) -> String {
    let detalle = record.get(col::DETALLE).unwrap_or("");
    if detalle.contains('5') {
        "5 años".to_string()
    } else if detalle.contains("10") {
        "10 años".to_string()
    } else if detalle.contains("20") {
        "20 años".to_string()
    } else {
        query::text(record, col::SUBCATEGORIA).unwrap_or(detalle).to_string()
    }
}

/// Valuaciones históricas del stock total (hasta tres).
pub fn historic_valuations(rows: &[&Record]) -> Vec<HistoricValuation> {
    rows.iter()
        .filter(|r| is_historic(r))
        .filter(|r| r.get(col::TIPO_DATO).is_some_and(|t| t.contains("Stock_Total")))
        .take(MAX_HISTORICAS)
        .map(|r| HistoricValuation {
            titulo: historic_title(r),
            valor: value(r),
        })
        .collect()
}

/// Precios por categoría; con etiquetas repetidas queda el último valor.
pub fn category_prices(rows: &[&Record]) -> Vec<CategoryAmount> {
    let mut out: Vec<CategoryAmount> = Vec::new();
    for r in filter_by_tipo_prefix(rows.iter().copied(), "Precio_Categoria_") {
        let categoria = label(r);
        let valor = value(r);
        match out.iter_mut().find(|p| p.categoria == categoria) {
            Some(existing) => existing.valor = valor,
            None => out.push(CategoryAmount { categoria, valor, porcentaje: 0.0 }),
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LivestockView {
    pub ha_no_agricolas_totales: f64,
    pub ha_no_agricolas_propias: f64,
    pub ha_no_agricolas_alquiladas: f64,
    pub carga_animal: f64,
    pub cabezas_totales: i64,
    pub stock_cria: i64,
    /// Cabezas totales menos stock de cría.
    pub stock_engorde: i64,
    pub pct_cria: f64,
    pub pct_engorde: f64,
    pub valor_stock_total: f64,
    pub valor_stock_cria: f64,
    pub inventario: Vec<CategoryAmount>,
    pub cria_detalle: Vec<CategoryAmount>,
    pub engorde_detalle: Vec<CategoryAmount>,
    pub precios: Vec<CategoryAmount>,
    pub ingresos: f64,
    pub costos: f64,
    pub margen: f64,
    pub costos_por_tipo: Vec<CategoryAmount>,
    pub ha_por_departamento: Vec<DepartmentArea>,
    pub valuaciones_historicas: Vec<HistoricValuation>,
}

impl LivestockView {
    pub fn build(rows: &[&Record], snapshot: Option<&ProducerSnapshot>) -> Self {
        let Some(s) = snapshot else {
            return Self::default();
        };

        let tipo = |t: &str| filter_by_tipo(rows.iter().copied(), t);
        let prefix = |p: &str| filter_by_tipo_prefix(rows.iter().copied(), p);

        // Los conteos vienen de casts saturados; la resta no puede desbordar
        let stock_engorde = s.cabezas_totales.saturating_sub(s.stock_cria_cabezas);
        let cabezas = s.cabezas_totales as f64;

        let costos_por_tipo = tipo("Costos_Por_Tipo");
        let total_costos: f64 = costos_por_tipo.iter().map(|r| value(r)).sum();

        let ha_por_departamento = tipo("Ha_No_Agricolas_Departamento")
            .into_iter()
            .filter(|r| matches!(r.get(col::CATEGORIA), Some("Propios") | Some("Alquilados")))
            .map(|r| {
                let tenencia = r.get(col::CATEGORIA).unwrap_or("").to_string();
                let base = if tenencia == "Propios" {
                    s.ha_no_agricolas_propias
                } else {
                    s.ha_no_agricolas_alquiladas
                };
                DepartmentArea {
                    departamento: r.get(col::DEPARTAMENTO).unwrap_or("").to_string(),
                    provincia: r.get(col::PROVINCIA).unwrap_or("").to_string(),
                    hectareas: value(r),
                    porcentaje: pct(value(r), base),
                    tenencia,
                }
            })
            .collect();

        Self {
            ha_no_agricolas_totales: s.ha_no_agricolas_totales,
            ha_no_agricolas_propias: s.ha_no_agricolas_propias,
            ha_no_agricolas_alquiladas: s.ha_no_agricolas_alquiladas,
            carga_animal: first_value(&tipo("Carga_Animal")),
            cabezas_totales: s.cabezas_totales,
            stock_cria: s.stock_cria_cabezas,
            stock_engorde,
            pct_cria: pct(s.stock_cria_cabezas as f64, cabezas),
            pct_engorde: pct(stock_engorde as f64, cabezas),
            valor_stock_total: s.valor_stock_total,
            valor_stock_cria: s.valor_stock_cria,
            inventario: amounts(&prefix("Inventario_Total_"), cabezas),
            cria_detalle: amounts(&prefix("Destinadas_Cria_"), s.stock_cria_cabezas as f64),
            engorde_detalle: amounts(&prefix("Disponibles_Engorde_"), stock_engorde as f64),
            precios: category_prices(rows),
            ingresos: first_value(&tipo("Ingresos_Totales")),
            costos: first_value(&tipo("Costos_Totales")),
            margen: first_value(&tipo("Margen_Bruto")),
            costos_por_tipo: amounts(&costos_por_tipo, total_costos),
            ha_por_departamento,
            valuaciones_historicas: historic_valuations(rows),
        }
    }

    /// Sin hectáreas no agrícolas ni cabezas: el productor es solo agrícola.
    pub fn has_activity(&self) -> bool {
        self.ha_no_agricolas_totales != 0.0 || self.cabezas_totales != 0
    }
}
