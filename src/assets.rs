//! Activos y patrimonio: valor de la tierra, precio por hectárea, campo + cría.

use serde::Serialize;

use crate::csv_parser::Record;
use crate::facts::FactIndex;
use crate::models::{FactKind, ProducerSnapshot};
use crate::query::col;

const FIELD_PREFIX: &str = "Campo_";

/// Escenarios de variación del valor del stock: (período, factor sobre el valor actual).
pub const STOCK_SCENARIOS: [(&str, f64); 4] = [
    ("Actual", 1.0),
    ("5 años", 0.85),
    ("10 años", 0.75),
    ("20 años", 0.6),
];

/// Campos (`Categoria` con prefijo `Campo_`) presentes en los activos, sin repetir.
pub fn available_fields(rows: &[&Record]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for categoria in rows.iter().filter_map(|r| r.get(col::CATEGORIA)) {
        if categoria.starts_with(FIELD_PREFIX) && !out.iter().any(|c| c == categoria) {
            out.push(categoria.to_string());
        }
    }
    out
}

/// Con un campo elegido se conservan sus hechos y los que no son de ningún campo.
pub fn filter_by_field<'a>(rows: &[&'a Record], campo: Option<&str>) -> Vec<&'a Record> {
    match campo {
        None => rows.to_vec(),
        Some(campo) => rows
            .iter()
            .copied()
            .filter(|r| {
                let categoria = r.get(col::CATEGORIA).unwrap_or("");
                categoria == campo || !categoria.starts_with(FIELD_PREFIX)
            })
            .collect(),
    }
}

/// Activos totales = valor promedio de la tierra + valor del stock ganadero.
pub fn total_assets(activos: &FactIndex, snapshot: Option<&ProducerSnapshot>) -> f64 {
    activos.value_by_sub(&FactKind::ValorTierraSimple, "Valor_Final_Promedio")
        + snapshot.map_or(0.0, |s| s.valor_stock_total)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuaranteePeriod {
    pub periodo: &'static str,
    pub valor_stock: f64,
    pub stock_cria: f64,
    pub campo_plus_cria: f64,
    pub activos_total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssetsView {
    pub campos: Vec<String>,
    pub campo_seleccionado: Option<String>,
    pub ha_agricolas_propias: f64,
    pub ha_no_agricolas_propias: f64,
    pub ha_propias_totales: f64,
    pub valor_tierra_promedio: f64,
    pub valor_tierra_minimo: f64,
    pub usd_ha_agricola: f64,
    pub usd_ha_no_agricola: f64,
    pub valuacion_agricola_propias: f64,
    pub valuacion_no_agricola_propias: f64,
    pub valuacion_total_propias: f64,
    pub valor_campo_plus_cria: f64,
    /// Nivel de riesgo hídrico (`Riesgo_Alto` -> `ALTO`), si hay análisis.
    pub riesgo_hidrico: Option<String>,
    pub valor_stock_total: f64,
    pub valor_stock_cria: f64,
    pub garantias_por_periodo: Vec<GuaranteePeriod>,
}

impl AssetsView {
    pub fn build(
        rows: &[&Record],
        snapshot: Option<&ProducerSnapshot>,
        campo: Option<&str>,
    ) -> Self {
        let filtered = filter_by_field(rows, campo);
        let index = FactIndex::build(filtered.iter().copied());

        let ha_agricolas = snapshot.map_or(0.0, |s| s.ha_agricolas_propias);
        let ha_no_agricolas = snapshot.map_or(0.0, |s| s.ha_no_agricolas_propias);
        let valor_stock_total = snapshot.map_or(0.0, |s| s.valor_stock_total);
        let valor_stock_cria = snapshot.map_or(0.0, |s| s.valor_stock_cria);

        let tierra_promedio =
            index.value_by_sub(&FactKind::ValorTierraSimple, "Valor_Final_Promedio");
        let usd_agricola =
            index.value_by_sub(&FactKind::PrecioHectareaAgricolaSimple, "USD_Por_Ha_Agricola");
        let usd_no_agricola =
            index.value_by_sub(&FactKind::PrecioHectareaNoAgricolaSimple, "USD_Por_Ha_No_Agricola");

        let riesgo_hidrico = index.of_kind(&FactKind::AnalisisRiesgoHidrico).next().map(|f| {
            f.categoria
                .as_deref()
                .map(|c| c.replace("Riesgo_", "").to_uppercase())
                .unwrap_or_else(|| "EVALUANDO".to_string())
        });

        let garantias_por_periodo = STOCK_SCENARIOS
            .iter()
            .map(|&(periodo, factor)| {
                let valor_stock = valor_stock_total * factor;
                // El stock de cría sigue la misma proporción que el total.
                let stock_cria = if valor_stock_total > 0.0 {
                    valor_stock_cria * factor
                } else {
                    0.0
                };
                GuaranteePeriod {
                    periodo,
                    valor_stock,
                    stock_cria,
                    campo_plus_cria: tierra_promedio + stock_cria,
                    activos_total: tierra_promedio + valor_stock,
                }
            })
            .collect();

        let valuacion_agricola = ha_agricolas * usd_agricola;
        let valuacion_no_agricola = ha_no_agricolas * usd_no_agricola;

        Self {
            campos: available_fields(rows),
            campo_seleccionado: campo.map(str::to_string),
            ha_agricolas_propias: ha_agricolas,
            ha_no_agricolas_propias: ha_no_agricolas,
            ha_propias_totales: ha_agricolas + ha_no_agricolas,
            valor_tierra_promedio: tierra_promedio,
            valor_tierra_minimo: index
                .value_by_sub(&FactKind::ValorTierraSimple, "Valor_Final_Minimo"),
            usd_ha_agricola: usd_agricola,
            usd_ha_no_agricola: usd_no_agricola,
            valuacion_agricola_propias: valuacion_agricola,
            valuacion_no_agricola_propias: valuacion_no_agricola,
            valuacion_total_propias: valuacion_agricola + valuacion_no_agricola,
            valor_campo_plus_cria: index.value(&FactKind::ValorCampoPlusCria, "TIERRA_PLUS_CRIA"),
            riesgo_hidrico,
            valor_stock_total,
            valor_stock_cria,
            garantias_por_periodo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_parser::parse_csv;

    const ACTIVOS: &str = "CUIT,Tipo_Dato,Categoria,Subcategoria,Valor_Numerico\n\
        30,Valor_Tierra_Simple,Campo_Norte,Valor_Final_Promedio,2000000\n\
        30,Valor_Tierra_Simple,Campo_Sur,Valor_Final_Promedio,500000\n\
        30,Valor_Tierra_Simple,Campo_Sur,Valor_Final_Minimo,400000\n\
        30,Precio_Hectarea_Agricola_Simple,General,USD_Por_Ha_Agricola,8000\n\
        30,Precio_Hectarea_No_Agricola_Simple,General,USD_Por_Ha_No_Agricola,3000\n\
        30,Valor_Campo_Plus_Cria,TIERRA_PLUS_CRIA,,2500000\n\
        30,Analisis_Riesgo_Hidrico,Riesgo_Bajo,,\n";

    fn snapshot() -> ProducerSnapshot {
        ProducerSnapshot {
            ha_agricolas_propias: 100.0,
            ha_no_agricolas_propias: 50.0,
            valor_stock_total: 1_000_000.0,
            valor_stock_cria: 400_000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_field_filter_keeps_non_field_facts() {
        let rows = parse_csv(ACTIVOS);
        let refs: Vec<&Record> = rows.iter().collect();
        assert_eq!(available_fields(&refs), vec!["Campo_Norte", "Campo_Sur"]);
        assert_eq!(filter_by_field(&refs, None).len(), 7);
        assert_eq!(filter_by_field(&refs, Some("Campo_Sur")).len(), 6);
    }

    #[test]
    fn test_view_all_fields() {
        let rows = parse_csv(ACTIVOS);
        let refs: Vec<&Record> = rows.iter().collect();
        let snap = snapshot();
        let view = AssetsView::build(&refs, Some(&snap), None);

        assert_eq!(view.valor_tierra_promedio, 2_000_000.0);
        assert_eq!(view.valuacion_total_propias, 950_000.0);
        assert_eq!(view.valor_campo_plus_cria, 2_500_000.0);
        assert_eq!(view.riesgo_hidrico.as_deref(), Some("BAJO"));
        assert_eq!(view.garantias_por_periodo[0].activos_total, 3_000_000.0);
        assert_eq!(view.garantias_por_periodo[3].valor_stock, 600_000.0);
    }

    #[test]
    fn test_view_selected_field() {
        let rows = parse_csv(ACTIVOS);
        let refs: Vec<&Record> = rows.iter().collect();
        let view = AssetsView::build(&refs, None, Some("Campo_Sur"));
        assert_eq!(view.valor_tierra_promedio, 500_000.0);
        assert_eq!(view.valor_tierra_minimo, 400_000.0);
        assert_eq!(view.usd_ha_agricola, 8000.0);
        assert_eq!(view.garantias_por_periodo[2].stock_cria, 0.0);
    }

    #[test]
    fn test_total_assets() {
        let rows = parse_csv(ACTIVOS);
        let index = FactIndex::build(&rows);
        let snap = snapshot();
        assert_eq!(total_assets(&index, Some(&snap)), 3_000_000.0);
        assert_eq!(total_assets(&FactIndex::default(), None), 0.0);
    }
}
