//! Vista completa de un productor y directorio de productores.

use serde::Serialize;
use tracing::debug;

use crate::agriculture::{AgricultureFilters, AgricultureView};
use crate::assets::{self, AssetsView};
use crate::credit::{CreditView, RiskProfile};
use crate::csv_parser::Record;
use crate::facts::FactIndex;
use crate::geo::{parse_polygon_cell, Polygon};
use crate::livestock::LivestockView;
use crate::loader::DataSet;
use crate::models::{Cuit, ProducerEntry, ProducerSnapshot};
use crate::query::{self, col, filter_by_producer};

/// Cantidad máxima de sugerencias de búsqueda.
pub const MAX_SUGGESTIONS: usize = 5;

/// Opciones de armado de la vista.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewOptions {
    pub perfil: RiskProfile,
    pub campo: Option<String>,
    pub agricultura: AgricultureFilters,
}

impl From<RiskProfile> for ViewOptions {
    fn from(perfil: RiskProfile) -> Self {
        Self {
            perfil,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProducerView {
    pub cuit: Cuit,
    pub snapshot: Option<ProducerSnapshot>,
    pub credito: CreditView,
    pub agricultura: AgricultureView,
    pub ganaderia: LivestockView,
    pub activos: AssetsView,
    pub poligonos_propios: Vec<Polygon>,
    pub poligonos_alquilados: Vec<Polygon>,
}

impl ProducerView {
    /// Arma la vista con filtros por defecto.
    pub fn build(data: &DataSet, cuit: &Cuit, perfil: RiskProfile) -> Self {
        Self::build_with(data, cuit, &ViewOptions::from(perfil))
    }

    /// Nunca falla: un productor inexistente da `snapshot: None` y secciones en cero.
    pub fn build_with(data: &DataSet, cuit: &Cuit, options: &ViewOptions) -> Self {
        let id = cuit.as_str();
        let snapshot = data
            .general
            .iter()
            .find(|r| r.get(col::CUIT) == Some(id))
            .map(ProducerSnapshot::from_record);

        let crediticio = filter_by_producer(&data.crediticio, id);
        let agricultura = filter_by_producer(&data.agricultura, id);
        let rotacion = filter_by_producer(&data.rotacion, id);
        let ganaderia = filter_by_producer(&data.ganaderia, id);
        let activos = filter_by_producer(&data.activos, id);

        debug!(
            cuit = id,
            general = snapshot.is_some(),
            crediticio = crediticio.len(),
            agricultura = agricultura.len(),
            rotacion = rotacion.len(),
            ganaderia = ganaderia.len(),
            activos = activos.len(),
            "registros del productor"
        );

        let credit_index = FactIndex::build(crediticio.iter().copied());
        let assets_index = FactIndex::build(activos.iter().copied());
        let activos_totales = assets::total_assets(&assets_index, snapshot.as_ref());

        let (poligonos_propios, poligonos_alquilados) = snapshot.as_ref().map_or_else(
            || (Vec::new(), Vec::new()),
            |s| {
                (
                    parse_polygon_cell(&s.coordenadas_propios_json),
                    parse_polygon_cell(&s.coordenadas_alquilados_json),
                )
            },
        );

        Self {
            cuit: cuit.clone(),
            credito: CreditView::build(&credit_index, activos_totales, options.perfil),
            agricultura: AgricultureView::build(
                &agricultura,
                &rotacion,
                snapshot.as_ref(),
                &options.agricultura,
            ),
            ganaderia: LivestockView::build(&ganaderia, snapshot.as_ref()),
            activos: AssetsView::build(&activos, snapshot.as_ref(), options.campo.as_deref()),
            poligonos_propios,
            poligonos_alquilados,
            snapshot,
        }
    }

    pub fn razon_social(&self) -> &str {
        self.snapshot
            .as_ref()
            .map_or(query::NOT_AVAILABLE, |s| s.razon_social.as_str())
    }
}

fn entry(record: &Record) -> Option<ProducerEntry> {
    let cuit = query::text(record, col::CUIT)?;
    let razon_social = query::text(record, "Razon_Social")?;
    Some(ProducerEntry {
        cuit: Cuit::new(cuit),
        razon_social: razon_social.to_string(),
    })
}

/// Pares (CUIT, razón social) de la tabla General; se omiten filas sin alguno de los dos.
pub fn directory(data: &DataSet) -> Vec<ProducerEntry> {
    data.general.iter().filter_map(entry).collect()
}

/// Productores cuyo nombre (sin distinguir mayúsculas) o CUIT contienen el término.
pub fn search<'a>(entries: &'a [ProducerEntry], term: &str) -> Vec<&'a ProducerEntry> {
    if term.is_empty() {
        return entries.iter().collect();
    }
    let term_lower = term.to_lowercase();
    entries
        .iter()
        .filter(|e| {
            e.razon_social.to_lowercase().contains(&term_lower) || e.cuit.as_str().contains(term)
        })
        .collect()
}

/// Primeras coincidencias para autocompletar; vacío sin término.
pub fn suggestions<'a>(entries: &'a [ProducerEntry], term: &str) -> Vec<&'a ProducerEntry> {
    if term.is_empty() {
        return Vec::new();
    }
    search(entries, term).into_iter().take(MAX_SUGGESTIONS).collect()
}
