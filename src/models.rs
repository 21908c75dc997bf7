use std::fmt;

use serde::Serialize;

use crate::csv_parser::Record;
use crate::query::{self, col};

/// CUIT del productor. Es la única clave de join entre tablas (comparación de strings).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Cuit(String);

impl Cuit {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verifica el dígito verificador (módulo 11) de un CUIT de 11 dígitos.
    pub fn has_valid_check_digit(&self) -> bool {
        const WEIGHTS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];

        let digits: Vec<u32> = self.0.chars().filter_map(|c| c.to_digit(10)).collect();
        if digits.len() != 11 || self.0.chars().any(|c| !c.is_ascii_digit() && c != '-') {
            return false;
        }

        let sum: u32 = digits.iter().zip(WEIGHTS.iter()).map(|(d, w)| d * w).sum();
        let expected = match 11 - (sum % 11) {
            11 => 0,
            10 => 9,
            n => n,
        };
        digits[10] == expected
    }
}

impl fmt::Display for Cuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Cuit {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Tipo de tenencia de la tierra.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Tenencia {
    Propios,
    Alquilados,
    Otra(String),
}

impl Tenencia {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Propios" | "propios" | "PROPIOS" => Tenencia::Propios,
            "Alquilados" | "alquilados" | "ALQUILADOS" => Tenencia::Alquilados,
            other => Tenencia::Otra(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Tenencia::Propios => "Propios",
            Tenencia::Alquilados => "Alquilados",
            Tenencia::Otra(s) => s,
        }
    }
}

impl fmt::Display for Tenencia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clase de hecho (columna `Tipo_Dato`).
///
/// Las familias con sufijo variable (`Inventario_Total_<cat>`, etc.) guardan el
/// sufijo; cualquier otro valor queda en `Otro`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum FactKind {
    // Crediticio
    ScoreCrediticio,
    EndeudamientoTotal,
    ChequesRechazados,
    DeudaBancos,
    DetalleBancos,
    ConsultasNosis,
    EvaluacionCrediticia,
    NivelConservador,
    NivelModerado,
    NivelAgresivo,
    RatioServicioActual,
    RatiosCrediticios,
    LimiteActivosTotales,
    RecomendacionCredito,
    // Activos
    ValorTierraSimple,
    PrecioHectareaAgricolaSimple,
    PrecioHectareaNoAgricolaSimple,
    AnalisisRiesgoHidrico,
    ValorCampoPlusCria,
    // Ganadería
    HaNoAgricolasTenencia,
    HaNoAgricolasDepartamento,
    CargaAnimal,
    StockTotalGeneral,
    StockModeloCria,
    StockTotalEngorde,
    ValuacionStockTotal,
    ValuacionStockCria,
    ValuacionStockTotalHistorica,
    ValuacionStockCriaHistorica,
    IngresosTotales,
    CostosTotales,
    MargenBruto,
    CostosPorTipo,
    InventarioTotal(String),
    DestinadasCria(String),
    DisponiblesEngorde(String),
    PrecioCategoria(String),
    Otro(String),
}

const PREFIXED: [(&str, fn(String) -> FactKind); 4] = [
    ("Inventario_Total_", FactKind::InventarioTotal),
    ("Destinadas_Cria_", FactKind::DestinadasCria),
    ("Disponibles_Engorde_", FactKind::DisponiblesEngorde),
    ("Precio_Categoria_", FactKind::PrecioCategoria),
];

impl FactKind {
    pub fn parse(raw: &str) -> Self {
        use FactKind::*;
        match raw {
            "Score_Crediticio" => ScoreCrediticio,
            "Endeudamiento_Total" => EndeudamientoTotal,
            "Cheques_Rechazados" => ChequesRechazados,
            "Deuda_Bancos" => DeudaBancos,
            "Detalle_Bancos" => DetalleBancos,
            "Consultas_Nosis" => ConsultasNosis,
            "Evaluacion_Crediticia" => EvaluacionCrediticia,
            "Nivel_CONSERVADOR" => NivelConservador,
            "Nivel_MODERADO" => NivelModerado,
            "Nivel_AGRESIVO" => NivelAgresivo,
            "Ratio_Servicio_Actual" => RatioServicioActual,
            "Ratios_Crediticios" => RatiosCrediticios,
            "Limite_Activos_Totales" => LimiteActivosTotales,
            "Recomendacion_Credito" => RecomendacionCredito,
            "Valor_Tierra_Simple" => ValorTierraSimple,
            "Precio_Hectarea_Agricola_Simple" => PrecioHectareaAgricolaSimple,
            "Precio_Hectarea_No_Agricola_Simple" => PrecioHectareaNoAgricolaSimple,
            "Analisis_Riesgo_Hidrico" => AnalisisRiesgoHidrico,
            "Valor_Campo_Plus_Cria" => ValorCampoPlusCria,
            "Ha_No_Agricolas_Tenencia" => HaNoAgricolasTenencia,
            "Ha_No_Agricolas_Departamento" => HaNoAgricolasDepartamento,
            "Carga_Animal" => CargaAnimal,
            "Stock_Total_General" => StockTotalGeneral,
            "Stock_Modelo_Cria" => StockModeloCria,
            "Stock_Total_Engorde" => StockTotalEngorde,
            "Valuacion_Stock_Total" => ValuacionStockTotal,
            "Valuacion_Stock_Cria" => ValuacionStockCria,
            "Valuacion_Stock_Total_Historica" => ValuacionStockTotalHistorica,
            "Valuacion_Stock_Cria_Historica" => ValuacionStockCriaHistorica,
            "Ingresos_Totales" => IngresosTotales,
            "Costos_Totales" => CostosTotales,
            "Margen_Bruto" => MargenBruto,
            "Costos_Por_Tipo" => CostosPorTipo,
            other => PREFIXED
                .iter()
                .find_map(|(prefix, make)| {
                    other.strip_prefix(prefix).map(|rest| make(rest.to_string()))
                })
                .unwrap_or_else(|| Otro(other.to_string())),
        }
    }

    /// Valor original de `Tipo_Dato`.
    pub fn tipo_dato(&self) -> String {
        use FactKind::*;
        let fixed = match self {
            ScoreCrediticio => "Score_Crediticio",
            EndeudamientoTotal => "Endeudamiento_Total",
            ChequesRechazados => "Cheques_Rechazados",
            DeudaBancos => "Deuda_Bancos",
            DetalleBancos => "Detalle_Bancos",
            ConsultasNosis => "Consultas_Nosis",
            EvaluacionCrediticia => "Evaluacion_Crediticia",
            NivelConservador => "Nivel_CONSERVADOR",
            NivelModerado => "Nivel_MODERADO",
            NivelAgresivo => "Nivel_AGRESIVO",
            RatioServicioActual => "Ratio_Servicio_Actual",
            RatiosCrediticios => "Ratios_Crediticios",
            LimiteActivosTotales => "Limite_Activos_Totales",
            RecomendacionCredito => "Recomendacion_Credito",
            ValorTierraSimple => "Valor_Tierra_Simple",
            PrecioHectareaAgricolaSimple => "Precio_Hectarea_Agricola_Simple",
            PrecioHectareaNoAgricolaSimple => "Precio_Hectarea_No_Agricola_Simple",
            AnalisisRiesgoHidrico => "Analisis_Riesgo_Hidrico",
            ValorCampoPlusCria => "Valor_Campo_Plus_Cria",
            HaNoAgricolasTenencia => "Ha_No_Agricolas_Tenencia",
            HaNoAgricolasDepartamento => "Ha_No_Agricolas_Departamento",
            CargaAnimal => "Carga_Animal",
            StockTotalGeneral => "Stock_Total_General",
            StockModeloCria => "Stock_Modelo_Cria",
            StockTotalEngorde => "Stock_Total_Engorde",
            ValuacionStockTotal => "Valuacion_Stock_Total",
            ValuacionStockCria => "Valuacion_Stock_Cria",
            ValuacionStockTotalHistorica => "Valuacion_Stock_Total_Historica",
            ValuacionStockCriaHistorica => "Valuacion_Stock_Cria_Historica",
            IngresosTotales => "Ingresos_Totales",
            CostosTotales => "Costos_Totales",
            MargenBruto => "Margen_Bruto",
            CostosPorTipo => "Costos_Por_Tipo",
            InventarioTotal(s) => return format!("Inventario_Total_{}", s),
            DestinadasCria(s) => return format!("Destinadas_Cria_{}", s),
            DisponiblesEngorde(s) => return format!("Disponibles_Engorde_{}", s),
            PrecioCategoria(s) => return format!("Precio_Categoria_{}", s),
            Otro(s) => return s.clone(),
        };
        fixed.to_string()
    }
}

/// Hecho EAV tipado.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fact {
    pub kind: FactKind,
    pub categoria: Option<String>,
    pub subcategoria: Option<String>,
    pub detalle: Option<String>,
    pub valor: Option<f64>,
    pub texto: Option<String>,
    pub provincia: Option<String>,
    pub departamento: Option<String>,
}

fn opt_text(record: &Record, field: &str) -> Option<String> {
    query::text(record, field).map(str::to_string)
}

impl Fact {
    /// `None` cuando la fila no tiene `Tipo_Dato`.
    pub fn from_record(record: &Record) -> Option<Self> {
        let tipo = query::text(record, col::TIPO_DATO)?;
        Some(Self {
            kind: FactKind::parse(tipo),
            categoria: opt_text(record, col::CATEGORIA),
            subcategoria: opt_text(record, col::SUBCATEGORIA),
            detalle: opt_text(record, col::DETALLE),
            valor: query::numeric(record, col::VALOR_NUMERICO),
            texto: opt_text(record, col::VALOR_TEXTO),
            provincia: opt_text(record, col::PROVINCIA),
            departamento: opt_text(record, col::DEPARTAMENTO),
        })
    }

    pub fn value_or_zero(&self) -> f64 {
        self.valor.unwrap_or(0.0)
    }

    pub fn text_or_na(&self) -> &str {
        self.texto.as_deref().unwrap_or(query::NOT_AVAILABLE)
    }

    pub fn categoria_is(&self, value: &str) -> bool {
        self.categoria.as_deref() == Some(value)
    }
}

/// Fila de la tabla General: un registro plano por productor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProducerSnapshot {
    pub cuit: String,
    pub razon_social: String,
    pub ha_totales: f64,
    pub ha_agricolas_totales: f64,
    pub ha_agricolas_propias: f64,
    pub ha_agricolas_alquiladas: f64,
    pub ha_no_agricolas_totales: f64,
    pub ha_no_agricolas_propias: f64,
    pub ha_no_agricolas_alquiladas: f64,
    pub pct_agricolas: f64,
    pub pct_no_agricolas: f64,
    pub pct_agricolas_propias: f64,
    pub pct_agricolas_alquiladas: f64,
    pub pct_no_agricolas_propias: f64,
    pub pct_no_agricolas_alquiladas: f64,
    pub cabezas_totales: i64,
    pub stock_cria_cabezas: i64,
    pub valor_stock_total: f64,
    pub valor_stock_cria: f64,
    pub score_nosis: i64,
    pub endeudamiento: f64,
    pub distancia_puerto_propios: f64,
    pub distancia_puerto_alquilados: f64,
    pub centroide_propios: (f64, f64),
    pub centroide_alquilados: (f64, f64),
    #[serde(skip)]
    pub coordenadas_propios_json: String,
    #[serde(skip)]
    pub coordenadas_alquilados_json: String,
}

impl ProducerSnapshot {
    pub fn from_record(record: &Record) -> Self {
        let num = |field: &str| query::numeric_or_zero(record, field);
        let int = |field: &str| query::numeric_or_zero(record, field).trunc() as i64;
        let raw = |field: &str| record.get(field).unwrap_or("").to_string();

        Self {
            cuit: raw(col::CUIT),
            razon_social: raw("Razon_Social"),
            ha_totales: num("Ha_Totales"),
            ha_agricolas_totales: num("Ha_Agricolas_Totales"),
            ha_agricolas_propias: num("Ha_Agricolas_Propias"),
            ha_agricolas_alquiladas: num("Ha_Agricolas_Alquiladas"),
            ha_no_agricolas_totales: num("Ha_No_Agricolas_Totales"),
            ha_no_agricolas_propias: num("Ha_No_Agricolas_Propias"),
            ha_no_agricolas_alquiladas: num("Ha_No_Agricolas_Alquiladas"),
            pct_agricolas: num("Pct_Agricolas"),
            pct_no_agricolas: num("Pct_No_Agricolas"),
            pct_agricolas_propias: num("Pct_Agricolas_Propias"),
            pct_agricolas_alquiladas: num("Pct_Agricolas_Alquiladas"),
            pct_no_agricolas_propias: num("Pct_No_Agricolas_Propias"),
            pct_no_agricolas_alquiladas: num("Pct_No_Agricolas_Alquiladas"),
            cabezas_totales: int("Cabezas_Totales"),
            stock_cria_cabezas: int("Stock_Cria_Cabezas"),
            valor_stock_total: num("Valor_Stock_Total"),
            valor_stock_cria: num("Valor_Stock_Cria"),
            score_nosis: int("Score_Nosis"),
            endeudamiento: num("Endeudamiento"),
            distancia_puerto_propios: num("Distancia_Puerto_Promedio_Propios"),
            distancia_puerto_alquilados: num("Distancia_Puerto_Promedio_Alquilados"),
            centroide_propios: (num("Centroide_Propios_Lat"), num("Centroide_Propios_Lng")),
            centroide_alquilados: (
                num("Centroide_Alquilados_Lat"),
                num("Centroide_Alquilados_Lng"),
            ),
            coordenadas_propios_json: raw("Coordenadas_Propios_JSON"),
            coordenadas_alquilados_json: raw("Coordenadas_Alquilados_JSON"),
        }
    }

    /// Hectáreas propias (agrícolas + no agrícolas).
    pub fn ha_propias_totales(&self) -> f64 {
        self.ha_agricolas_propias + self.ha_no_agricolas_propias
    }

    /// Hectáreas arrendadas (agrícolas + no agrícolas).
    pub fn ha_arrendadas_totales(&self) -> f64 {
        self.ha_agricolas_alquiladas + self.ha_no_agricolas_alquiladas
    }
}

/// Entrada del directorio de productores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProducerEntry {
    pub cuit: Cuit,
    pub razon_social: String,
}
