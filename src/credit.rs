//! Capacidad crediticia: métricas Nosis, niveles por perfil, ratios, garantías,
//! simulaciones de préstamo y escenario post-crédito.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::facts::FactIndex;
use crate::models::{Fact, FactKind};
use crate::query::{safe_ratio, NOT_AVAILABLE};

/// Perfil de riesgo elegido por el analista.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, clap::ValueEnum)]
pub enum RiskProfile {
    Conservador,
    #[default]
    Moderado,
    Agresivo,
}

impl RiskProfile {
    pub const ALL: [RiskProfile; 3] = [
        RiskProfile::Conservador,
        RiskProfile::Moderado,
        RiskProfile::Agresivo,
    ];

    fn level_kind(self) -> FactKind {
        match self {
            RiskProfile::Conservador => FactKind::NivelConservador,
            RiskProfile::Moderado => FactKind::NivelModerado,
            RiskProfile::Agresivo => FactKind::NivelAgresivo,
        }
    }

    /// Límites recomendados (deuda/activos, deuda/campo) después del crédito.
    pub fn debt_limits(self) -> (f64, f64) {
        match self {
            RiskProfile::Conservador => (0.10, 0.15),
            RiskProfile::Moderado => (0.125, 0.20),
            RiskProfile::Agresivo => (0.15, 0.25),
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskProfile::Conservador => "CONSERVADOR",
            RiskProfile::Moderado => "MODERADO",
            RiskProfile::Agresivo => "AGRESIVO",
        };
        f.write_str(name)
    }
}

/// Un dato puntual del informe Nosis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metric {
    pub found: bool,
    pub valor: f64,
    pub texto: Option<String>,
    pub detalle: Option<String>,
}

impl Metric {
    fn from_fact(fact: Option<&Fact>) -> Self {
        match fact {
            Some(f) => Self {
                found: true,
                valor: f.value_or_zero(),
                texto: f.texto.clone(),
                detalle: f.detalle.clone(),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NosisMetrics {
    pub score_nosis: Metric,
    pub endeudamiento_total: Metric,
    pub cheques_rechazados: Metric,
    pub bancos_con_deuda: Metric,
    pub consultas_12_meses: Metric,
    pub consultas_1_mes: Metric,
    pub evaluacion_crediticia: Metric,
}

impl NosisMetrics {
    pub fn from_index(index: &FactIndex) -> Self {
        let m = |kind: FactKind, cat: &str| Metric::from_fact(index.get(&kind, cat));
        Self {
            score_nosis: m(FactKind::ScoreCrediticio, "SCORE_NOSIS"),
            endeudamiento_total: m(FactKind::EndeudamientoTotal, "DEUDA_SISTEMA_FINANCIERO"),
            cheques_rechazados: m(FactKind::ChequesRechazados, "CHEQUES_ULTIMO_AÑO"),
            bancos_con_deuda: m(FactKind::DeudaBancos, "BANCOS_CON_DEUDA"),
            consultas_12_meses: m(FactKind::ConsultasNosis, "CONSULTAS_12_MESES"),
            consultas_1_mes: m(FactKind::ConsultasNosis, "CONSULTAS_1_MES"),
            evaluacion_crediticia: m(FactKind::EvaluacionCrediticia, "ESTADO_GENERAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskLevel {
    pub perfil: RiskProfile,
    pub deuda_maxima: f64,
    pub capacidad_adicional: f64,
    pub ratio_servicio: f64,
    pub limite_garantias: String,
}

impl RiskLevel {
    pub fn from_index(index: &FactIndex, perfil: RiskProfile) -> Self {
        let kind = perfil.level_kind();
        Self {
            perfil,
            deuda_maxima: index.value(&kind, "DEUDA_MAXIMA"),
            capacidad_adicional: index.value(&kind, "CAPACIDAD_ADICIONAL"),
            ratio_servicio: index.value(&kind, "RATIO_SERVICIO_RESULTANTE"),
            limite_garantias: index
                .text(&kind, "LIMITE_GARANTIAS_PCT")
                .unwrap_or(NOT_AVAILABLE)
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreditRatios {
    pub servicio_actual: f64,
    pub deuda_activos: f64,
    pub deuda_campo: f64,
    pub limite_activos_totales: f64,
}

impl CreditRatios {
    pub fn from_index(index: &FactIndex) -> Self {
        Self {
            servicio_actual: index.value(&FactKind::RatioServicioActual, "RATIO_ACTUAL"),
            deuda_activos: index.value(&FactKind::RatiosCrediticios, "RATIO_DEUDA_ACTIVOS"),
            deuda_campo: index.value(&FactKind::RatiosCrediticios, "RATIO_DEUDA_CAMPO_CRIA"),
            limite_activos_totales: index
                .value(&FactKind::LimiteActivosTotales, "DEUDA_MAXIMA_ACTIVOS_15%"),
        }
    }
}

/// Clasificación del ratio de servicio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RatioStatus {
    Excelente,
    Bueno,
    Aceptable,
    Riesgoso,
}

pub fn ratio_status(ratio: f64) -> RatioStatus {
    if ratio >= 5.0 {
        RatioStatus::Excelente
    } else if ratio >= 3.0 {
        RatioStatus::Bueno
    } else if ratio >= 1.5 {
        RatioStatus::Aceptable
    } else {
        RatioStatus::Riesgoso
    }
}

fn mentions(value: Option<&str>, needle: &str) -> bool {
    value.is_some_and(|v| v.to_lowercase().contains(needle))
}

fn is_cashflow_candidate(fact: &Fact) -> bool {
    let tipo = fact.kind.tipo_dato();
    let cat = fact.categoria.as_deref();
    mentions(Some(tipo.as_str()), "cashflow")
        || mentions(cat, "cashflow")
        || mentions(fact.detalle.as_deref(), "cashflow")
        || mentions(Some(tipo.as_str()), "flujo")
        || mentions(cat, "flujo")
}

fn is_positive(fact: &Fact) -> bool {
    fact.valor.is_some_and(|v| v > 0.0)
}

/// Cashflow anual del productor. 0 si no se puede determinar.
///
/// Orden: hecho cuyo Tipo_Dato menciona "cashflow"; ratio de servicio × deuda
/// cuando el ratio se documenta como cashflow/deuda; cualquier candidato cuyo
/// Detalle mencione "cashflow".
pub fn resolve_cashflow(index: &FactIndex) -> f64 {
    let candidates: Vec<&Fact> = index
        .facts()
        .iter()
        .filter(|f| is_cashflow_candidate(f))
        .collect();

    if let Some(direct) = candidates
        .iter()
        .copied()
        .find(|f| is_positive(f) && mentions(Some(f.kind.tipo_dato().as_str()), "cashflow"))
    {
        debug!(cashflow = direct.value_or_zero(), "cashflow directo");
        return direct.value_or_zero();
    }

    if let Some(ratio) = index.get(&FactKind::RatioServicioActual, "RATIO_ACTUAL") {
        if mentions(ratio.detalle.as_deref(), "cashflow") {
            let ratio_actual = ratio.value_or_zero();
            let deuda = index.value(&FactKind::EndeudamientoTotal, "DEUDA_SISTEMA_FINANCIERO");
            if ratio_actual > 0.0 && deuda > 0.0 {
                debug!(ratio = ratio_actual, deuda, "cashflow desde ratio de servicio");
                return ratio_actual * deuda;
            }
        }
    }

    candidates
        .iter()
        .copied()
        .find(|f| is_positive(f) && mentions(f.detalle.as_deref(), "cashflow"))
        .map_or(0.0, |f| f.value_or_zero())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Guarantees {
    pub campo_plus_cria: f64,
    pub activos_totales: f64,
    pub cashflow: f64,
    pub monto_recomendado: f64,
}

impl Guarantees {
    pub fn from_index(index: &FactIndex, activos_totales: f64) -> Self {
        Self {
            campo_plus_cria: index.value(&FactKind::LimiteActivosTotales, "CAMPO_PLUS_CRIA"),
            activos_totales,
            cashflow: resolve_cashflow(index),
            monto_recomendado: index.value(&FactKind::RecomendacionCredito, "MONTO_CONSERVADOR"),
        }
    }
}

/// Plazos simulados: (días, porción de la capacidad, tasa, factor de anualización).
pub const LOAN_TERMS: [(u32, f64, f64, f64); 4] = [
    (90, 0.80, 0.045, 4.0),
    (180, 0.90, 0.065, 2.0),
    (270, 0.95, 0.075, 1.33),
    (360, 1.00, 0.085, 1.0),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanSimulation {
    pub plazo_dias: u32,
    pub tasa: f64,
    pub capital: f64,
    pub total_pagar: f64,
    pub intereses: f64,
    /// Intereses anualizados sobre cashflow, en %. `None` sin cashflow.
    pub impacto_cashflow: Option<f64>,
}

pub fn simulate_loans(capacidad: f64, cashflow: f64) -> Vec<LoanSimulation> {
    LOAN_TERMS
        .iter()
        .map(|&(dias, porcion, tasa, factor)| {
            let capital = capacidad * porcion;
            LoanSimulation {
                plazo_dias: dias,
                tasa,
                capital: capital.round(),
                total_pagar: (capital * (1.0 + tasa)).round(),
                intereses: (capital * tasa).round(),
                impacto_cashflow: safe_ratio(capital * tasa * factor, cashflow).map(|r| r * 100.0),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Criterion {
    pub nombre: &'static str,
    pub valor: f64,
    pub limite: f64,
    pub cumple: bool,
}

/// Criterios básicos: score ≥ 600, sin cheques rechazados, a lo sumo 3 bancos con deuda.
pub fn compliance_criteria(index: &FactIndex) -> Vec<Criterion> {
    let score = index.value(&FactKind::ScoreCrediticio, "SCORE_NOSIS");
    let cheques = index.value(&FactKind::ChequesRechazados, "CHEQUES_ULTIMO_AÑO");
    let bancos = index.value(&FactKind::DeudaBancos, "BANCOS_CON_DEUDA");

    vec![
        Criterion {
            nombre: "Score Nosis ≥ 600",
            valor: score,
            limite: 600.0,
            cumple: score >= 600.0,
        },
        Criterion {
            nombre: "Cheques Rechazados = 0",
            valor: cheques,
            limite: 0.0,
            cumple: cheques == 0.0,
        },
        Criterion {
            nombre: "Créditos Bancos ≤ 3",
            valor: bancos,
            limite: 3.0,
            cumple: bancos <= 3.0,
        },
    ]
}

/// Situación si se toma toda la capacidad adicional del perfil.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostLoanScenario {
    pub perfil: RiskProfile,
    pub credito: f64,
    pub deuda_actual: f64,
    pub nueva_deuda_total: f64,
    pub ratio_deuda_activos: Option<f64>,
    pub ratio_deuda_campo: Option<f64>,
    pub garantia_libre: f64,
    pub porcentaje_comprometido: Option<f64>,
    pub cobertura: Option<f64>,
    pub limite_deuda_activos: f64,
    pub limite_deuda_campo: f64,
    pub excede_limite_activos: bool,
    pub excede_limite_campo: bool,
}

pub fn post_loan_scenario(
    perfil: RiskProfile,
    deuda_actual: f64,
    credito: f64,
    garantias: &Guarantees,
) -> PostLoanScenario {
    let (limite_activos, limite_campo) = perfil.debt_limits();
    let nueva = deuda_actual + credito;
    let ratio_activos = safe_ratio(nueva, garantias.activos_totales);
    let ratio_campo = safe_ratio(nueva, garantias.campo_plus_cria);

    PostLoanScenario {
        perfil,
        credito,
        deuda_actual,
        nueva_deuda_total: nueva,
        ratio_deuda_activos: ratio_activos,
        ratio_deuda_campo: ratio_campo,
        garantia_libre: garantias.activos_totales - nueva,
        porcentaje_comprometido: ratio_activos.map(|r| r * 100.0),
        cobertura: safe_ratio(garantias.cashflow, nueva),
        limite_deuda_activos: limite_activos,
        limite_deuda_campo: limite_campo,
        excede_limite_activos: ratio_activos.is_some_and(|r| r > limite_activos),
        excede_limite_campo: ratio_campo.is_some_and(|r| r > limite_campo),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankShare {
    pub banco: String,
    pub monto: f64,
    pub porcentaje: Option<f64>,
}

/// Reparte el monto significativo en partes iguales entre los bancos listados.
pub fn bank_detail(index: &FactIndex) -> Vec<BankShare> {
    let Some(lista) = index.text(&FactKind::DetalleBancos, "LISTA_BANCOS") else {
        return Vec::new();
    };
    let nombres: Vec<&str> = lista.split(" | ").map(str::trim).filter(|n| !n.is_empty()).collect();
    let total = index.value(&FactKind::DeudaBancos, "MONTO_BANCOS_SIGNIFICATIVOS");
    let por_banco = safe_ratio(total, nombres.len() as f64).unwrap_or(0.0);

    nombres
        .into_iter()
        .map(|banco| BankShare {
            banco: banco.to_string(),
            monto: por_banco,
            porcentaje: safe_ratio(por_banco, total).map(|r| r * 100.0),
        })
        .collect()
}

/// Sección crediticia completa para un perfil.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditView {
    pub perfil: RiskProfile,
    pub metricas: NosisMetrics,
    pub niveles: Vec<RiskLevel>,
    pub ratios: CreditRatios,
    pub estado_ratio_servicio: RatioStatus,
    pub garantias: Guarantees,
    pub simulaciones: Vec<LoanSimulation>,
    pub criterios: Vec<Criterion>,
    pub escenario: PostLoanScenario,
    pub bancos: Vec<BankShare>,
}

impl CreditView {
    pub fn build(index: &FactIndex, activos_totales: f64, perfil: RiskProfile) -> Self {
        let niveles: Vec<RiskLevel> = RiskProfile::ALL
            .iter()
            .map(|&p| RiskLevel::from_index(index, p))
            .collect();
        let capacidad = niveles
            .iter()
            .find(|l| l.perfil == perfil)
            .map_or(0.0, |l| l.capacidad_adicional);
        let ratios = CreditRatios::from_index(index);
        let garantias = Guarantees::from_index(index, activos_totales);
        let deuda_actual = index.value(&FactKind::EndeudamientoTotal, "DEUDA_SISTEMA_FINANCIERO");

        Self {
            perfil,
            metricas: NosisMetrics::from_index(index),
            estado_ratio_servicio: ratio_status(ratios.servicio_actual),
            simulaciones: simulate_loans(capacidad, garantias.cashflow),
            criterios: compliance_criteria(index),
            escenario: post_loan_scenario(perfil, deuda_actual, capacidad, &garantias),
            bancos: bank_detail(index),
            niveles,
            ratios,
            garantias,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_parser::parse_csv;

    const HEADER: &str =
        "CUIT,Tipo_Dato,Categoria,Subcategoria,Detalle,Valor_Numerico,Valor_Texto\n";

    fn index(body: &str) -> FactIndex {
        let rows = parse_csv(&format!("{}{}", HEADER, body));
        FactIndex::build(&rows)
    }

    #[test]
    fn test_ratio_status_thresholds() {
        assert_eq!(ratio_status(5.0), RatioStatus::Excelente);
        assert_eq!(ratio_status(3.0), RatioStatus::Bueno);
        assert_eq!(ratio_status(1.5), RatioStatus::Aceptable);
        assert_eq!(ratio_status(1.49), RatioStatus::Riesgoso);
        assert_eq!(ratio_status(0.0), RatioStatus::Riesgoso);
    }

    #[test]
    fn test_cashflow_direct_fact_first() {
        let idx = index(
            "30,Cashflow_Anual,TOTAL,,,0,\n\
             30,Ratio_Servicio_Actual,RATIO_ACTUAL,,Cashflow / Deuda,4,\n\
             30,Endeudamiento_Total,DEUDA_SISTEMA_FINANCIERO,,,1000,\n\
             30,Cashflow_Anual,TOTAL_2,,,5000,\n",
        );
        assert_eq!(resolve_cashflow(&idx), 5000.0);
    }

    #[test]
    fn test_cashflow_from_service_ratio() {
        let idx = index(
            "30,Ratio_Servicio_Actual,RATIO_ACTUAL,,Cashflow / Deuda,4,\n\
             30,Endeudamiento_Total,DEUDA_SISTEMA_FINANCIERO,,,1000,\n",
        );
        assert_eq!(resolve_cashflow(&idx), 4000.0);
    }

    #[test]
    fn test_cashflow_from_detail_and_missing() {
        let idx = index("30,Flujo_Fondos,ANUAL,,Cashflow estimado,2500,\n");
        assert_eq!(resolve_cashflow(&idx), 2500.0);
        assert_eq!(resolve_cashflow(&index("")), 0.0);
    }

    #[test]
    fn test_simulations_rounding_and_zero_cashflow() {
        let sims = simulate_loans(100_000.0, 0.0);
        assert_eq!(sims.len(), 4);
        assert_eq!(sims[0].capital, 80_000.0);
        assert_eq!(sims[0].intereses, 3_600.0);
        assert_eq!(sims[0].total_pagar, 83_600.0);
        assert!(sims.iter().all(|s| s.impacto_cashflow.is_none()));

        let sims = simulate_loans(100_000.0, 85_000.0);
        let last = &sims[3];
        assert_eq!(last.capital, 100_000.0);
        assert_eq!(last.total_pagar, 108_500.0);
        assert!((last.impacto_cashflow.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_compliance_criteria() {
        let idx = index(
            "30,Score_Crediticio,SCORE_NOSIS,,,650,\n\
             30,Cheques_Rechazados,CHEQUES_ULTIMO_AÑO,,,1,\n\
             30,Deuda_Bancos,BANCOS_CON_DEUDA,,,3,3 bancos\n",
        );
        let c = compliance_criteria(&idx);
        assert!(c[0].cumple);
        assert!(!c[1].cumple);
        assert!(c[2].cumple);
    }

    #[test]
    fn test_post_loan_scenario_guards_zero_assets() {
        let garantias = Guarantees {
            campo_plus_cria: 0.0,
            activos_totales: 0.0,
            cashflow: 0.0,
            monto_recomendado: 0.0,
        };
        let s = post_loan_scenario(RiskProfile::Moderado, 100.0, 50.0, &garantias);
        assert_eq!(s.nueva_deuda_total, 150.0);
        assert_eq!(s.ratio_deuda_activos, None);
        assert_eq!(s.cobertura, Some(0.0));
        assert!(!s.excede_limite_activos);

        let garantias = Guarantees {
            campo_plus_cria: 1000.0,
            activos_totales: 1000.0,
            cashflow: 300.0,
            monto_recomendado: 0.0,
        };
        let s = post_loan_scenario(RiskProfile::Conservador, 100.0, 50.0, &garantias);
        assert_eq!(s.ratio_deuda_activos, Some(0.15));
        assert!(s.excede_limite_activos);
        assert!(!s.excede_limite_campo);
        assert_eq!(s.garantia_libre, 850.0);
        assert_eq!(s.cobertura, Some(2.0));
    }

    #[test]
    fn test_bank_detail_equal_split() {
        let idx = index(
            "30,Detalle_Bancos,LISTA_BANCOS,,,,Banco Nación | Galicia\n\
             30,Deuda_Bancos,MONTO_BANCOS_SIGNIFICATIVOS,,,30000,\n",
        );
        let bancos = bank_detail(&idx);
        assert_eq!(bancos.len(), 2);
        assert_eq!(bancos[0].banco, "Banco Nación");
        assert_eq!(bancos[1].monto, 15_000.0);
        assert_eq!(bancos[1].porcentaje, Some(50.0));
        assert!(bank_detail(&index("")).is_empty());
    }

    #[test]
    fn test_credit_view_missing_producer_defaults() {
        let view = CreditView::build(&FactIndex::default(), 0.0, RiskProfile::default());
        assert_eq!(view.perfil, RiskProfile::Moderado);
        assert!(!view.metricas.score_nosis.found);
        assert_eq!(view.niveles.len(), 3);
        assert_eq!(view.niveles[1].limite_garantias, "N/A");
        assert_eq!(view.simulaciones[0].capital, 0.0);
        assert_eq!(view.estado_ratio_servicio, RatioStatus::Riesgoso);
    }
}
