//! Consultas sobre registros EAV (CUIT / Tipo_Dato / Categoria / Subcategoria).
//!
//! Todas las funciones son totales: la ausencia de datos se expresa con
//! `Option` o con el valor neutro (0, "N/A"), nunca con un error.
//!
//! Es la API a nivel de registro: `find_fact`, `find_fact_by_sub`,
//! `fact_value` y `fact_text` recorren las filas crudas en cada llamada.
//! Las vistas no las usan directamente; arman un [`crate::facts::FactIndex`]
//! por productor, que resuelve las mismas búsquedas con la misma regla
//! (gana el primer registro) sin volver a recorrer la tabla.

use std::collections::HashMap;
use std::hash::Hash;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::csv_parser::Record;

/// Texto mostrado cuando un dato no está disponible.
pub const NOT_AVAILABLE: &str = "N/A";

/// Nombres de columnas de las tablas EAV.
pub mod col {
    pub const CUIT: &str = "CUIT";
    pub const TIPO_DATO: &str = "Tipo_Dato";
    pub const CATEGORIA: &str = "Categoria";
    pub const SUBCATEGORIA: &str = "Subcategoria";
    pub const DETALLE: &str = "Detalle";
    pub const VALOR_NUMERICO: &str = "Valor_Numerico";
    pub const VALOR_TEXTO: &str = "Valor_Texto";
    pub const PROVINCIA: &str = "Provincia";
    pub const DEPARTAMENTO: &str = "Departamento";
}

lazy_static! {
    // Prefijo numérico al estilo parseFloat: "12.5 ha" -> 12.5
    static ref NUMERIC_PREFIX: Regex =
        Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").unwrap();
}

/// Registros cuyo CUIT coincide exactamente (comparación de strings).
pub fn filter_by_producer<'a, I>(records: I, cuit: &str) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter(|r| r.get(col::CUIT) == Some(cuit))
        .collect()
}

/// Primer registro (en orden de entrada) con ese Tipo_Dato y Categoria.
///
/// Búsqueda lineal sobre filas crudas. Para consultas repetidas sobre un
/// mismo productor conviene [`crate::facts::FactIndex`].
pub fn find_fact<'a, I>(records: I, tipo_dato: &str, categoria: &str) -> Option<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    find_by(records, tipo_dato, col::CATEGORIA, categoria)
}

/// Primer registro (en orden de entrada) con ese Tipo_Dato y Subcategoria.
/// Equivale a `FactIndex::get_by_sub` sin índice.
pub fn find_fact_by_sub<'a, I>(
    records: I,
    tipo_dato: &str,
    subcategoria: &str,
) -> Option<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    find_by(records, tipo_dato, col::SUBCATEGORIA, subcategoria)
}

fn find_by<'a, I>(records: I, tipo_dato: &str, column: &str, value: &str) -> Option<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .find(|r| r.get(col::TIPO_DATO) == Some(tipo_dato) && r.get(column) == Some(value))
}

pub fn filter_by_tipo<'a, I>(records: I, tipo_dato: &str) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter(|r| r.get(col::TIPO_DATO) == Some(tipo_dato))
        .collect()
}

pub fn filter_by_tipo_prefix<'a, I>(records: I, prefix: &str) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter(|r| r.get(col::TIPO_DATO).is_some_and(|t| !t.is_empty() && t.starts_with(prefix)))
        .collect()
}

/// Parseo decimal tolerante de un texto. `None` si no hay prefijo numérico.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let m = NUMERIC_PREFIX.find(raw)?;
    m.as_str().trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Valor numérico de una columna; `None` si falta, está vacía o no es número.
pub fn numeric(record: &Record, field: &str) -> Option<f64> {
    record.get(field).and_then(parse_decimal)
}

pub fn numeric_or_zero(record: &Record, field: &str) -> f64 {
    numeric(record, field).unwrap_or(0.0)
}

/// `Valor_Numerico` de un hecho opcional, 0 si no se encontró.
/// Se combina con `find_fact`: `fact_value(find_fact(..))`.
pub fn fact_value(fact: Option<&Record>) -> f64 {
    fact.map_or(0.0, |r| numeric_or_zero(r, col::VALOR_NUMERICO))
}

/// Texto de una columna; `None` si falta o está vacía.
pub fn text<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).filter(|v| !v.is_empty())
}

/// Texto de una columna o "N/A"; es lo que muestra el informe cuando falta.
pub fn text_or_na<'a>(record: &'a Record, field: &str) -> &'a str {
    text(record, field).unwrap_or(NOT_AVAILABLE)
}

/// `Valor_Texto` de un hecho opcional, par de `fact_value` para textos.
pub fn fact_text(fact: Option<&Record>) -> Option<&str> {
    fact.and_then(|r| text(r, col::VALOR_TEXTO))
}

/// Cociente protegido: `None` si el denominador es 0 o algún lado no es finito.
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !numerator.is_finite() || !denominator.is_finite() {
        return None;
    }
    Some(numerator / denominator)
}

/// Porcentaje `part / total * 100`, 0 si el total no es positivo.
pub fn pct(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

/// Grupo resultante de `aggregate_by_key`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group<K> {
    pub key: K,
    pub count: usize,
    /// Sumas por campo, en el mismo orden que `fields`.
    pub sums: Vec<f64>,
}

impl<K> Group<K> {
    pub fn sum(&self, idx: usize) -> f64 {
        self.sums.get(idx).copied().unwrap_or(0.0)
    }

    pub fn mean(&self, idx: usize) -> f64 {
        safe_ratio(self.sum(idx), self.count as f64).unwrap_or(0.0)
    }

    /// Cociente entre dos sumas del grupo (p.ej. margen = neto / bruto).
    pub fn ratio(&self, numerator_idx: usize, denominator_idx: usize) -> Option<f64> {
        safe_ratio(self.sum(numerator_idx), self.sum(denominator_idx))
    }
}

/// Agrupa por clave compuesta sumando `fields`; los grupos salen en orden de primera aparición.
pub fn aggregate_by_key<'a, K, I, F>(records: I, key_fn: F, fields: &[&str]) -> Vec<Group<K>>
where
    I: IntoIterator<Item = &'a Record>,
    K: Eq + Hash + Clone,
    F: Fn(&Record) -> K,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Group<K>> = Vec::new();

    for record in records {
        let key = key_fn(record);
        let idx = *positions.entry(key.clone()).or_insert_with(|| {
            groups.push(Group {
                key,
                count: 0,
                sums: vec![0.0; fields.len()],
            });
            groups.len() - 1
        });

        let group = &mut groups[idx];
        group.count += 1;
        for (sum, field) in group.sums.iter_mut().zip(fields) {
            *sum += numeric_or_zero(record, field);
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_parser::parse_csv;

    #[test]
    fn test_find_fact_score_nosis() {
        let rows =
            parse_csv("Tipo_Dato,Categoria,Valor_Numerico\nScore_Crediticio,SCORE_NOSIS,650\n");
        let fact = find_fact(&rows, "Score_Crediticio", "SCORE_NOSIS").expect("fact");
        assert_eq!(numeric_or_zero(fact, col::VALOR_NUMERICO), 650.0);
        assert!(find_fact(&rows, "Score_Crediticio", "OTRA").is_none());
    }

    #[test]
    fn test_find_fact_first_match_wins() {
        let rows = parse_csv(
            "Tipo_Dato,Categoria,Subcategoria,Valor_Numerico\n\
             Nivel_MODERADO,DEUDA_MAXIMA,,100\n\
             Nivel_MODERADO,DEUDA_MAXIMA,,999\n\
             Valor_Tierra_Simple,,Valor_Final_Promedio,5\n",
        );
        assert_eq!(fact_value(find_fact(&rows, "Nivel_MODERADO", "DEUDA_MAXIMA")), 100.0);
        assert_eq!(
            fact_value(find_fact_by_sub(&rows, "Valor_Tierra_Simple", "Valor_Final_Promedio")),
            5.0
        );
    }

    #[test]
    fn test_numeric_coercion_is_total() {
        let rec = Record::from_pairs(&[("A", ""), ("B", "abc"), ("C", "12.5 ha"), ("D", "-3e2")]);
        assert_eq!(numeric(&rec, "A"), None);
        assert_eq!(numeric(&rec, "B"), None);
        assert_eq!(numeric(&rec, "C"), Some(12.5));
        assert_eq!(numeric(&rec, "D"), Some(-300.0));
        assert_eq!(numeric_or_zero(&rec, "NO_EXISTE"), 0.0);
        assert_eq!(numeric_or_zero(&rec, "NO_EXISTE"), numeric_or_zero(&rec, "NO_EXISTE"));
        assert_eq!(parse_decimal(".5"), Some(0.5));
        assert_eq!(parse_decimal("1,5"), Some(1.0));
    }

    #[test]
    fn test_text_coercion() {
        let rec = Record::from_pairs(&[("Valor_Texto", ""), ("Detalle", "Banco Nación")]);
        assert_eq!(text(&rec, "Valor_Texto"), None);
        assert_eq!(text_or_na(&rec, "Valor_Texto"), NOT_AVAILABLE);
        assert_eq!(text_or_na(&rec, "Detalle"), "Banco Nación");
        assert_eq!(fact_text(None), None);
    }

    #[test]
    fn test_filter_by_producer_absent_cuit() {
        let rows = parse_csv("CUIT,Tipo_Dato\n30556977980,A\n27176350259,B\n");
        assert_eq!(filter_by_producer(&rows, "30556977980").len(), 1);
        let none = filter_by_producer(&rows, "99999999999");
        assert!(none.is_empty());
        assert_eq!(fact_value(find_fact(none.iter().copied(), "A", "")), 0.0);
    }

    #[test]
    fn test_aggregate_sums_by_composite_key() {
        let rows = parse_csv(
            "Cultivo,Tenencia,Ingreso_Neto_Total,Ingreso_Bruto_Total\n\
             Soja,Propios,100,200\n\
             Maiz,Alquilados,10,40\n\
             Soja,Propios,50,100\n",
        );
        let groups = aggregate_by_key(
            &rows,
            |r| {
                (
                    r.get("Cultivo").unwrap_or("").to_string(),
                    r.get("Tenencia").unwrap_or("").to_string(),
                )
            },
            &["Ingreso_Neto_Total", "Ingreso_Bruto_Total"],
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, ("Soja".to_string(), "Propios".to_string()));
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].sum(0), 150.0);
        assert_eq!(groups[0].ratio(0, 1), Some(0.5));
        assert_eq!(groups[1].key.0, "Maiz");
    }

    #[test]
    fn test_safe_ratio_and_pct() {
        assert_eq!(safe_ratio(1.0, 0.0), None);
        assert_eq!(safe_ratio(f64::NAN, 2.0), None);
        assert_eq!(safe_ratio(3.0, 2.0), Some(1.5));
        assert_eq!(pct(1.0, 0.0), 0.0);
        assert_eq!(pct(1.0, 4.0), 25.0);
    }
}
