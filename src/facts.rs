//! Índice de hechos de un productor.
//!
//! Se arma una sola vez por productor y resuelve las búsquedas por
//! `(Tipo_Dato, Categoria)` y `(Tipo_Dato, Subcategoria)` sin recorrer la tabla.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::warn;

use crate::csv_parser::Record;
use crate::models::{Fact, FactKind};

type Key = (FactKind, String);

#[derive(Debug, Default, Clone)]
pub struct FactIndex {
    facts: Vec<Fact>,
    by_categoria: HashMap<Key, usize>,
    by_subcategoria: HashMap<Key, usize>,
    duplicates: usize,
}

impl FactIndex {
    /// Gana el primer hecho en orden de entrada; los repetidos con otro valor se cuentan.
    pub fn build<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut index = Self::default();
        for fact in records.into_iter().filter_map(Fact::from_record) {
            index.push(fact);
        }
        if index.duplicates > 0 {
            warn!(
                duplicados = index.duplicates,
                "hechos repetidos con distinto valor, se usa el primero"
            );
        }
        index
    }

    fn push(&mut self, fact: Fact) {
        let pos = self.facts.len();
        let cat_key = (fact.kind.clone(), fact.categoria.clone().unwrap_or_default());
        let sub_key = (fact.kind.clone(), fact.subcategoria.clone().unwrap_or_default());

        match self.by_categoria.entry(cat_key) {
            Entry::Vacant(slot) => {
                slot.insert(pos);
            }
            Entry::Occupied(slot) => {
                let first = &self.facts[*slot.get()];
                if first.subcategoria == fact.subcategoria
                    && (first.valor != fact.valor || first.texto != fact.texto)
                {
                    self.duplicates += 1;
                    warn!(
                        tipo = %fact.kind.tipo_dato(),
                        categoria = %slot.key().1,
                        "hecho duplicado"
                    );
                }
            }
        }
        self.by_subcategoria.entry(sub_key).or_insert(pos);
        self.facts.push(fact);
    }

    pub fn get(&self, kind: &FactKind, categoria: &str) -> Option<&Fact> {
        self.by_categoria
            .get(&(kind.clone(), categoria.to_string()))
            .map(|&i| &self.facts[i])
    }

    pub fn get_by_sub(&self, kind: &FactKind, subcategoria: &str) -> Option<&Fact> {
        self.by_subcategoria
            .get(&(kind.clone(), subcategoria.to_string()))
            .map(|&i| &self.facts[i])
    }

    /// Valor numérico o 0.
    pub fn value(&self, kind: &FactKind, categoria: &str) -> f64 {
        self.get(kind, categoria).map_or(0.0, Fact::value_or_zero)
    }

    pub fn value_by_sub(&self, kind: &FactKind, subcategoria: &str) -> f64 {
        self.get_by_sub(kind, subcategoria).map_or(0.0, Fact::value_or_zero)
    }

    pub fn text(&self, kind: &FactKind, categoria: &str) -> Option<&str> {
        self.get(kind, categoria).and_then(|f| f.texto.as_deref())
    }

    pub fn of_kind<'s>(&'s self, kind: &'s FactKind) -> impl Iterator<Item = &'s Fact> + 's {
        self.facts.iter().filter(move |f| &f.kind == kind)
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_parser::parse_csv;
    use crate::query;

    const CREDITICIO: &str =
        "CUIT,Tipo_Dato,Categoria,Subcategoria,Detalle,Valor_Numerico,Valor_Texto\n\
        30,Score_Crediticio,SCORE_NOSIS,,Score Nosis,650,\n\
        30,Nivel_MODERADO,DEUDA_MAXIMA,,,100,\n\
        30,Nivel_MODERADO,DEUDA_MAXIMA,,,999,\n\
        30,Nivel_MODERADO,LIMITE_GARANTIAS_PCT,,,,12.5%\n\
        30,Inventario_Total_Vacas,Cabezas,,,320,\n";

    #[test]
    fn test_first_match_wins_and_duplicates_counted() {
        let rows = parse_csv(CREDITICIO);
        let index = FactIndex::build(&rows);
        assert_eq!(index.len(), 5);
        assert_eq!(index.value(&FactKind::NivelModerado, "DEUDA_MAXIMA"), 100.0);
        assert_eq!(index.duplicates(), 1);
    }

    #[test]
    fn test_lookup_defaults() {
        let rows = parse_csv(CREDITICIO);
        let index = FactIndex::build(&rows);
        assert_eq!(index.value(&FactKind::ScoreCrediticio, "SCORE_NOSIS"), 650.0);
        assert_eq!(index.value(&FactKind::ScoreCrediticio, "OTRA"), 0.0);
        assert_eq!(index.text(&FactKind::NivelModerado, "LIMITE_GARANTIAS_PCT"), Some("12.5%"));
        assert_eq!(index.text(&FactKind::NivelModerado, "DEUDA_MAXIMA"), None);
        assert_eq!(
            index.of_kind(&FactKind::InventarioTotal("Vacas".into())).count(),
            1
        );
    }

    #[test]
    fn test_index_agrees_with_record_lookup() {
        let rows = parse_csv(CREDITICIO);
        let index = FactIndex::build(&rows);

        for (tipo, categoria) in [
            ("Score_Crediticio", "SCORE_NOSIS"),
            ("Nivel_MODERADO", "DEUDA_MAXIMA"),
            ("Nivel_MODERADO", "LIMITE_GARANTIAS_PCT"),
            ("Nivel_MODERADO", "NO_EXISTE"),
        ] {
            let kind = FactKind::parse(tipo);
            let fact = query::find_fact(&rows, tipo, categoria);
            assert_eq!(index.value(&kind, categoria), query::fact_value(fact));
            assert_eq!(index.text(&kind, categoria), query::fact_text(fact));
        }
    }

    #[test]
    fn test_empty_index() {
        let index = FactIndex::build(std::iter::empty());
        assert!(index.is_empty());
        assert_eq!(index.value_by_sub(&FactKind::ValorTierraSimple, "Valor_Final_Promedio"), 0.0);
    }
}
