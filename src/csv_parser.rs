use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

const BOM: char = '\u{FEFF}';

/// Fila parseada: mapea cada columna del header a su celda (siempre String).
///
/// Las columnas son exactamente las del header del archivo de origen; si la
/// fila trae menos celdas, las faltantes quedan como "".
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    headers: Arc<Vec<String>>,
    values: Vec<String>,
}

impl Record {
    fn new(headers: Arc<Vec<String>>, mut values: Vec<String>) -> Self {
        values.resize(headers.len(), String::new());
        Self { headers, values }
    }

    /// Construye un registro a partir de pares (columna, valor).
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let headers = pairs.iter().map(|(h, _)| h.to_string()).collect();
        let values = pairs.iter().map(|(_, v)| v.to_string()).collect();
        Self::new(Arc::new(headers), values)
    }

    /// Celda por nombre de columna. Con headers repetidos gana la última columna.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .rposition(|h| h == column)
            .map(|idx| self.values[idx].as_str())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Itera (columna, celda) sin repetir columnas, en orden de header.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .enumerate()
            .filter(move |(idx, h)| !self.headers[idx + 1..].contains(*h))
            .map(move |(idx, h)| (h.as_str(), self.values[idx].as_str()))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Contadores de un parseo, solo para diagnóstico.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub blank_lines: usize,
    pub records: usize,
    pub short_rows: usize,
    pub long_rows: usize,
}

/// Limpia una celda: quita BOM y \r, una comilla inicial y una final, y espacios.
pub fn clean_cell(raw: &str) -> String {
    let no_noise: String = raw.chars().filter(|&c| c != BOM && c != '\r').collect();
    let no_lead = no_noise.strip_prefix('"').unwrap_or(&no_noise);
    let no_trail = no_lead.strip_suffix('"').unwrap_or(no_lead);
    no_trail.trim().to_string()
}

/// Divide una línea en celdas limpias respetando comas dentro de comillas.
///
/// Una comilla alterna el estado "dentro de comillas" y no se conserva.
/// `\"` no alterna: se descarta la barra y queda la comilla literal.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut inside_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            '"' => inside_quotes = !inside_quotes,
            ',' if !inside_quotes => {
                out.push(clean_cell(&cur));
                cur.clear();
            }
            _ => cur.push(ch),
        }
    }
    out.push(clean_cell(&cur));
    out
}

fn is_blank(line: &str) -> bool {
    line.chars().all(|c| c.is_whitespace() || c == BOM)
}

/// Parsea un texto CSV completo. Nunca falla: en el peor caso devuelve celdas vacías.
pub fn parse_csv(text: &str) -> Vec<Record> {
    parse_csv_with_stats(text).0
}

pub fn parse_csv_with_stats(text: &str) -> (Vec<Record>, ParseStats) {
    let mut stats = ParseStats::default();
    let mut headers: Option<Arc<Vec<String>>> = None;
    let mut records = Vec::new();

    for raw in text.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        stats.lines += 1;

        if is_blank(line) {
            stats.blank_lines += 1;
            continue;
        }

        let header = match &headers {
            Some(h) => Arc::clone(h),
            None => {
                headers = Some(Arc::new(parse_line(line)));
                continue;
            }
        };

        let values = parse_line(line);
        if values.len() < header.len() {
            stats.short_rows += 1;
        } else if values.len() > header.len() {
            stats.long_rows += 1;
        }
        records.push(Record::new(header, values));
    }

    stats.records = records.len();
    debug!(
        lines = stats.lines,
        records = stats.records,
        blank = stats.blank_lines,
        short = stats.short_rows,
        long = stats.long_rows,
        "csv parseado"
    );
    (records, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_fixture() {
        let rows = parse_csv("A,B\n1,2\n3,\"x,y\"\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], Record::from_pairs(&[("A", "1"), ("B", "2")]));
        assert_eq!(rows[1], Record::from_pairs(&[("A", "3"), ("B", "x,y")]));
    }

    #[test]
    fn test_empty_and_header_only() {
        assert!(parse_csv("").is_empty());
        assert!(parse_csv("\n\n  \n").is_empty());
        assert!(parse_csv("CUIT,Tipo_Dato\n").is_empty());
    }

    #[test]
    fn test_n_lines_n_records_with_exact_keys() {
        let text = "CUIT,Tipo_Dato,Valor_Numerico\n1,a,1\n2,b,2\n3,c,3\n4,d,4\n";
        let rows = parse_csv(text);
        assert_eq!(rows.len(), 4);
        for row in &rows {
            let keys: Vec<&str> = row.iter().map(|(k, _)| k).collect();
            assert_eq!(keys, vec!["CUIT", "Tipo_Dato", "Valor_Numerico"]);
        }
    }

    #[test]
    fn test_bom_and_crlf_are_removed() {
        let text = "\u{FEFF}CUIT,Razon_Social\r\n20123,\"LA MARTA\u{FEFF}\"\r\n";
        let rows = parse_csv(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].headers(), &["CUIT".to_string(), "Razon_Social".to_string()]);
        for (k, v) in rows[0].iter() {
            assert!(!k.contains('\u{FEFF}') && !k.contains('\r'));
            assert!(!v.contains('\u{FEFF}') && !v.contains('\r'));
        }
        assert_eq!(rows[0].get("Razon_Social"), Some("LA MARTA"));
    }

    #[test]
    fn test_blank_lines_do_not_shift_columns() {
        let rows = parse_csv("\n\nA,B\n\n1,2\n   \n3,4\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("A"), Some("3"));
        assert_eq!(rows[1].get("B"), Some("4"));
    }

    #[test]
    fn test_short_row_is_padded_and_long_row_truncated() {
        let (rows, stats) = parse_csv_with_stats("A,B,C\n1\n1,2,3,4\n");
        assert_eq!(rows[0].get("B"), Some(""));
        assert_eq!(rows[0].get("C"), Some(""));
        assert_eq!(rows[1].iter().count(), 3);
        assert_eq!(stats.short_rows, 1);
        assert_eq!(stats.long_rows, 1);
    }

    #[test]
    fn test_escaped_quote_does_not_toggle() {
        let cells = parse_line(r#"a,"dice \"hola\" che, ok",b"#);
        assert_eq!(cells, vec!["a", "dice \"hola\" che, ok", "b"]);
    }

    #[test]
    fn test_clean_cell() {
        assert_eq!(clean_cell("  \"Soja\"  "), "\"Soja\"");
        assert_eq!(clean_cell("\"Soja\""), "Soja");
        assert_eq!(clean_cell("\""), "");
        assert_eq!(clean_cell("\u{FEFF} Maiz\r"), "Maiz");
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let rows = parse_csv("A,A\n1,2\n");
        assert_eq!(rows[0].get("A"), Some("2"));
        assert_eq!(rows[0].iter().count(), 1);
    }

    #[test]
    fn test_record_serializes_as_map() {
        let rec = Record::from_pairs(&[("CUIT", "30"), ("Cultivo", "Soja")]);
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"CUIT":"30","Cultivo":"Soja"}"#);
    }
}
