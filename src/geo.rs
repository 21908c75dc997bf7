//! Celdas de polígonos (`Coordenadas_*_JSON`).
//!
//! El contenido suele llegar dañado por el CSV (comillas perdidas, claves sin
//! comillas). Se intenta un parseo directo y, si falla, una reparación
//! heurística; lo irreparable se registra y se devuelve como lista vacía.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

lazy_static! {
    static ref UNQUOTED_KEY: Regex = Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").unwrap();
    static ref BARE_VALUE: Regex = Regex::new(r":\s*([A-Za-z_][A-Za-z0-9_]*)\s*([,}])").unwrap();
}

/// Polígono con sus vértices como pares `[lng, lat]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    pub coordenadas: Vec<[f64; 2]>,
}

impl Polygon {
    /// Vértices como `(lat, lng)`, el orden que esperan los mapas.
    pub fn lat_lng(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.coordenadas.iter().map(|[lng, lat]| (*lat, *lng))
    }
}

fn is_not_available(cell: &str) -> bool {
    cell.is_empty() || cell.eq_ignore_ascii_case("N/D") || cell.eq_ignore_ascii_case("ND")
}

fn basic_cleanup(cell: &str) -> String {
    cell.replace("\\\"", "\"")
        .replace("\\\n", "")
        .replace('\u{FEFF}', "")
        .trim()
        .to_string()
}

fn repair(cleaned: &str) -> String {
    let quoted = cleaned.replace('\'', "\"");
    let keys = UNQUOTED_KEY.replace_all(&quoted, "$1\"$2\":");
    BARE_VALUE
        .replace_all(&keys, |caps: &Captures| {
            let val = &caps[1];
            let tail = &caps[2];
            match val.to_ascii_lowercase().as_str() {
                "true" | "false" | "null" => format!(": {}{}", val, tail),
                _ => format!(": \"{}\"{}", val, tail),
            }
        })
        .into_owned()
}

fn pair(value: &Value) -> Option<[f64; 2]> {
    let items = value.as_array()?;
    match (items.first()?.as_f64(), items.get(1)?.as_f64()) {
        (Some(lng), Some(lat)) => Some([lng, lat]),
        _ => None,
    }
}

fn polygon(value: &Value) -> Option<Polygon> {
    let coords = value.get("coordenadas")?.as_array()?;
    let coordenadas: Vec<[f64; 2]> = coords.iter().filter_map(pair).collect();
    if coordenadas.is_empty() {
        return None;
    }
    Some(Polygon { coordenadas })
}

fn polygons(value: &Value) -> Vec<Polygon> {
    match value {
        Value::Array(items) => items.iter().filter_map(polygon).collect(),
        Value::Object(_) => polygon(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Parsea una celda de polígonos. Nunca falla: lo irreparable da una lista vacía.
pub fn parse_polygon_cell(cell: &str) -> Vec<Polygon> {
    let trimmed = cell.trim();
    if is_not_available(trimmed) || !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return Vec::new();
    }

    let cleaned = basic_cleanup(trimmed);
    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return polygons(&value);
    }

    let repaired = repair(&cleaned);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(value) => polygons(&value),
        Err(err) => {
            let preview: String = repaired.chars().take(120).collect();
            warn!(error = %err, celda = %preview, "JSON de polígonos irreparable");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_available_cells() {
        assert!(parse_polygon_cell("N/D").is_empty());
        assert!(parse_polygon_cell(" nd ").is_empty());
        assert!(parse_polygon_cell("").is_empty());
        assert!(parse_polygon_cell("C:/mapas/campo.kml").is_empty());
    }

    #[test]
    fn test_unquoted_key_is_repaired() {
        let polys = parse_polygon_cell("{coordenadas: [[1,2],[3,4]]}");
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].coordenadas, vec![[1.0, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn test_valid_json_array() {
        let cell = concat!(
            r#"[{"coordenadas": [[-60.5, -33.9], [-60.4, -33.8], [-60.4, -33.9]]}, "#,
            r#"{"coordenadas": []}]"#
        );
        let polys = parse_polygon_cell(cell);
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].lat_lng().next(), Some((-33.9, -60.5)));
    }

    #[test]
    fn test_single_quotes_and_bare_values() {
        let cell = "[{'tipo': Polygon, 'cerrado': true, coordenadas: [[1,2]]}]";
        let polys = parse_polygon_cell(cell);
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].coordenadas.len(), 1);
    }

    #[test]
    fn test_escaped_quotes_cleanup() {
        let cell = r#"[{\"coordenadas\": [[5,6]]}]"#;
        assert_eq!(parse_polygon_cell(cell)[0].coordenadas, vec![[5.0, 6.0]]);
    }

    #[test]
    fn test_irreparable_cell_is_empty() {
        assert!(parse_polygon_cell("[{coordenadas: [[1,2],").is_empty());
    }
}
