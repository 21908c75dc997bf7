pub mod exportar;
pub mod inspeccionar;
pub mod poligonos;
pub mod productores;
pub mod reporte;

const BOX_WIDTH: usize = 62;

/// Encabezado en caja de los informes.
pub fn print_banner(title: &str) {
    println!("╔{}╗", "═".repeat(BOX_WIDTH));
    println!("║  {:<width$}║", title, width = BOX_WIDTH - 2);
    println!("╚{}╝", "═".repeat(BOX_WIDTH));
}

/// Monto entero con separador de miles con punto: `$ 1.234.567`.
pub fn format_money(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-$ {}", grouped)
    } else {
        format!("$ {}", grouped)
    }
}

/// Porcentaje con un decimal, o N/A.
pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v),
        None => crate::query::NOT_AVAILABLE.to_string(),
    }
}
