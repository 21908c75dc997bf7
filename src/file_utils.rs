use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Archivos `.csv` de un directorio (sin recursión), ordenados por nombre.
pub fn list_csv_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_csv_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Un archivo pertenece a una tabla si su nombre empieza con el prefijo
/// (sin distinguir mayúsculas).
pub fn matches_table(path: &Path, prefix: &str) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    has_csv_extension(path) && name.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// Calcula el tamaño de un archivo en bytes
pub fn get_file_size(path: &Path) -> io::Result<u64> {
    Ok(fs::metadata(path)?.len())
}

/// Formatea bytes en formato legible (KB, MB, GB)
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.2} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.2} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.2} KB", b as f64 / KB as f64),
        b => format!("{} bytes", b),
    }
}

/// Crea el directorio padre de un archivo de salida si no existe.
pub fn ensure_parent_exists(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_matches_table() {
        assert!(matches_table(Path::new("datos/General_2024.csv"), "General"));
        assert!(matches_table(Path::new("datos/general.CSV"), "General"));
        assert!(!matches_table(Path::new("datos/General.txt"), "General"));
        assert!(!matches_table(
            Path::new("datos/Agricultura_Rotacion.csv"),
            "Agricultura_Ingresos"
        ));
    }

    #[test]
    fn test_list_csv_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "x").unwrap();
        fs::write(dir.path().join("a.csv"), "x").unwrap();
        fs::write(dir.path().join("notas.txt"), "x").unwrap();
        let files = list_csv_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }
}
