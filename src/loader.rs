//! Carga de un directorio de datos y sesión con modo degradado.
//!
//! Los archivos se leen en paralelo (hilos con scope) y se parsean en forma
//! secuencial. Cualquier falla de lectura invalida la carga completa.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::csv_parser::{parse_csv_with_stats, ParseStats, Record};
use crate::error::LoadError;
use crate::file_utils::{list_csv_files, matches_table};

/// Tablas de origen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Table {
    General,
    Crediticio,
    AgriculturaIngresos,
    Ganaderia,
    Activos,
    AgriculturaRotacion,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::General,
        Table::Crediticio,
        Table::AgriculturaIngresos,
        Table::Ganaderia,
        Table::Activos,
        Table::AgriculturaRotacion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::General => "General",
            Table::Crediticio => "Crediticio",
            Table::AgriculturaIngresos => "Agricultura_Ingresos",
            Table::Ganaderia => "Ganaderia",
            Table::Activos => "Activos",
            Table::AgriculturaRotacion => "Agricultura_Rotacion",
        }
    }
}

/// Prefijo de nombre de archivo de cada tabla.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub general: String,
    pub crediticio: String,
    pub agricultura_ingresos: String,
    pub ganaderia: String,
    pub activos: String,
    pub agricultura_rotacion: String,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            general: Table::General.name().to_string(),
            crediticio: Table::Crediticio.name().to_string(),
            agricultura_ingresos: Table::AgriculturaIngresos.name().to_string(),
            ganaderia: Table::Ganaderia.name().to_string(),
            activos: Table::Activos.name().to_string(),
            agricultura_rotacion: Table::AgriculturaRotacion.name().to_string(),
        }
    }
}

impl TableLayout {
    pub fn prefix(&self, table: Table) -> &str {
        match table {
            Table::General => &self.general,
            Table::Crediticio => &self.crediticio,
            Table::AgriculturaIngresos => &self.agricultura_ingresos,
            Table::Ganaderia => &self.ganaderia,
            Table::Activos => &self.activos,
            Table::AgriculturaRotacion => &self.agricultura_rotacion,
        }
    }

    /// Archivos de cada tabla, en orden de nombre. Falla si alguna tabla no tiene archivos.
    pub fn assign(&self, files: &[PathBuf]) -> Result<Vec<(Table, Vec<PathBuf>)>, LoadError> {
        Table::ALL
            .iter()
            .map(|&table| {
                let prefix = self.prefix(table);
                let matched: Vec<PathBuf> = files
                    .iter()
                    .filter(|p| matches_table(p, prefix))
                    .cloned()
                    .collect();
                if matched.is_empty() {
                    return Err(LoadError::MissingTable {
                        table: table.name(),
                        prefix: prefix.to_string(),
                    });
                }
                Ok((table, matched))
            })
            .collect()
    }
}

/// Resumen de un archivo cargado.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub table: Table,
    pub path: PathBuf,
    pub bytes: usize,
    pub records: usize,
    pub blank_lines: usize,
    pub short_rows: usize,
    pub long_rows: usize,
}

impl FileSummary {
    fn new(table: Table, path: PathBuf, bytes: usize, stats: ParseStats) -> Self {
        Self {
            table,
            path,
            bytes,
            records: stats.records,
            blank_lines: stats.blank_lines,
            short_rows: stats.short_rows,
            long_rows: stats.long_rows,
        }
    }
}

/// Todas las tablas parseadas. Cada tabla concatena sus archivos.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    pub general: Vec<Record>,
    pub crediticio: Vec<Record>,
    pub agricultura: Vec<Record>,
    pub ganaderia: Vec<Record>,
    pub activos: Vec<Record>,
    pub rotacion: Vec<Record>,
    pub files: Vec<FileSummary>,
}

impl DataSet {
    pub fn rows(&self, table: Table) -> &[Record] {
        match table {
            Table::General => &self.general,
            Table::Crediticio => &self.crediticio,
            Table::AgriculturaIngresos => &self.agricultura,
            Table::Ganaderia => &self.ganaderia,
            Table::Activos => &self.activos,
            Table::AgriculturaRotacion => &self.rotacion,
        }
    }

    fn rows_mut(&mut self, table: Table) -> &mut Vec<Record> {
        match table {
            Table::General => &mut self.general,
            Table::Crediticio => &mut self.crediticio,
            Table::AgriculturaIngresos => &mut self.agricultura,
            Table::Ganaderia => &mut self.ganaderia,
            Table::Activos => &mut self.activos,
            Table::AgriculturaRotacion => &mut self.rotacion,
        }
    }

    pub fn total_records(&self) -> usize {
        Table::ALL.iter().map(|&t| self.rows(t).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }
}

fn read_all(plan: &[(Table, Vec<PathBuf>)]) -> Result<Vec<(Table, PathBuf, String)>, LoadError> {
    thread::scope(|scope| {
        let handles: Vec<_> = plan
            .iter()
            .flat_map(|(table, paths)| paths.iter().map(move |p| (*table, p)))
            .map(|(table, path)| (table, path, scope.spawn(move || fs::read_to_string(path))))
            .collect();

        let mut out = Vec::with_capacity(handles.len());
        for (table, path, handle) in handles {
            let text = handle
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("hilo de lectura abortado")))
                .map_err(|source| LoadError::Read {
                    path: path.clone(),
                    source,
                })?;
            out.push((table, path.clone(), text));
        }
        Ok(out)
    })
}

/// Carga todas las tablas de un directorio.
pub fn load_data_dir(dir: &Path, layout: &TableLayout) -> Result<DataSet, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::MissingDirectory(dir.to_path_buf()));
    }

    let start = Instant::now();
    let files = list_csv_files(dir)?;
    let plan = layout.assign(&files)?;
    let texts = read_all(&plan)?;

    let mut data = DataSet::default();
    for (table, path, text) in texts {
        let (records, stats) = parse_csv_with_stats(&text);
        if stats.short_rows > 0 || stats.long_rows > 0 {
            warn!(
                archivo = %path.display(),
                cortas = stats.short_rows,
                largas = stats.long_rows,
                "filas con cantidad de celdas distinta al header"
            );
        }
        data.rows_mut(table).extend(records);
        data.files.push(FileSummary::new(table, path, text.len(), stats));
    }

    info!(
        directorio = %dir.display(),
        archivos = data.files.len(),
        registros = data.total_records(),
        productores = data.general.len(),
        ms = start.elapsed().as_millis() as u64,
        "✅ datos cargados"
    );
    Ok(data)
}

/// Origen de los datos de la sesión.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DataSource {
    Csv(PathBuf),
    /// Modo degradado tras una carga fallida.
    Sample,
}

/// Token de una carga en curso.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken(u64);

/// Estado de datos de la sesión. Solo la última carga iniciada puede aplicarse.
#[derive(Debug)]
pub struct Session {
    generation: u64,
    data: DataSet,
    source: DataSource,
    last_error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            generation: 0,
            data: DataSet::default(),
            source: DataSource::Sample,
            last_error: None,
        }
    }

    /// Inicia una carga; cualquier token anterior queda invalidado.
    pub fn begin_load(&mut self) -> LoadToken {
        self.generation += 1;
        LoadToken(self.generation)
    }

    /// Aplica el resultado de una carga. Devuelve `false` si el token quedó viejo.
    pub fn complete_load(
        &mut self,
        token: LoadToken,
        source: &Path,
        result: Result<DataSet, LoadError>,
    ) -> bool {
        if token.0 != self.generation {
            warn!(
                token = token.0,
                "resultado de carga descartado (hay una carga más reciente)"
            );
            return false;
        }

        match result {
            Ok(data) => {
                self.data = data;
                self.source = DataSource::Csv(source.to_path_buf());
                self.last_error = None;
            }
            Err(err) => {
                error!(error = %err, "❌ falló la carga de datos, se pasa a modo muestra");
                self.data = DataSet::default();
                self.source = DataSource::Sample;
                self.last_error = Some(err.to_string());
            }
        }
        true
    }

    /// Carga sincrónica completa.
    pub fn load(&mut self, dir: &Path, layout: &TableLayout) -> &DataSource {
        let token = self.begin_load();
        let result = load_data_dir(dir, layout);
        self.complete_load(token, dir, result);
        &self.source
    }

    pub fn data(&self) -> &DataSet {
        &self.data
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tables(dir: &Path) {
        fs::write(dir.join("General.csv"), "CUIT,Razon_Social\n30,LA MARTA\n").unwrap();
        fs::write(dir.join("General_2.csv"), "CUIT,Razon_Social\n27,DON JUAN\n").unwrap();
        fs::write(dir.join("Crediticio.csv"), "CUIT,Tipo_Dato\n30,Score_Crediticio\n").unwrap();
        fs::write(dir.join("Agricultura_Ingresos.csv"), "CUIT,Cultivo\n30,Soja\n").unwrap();
        fs::write(dir.join("Ganaderia.csv"), "CUIT,Tipo_Dato\n").unwrap();
        fs::write(dir.join("Activos.csv"), "CUIT,Tipo_Dato\n30,Valor_Tierra_Simple\n").unwrap();
        fs::write(dir.join("Agricultura_Rotacion.csv"), "CUIT,Cultivo,Ha\n30,Maiz\n").unwrap();
    }

    #[test]
    fn test_load_concatenates_table_files() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());

        let data = load_data_dir(dir.path(), &TableLayout::default()).unwrap();
        assert_eq!(data.general.len(), 2);
        assert_eq!(data.general[1].get("Razon_Social"), Some("DON JUAN"));
        assert_eq!(data.rows(Table::Crediticio).len(), 1);
        assert!(data.ganaderia.is_empty());
        assert_eq!(data.files.len(), 7);
        assert_eq!(data.total_records(), 6);
        let rot = data.files.iter().find(|f| f.table == Table::AgriculturaRotacion).unwrap();
        assert_eq!(rot.short_rows, 1);
    }

    #[test]
    fn test_missing_table_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());
        fs::remove_file(dir.path().join("Activos.csv")).unwrap();

        let err = load_data_dir(dir.path(), &TableLayout::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingTable { table: "Activos", .. }));
    }

    #[test]
    fn test_missing_directory() {
        let err = load_data_dir(Path::new("/no/existe/agro"), &TableLayout::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingDirectory(_)));
    }

    #[test]
    fn test_session_falls_back_to_sample() {
        let mut session = Session::new();
        let source = session.load(Path::new("/no/existe/agro"), &TableLayout::default());
        assert_eq!(source, &DataSource::Sample);
        assert!(session.data().is_empty());
        assert!(session.last_error().is_some());
    }

    #[test]
    fn test_session_discards_stale_result() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());

        let mut session = Session::new();
        let old = session.begin_load();
        let new = session.begin_load();

        let stale = load_data_dir(dir.path(), &TableLayout::default());
        assert!(!session.complete_load(old, dir.path(), stale));
        assert_eq!(session.source(), &DataSource::Sample);

        let fresh = load_data_dir(dir.path(), &TableLayout::default());
        assert!(session.complete_load(new, dir.path(), fresh));
        assert_eq!(session.source(), &DataSource::Csv(dir.path().to_path_buf()));
        assert_eq!(session.data().general.len(), 2);
    }

    #[test]
    fn test_load_invalidates_pending_token() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());

        let mut session = Session::new();
        let pending = session.begin_load();
        session.load(dir.path(), &TableLayout::default());

        // La falla tardía de la carga vieja no pisa los datos nuevos
        let late = Err(LoadError::MissingDirectory(PathBuf::from("/no/existe")));
        assert!(!session.complete_load(pending, dir.path(), late));
        assert!(session.last_error().is_none());
        assert_eq!(session.data().general.len(), 2);
    }

    #[test]
    fn test_custom_layout_prefix() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());
        fs::rename(dir.path().join("Ganaderia.csv"), dir.path().join("Hacienda.csv")).unwrap();

        let layout = TableLayout {
            ganaderia: "Hacienda".to_string(),
            ..TableLayout::default()
        };
        assert!(load_data_dir(dir.path(), &layout).is_ok());
    }
}
