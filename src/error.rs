use std::io;
use std::path::PathBuf;

/// Fallas al cargar un directorio de datos. Cualquiera invalida la carga completa.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("directorio de datos no encontrado: {0}")]
    MissingDirectory(PathBuf),

    #[error("no hay archivos .csv para la tabla {table} (prefijo '{prefix}')")]
    MissingTable { table: &'static str, prefix: String },

    #[error("no se pudo leer {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error de E/S: {0}")]
    Io(#[from] io::Error),
}

/// Fallas al exportar la vista de un productor.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("productor {0} no encontrado")]
    ProducerNotFound(String),

    #[error("error de E/S: {0}")]
    Io(#[from] io::Error),

    #[error("error escribiendo CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("error serializando JSON: {0}")]
    Json(#[from] serde_json::Error),
}
