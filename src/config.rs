use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::agriculture::AgricultureFilters;
use crate::credit::RiskProfile;
use crate::loader::TableLayout;
use crate::view::ViewOptions;

#[derive(Parser, Debug)]
#[command(name = "agro_credit")]
#[command(about = "Capacidad crediticia de productores agropecuarios a partir de tablas CSV")]
#[command(version = env!("AGRO_CREDIT_VERSION"))]
pub struct Cli {
    /// Directorio con los CSV de origen
    #[arg(short, long, env = "AGRO_DATA_DIR", default_value = "data", global = true)]
    pub datos: PathBuf,

    #[command(flatten)]
    pub prefijos: TablePrefixArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Prefijos de nombre de archivo por tabla.
#[derive(Args, Debug, Clone)]
pub struct TablePrefixArgs {
    #[arg(long, env = "AGRO_PREFIJO_GENERAL", default_value = "General", global = true)]
    pub prefijo_general: String,

    #[arg(long, env = "AGRO_PREFIJO_CREDITICIO", default_value = "Crediticio", global = true)]
    pub prefijo_crediticio: String,

    #[arg(
        long,
        env = "AGRO_PREFIJO_AGRICULTURA",
        default_value = "Agricultura_Ingresos",
        global = true
    )]
    pub prefijo_agricultura: String,

    #[arg(long, env = "AGRO_PREFIJO_GANADERIA", default_value = "Ganaderia", global = true)]
    pub prefijo_ganaderia: String,

    #[arg(long, env = "AGRO_PREFIJO_ACTIVOS", default_value = "Activos", global = true)]
    pub prefijo_activos: String,

    #[arg(
        long,
        env = "AGRO_PREFIJO_ROTACION",
        default_value = "Agricultura_Rotacion",
        global = true
    )]
    pub prefijo_rotacion: String,
}

impl TablePrefixArgs {
    pub fn layout(&self) -> TableLayout {
        TableLayout {
            general: self.prefijo_general.clone(),
            crediticio: self.prefijo_crediticio.clone(),
            agricultura_ingresos: self.prefijo_agricultura.clone(),
            ganaderia: self.prefijo_ganaderia.clone(),
            activos: self.prefijo_activos.clone(),
            agricultura_rotacion: self.prefijo_rotacion.clone(),
        }
    }
}

/// Filtros de las secciones agrícola y de activos.
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Perfil de riesgo para simulaciones y escenario post-crédito
    #[arg(long, value_enum, env = "AGRO_PERFIL", default_value_t = RiskProfile::Moderado)]
    pub perfil: RiskProfile,

    /// Campo (Categoria `Campo_*`) para la sección de activos
    #[arg(long)]
    pub campo: Option<String>,

    /// Tenencia de los cultivos (Propios / Alquilados)
    #[arg(long)]
    pub tenencia: Option<String>,

    #[arg(long)]
    pub cultivo: Option<String>,

    /// Provincia para la rotación
    #[arg(long)]
    pub provincia: Option<String>,

    /// Tenencia para la rotación
    #[arg(long)]
    pub tenencia_rotacion: Option<String>,
}

impl ViewArgs {
    pub fn agriculture_filters(&self) -> AgricultureFilters {
        AgricultureFilters {
            tenencia: self.tenencia.clone(),
            cultivo: self.cultivo.clone(),
            rotacion_provincia: self.provincia.clone(),
            rotacion_tenencia: self.tenencia_rotacion.clone(),
        }
    }

    pub fn options(&self) -> ViewOptions {
        ViewOptions {
            perfil: self.perfil,
            campo: self.campo.clone(),
            agricultura: self.agriculture_filters(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// Vista completa del productor
    #[default]
    Json,
    /// Resumen de cultivos por tenencia
    Csv,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lista productores (o sugerencias para un término)
    Productores {
        #[arg(long)]
        buscar: Option<String>,
    },

    /// Informe completo de un productor
    Reporte {
        cuit: String,
        #[command(flatten)]
        vista: ViewArgs,
    },

    /// Polígonos de campos propios y alquilados
    Poligonos { cuit: String },

    /// Parsea un archivo y muestra estadísticas, headers y Tipo_Dato
    Inspeccionar { archivo: PathBuf },

    /// Exporta la vista de un productor
    Exportar {
        cuit: String,
        salida: PathBuf,
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        formato: ExportFormat,
        #[command(flatten)]
        vista: ViewArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_reporte_with_profile() {
        let cli = Cli::try_parse_from([
            "agro_credit",
            "--datos",
            "/tmp/agro",
            "reporte",
            "30513243207",
            "--perfil",
            "agresivo",
            "--tenencia",
            "Propios",
        ])
        .unwrap();
        assert_eq!(cli.datos, PathBuf::from("/tmp/agro"));
        match cli.command {
            Commands::Reporte { cuit, vista } => {
                assert_eq!(cuit, "30513243207");
                assert_eq!(vista.perfil, RiskProfile::Agresivo);
                assert_eq!(vista.agriculture_filters().tenencia.as_deref(), Some("Propios"));
            }
            other => panic!("comando inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_default_layout_from_args() {
        let cli = Cli::try_parse_from(["agro_credit", "productores"]).unwrap();
        assert_eq!(cli.prefijos.layout(), TableLayout::default());
    }
}
