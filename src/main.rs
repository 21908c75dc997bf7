use std::error::Error;

use clap::Parser;
use tracing::{debug, warn};

use agro_credit::commands::{exportar, inspeccionar, poligonos, productores, reporte};
use agro_credit::config::{Cli, Commands};
use agro_credit::loader::{DataSource, Session};

fn main() -> Result<(), Box<dyn Error>> {
    // Logs a stderr; stdout queda para los informes
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agro_credit=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    debug!(version = env!("AGRO_CREDIT_VERSION"), build = env!("BUILD_DATE"), "agro_credit");

    match &cli.command {
        // Trabaja sobre un archivo suelto, sin sesión
        Commands::Inspeccionar { archivo } => inspeccionar::inspeccionar(archivo)?,
        Commands::Productores { buscar } => {
            let session = load_session(&cli);
            productores::listar(session.data(), buscar.as_deref())?
        }
        Commands::Reporte { cuit, vista } => {
            let session = load_session(&cli);
            reporte::mostrar(session.data(), session.source(), cuit, vista)?
        }
        Commands::Poligonos { cuit } => {
            let session = load_session(&cli);
            poligonos::mostrar(session.data(), cuit)?
        }
        Commands::Exportar {
            cuit,
            salida,
            formato,
            vista,
        } => {
            let session = load_session(&cli);
            exportar::exportar(session.data(), cuit, salida, *formato, vista)?
        }
    }

    Ok(())
}

fn load_session(cli: &Cli) -> Session {
    let mut session = Session::new();
    if *session.load(&cli.datos, &cli.prefijos.layout()) == DataSource::Sample {
        warn!(
            directorio = %cli.datos.display(),
            error = session.last_error().unwrap_or("desconocido"),
            "sin datos: modo muestra"
        );
    }
    session
}
