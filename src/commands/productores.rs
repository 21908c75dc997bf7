use std::error::Error;

use crate::commands::print_banner;
use crate::loader::DataSet;
use crate::view::{directory, search, suggestions};

pub fn listar(data: &DataSet, buscar: Option<&str>) -> Result<(), Box<dyn Error>> {
    let entries = directory(data);

    print_banner("Productores");
    println!("👥 Productores en la tabla General: {}", entries.len());
    println!();

    match buscar {
        Some(term) if !term.is_empty() => {
            let total = search(&entries, term).len();
            let top = suggestions(&entries, term);
            println!("🔍 Búsqueda: \"{}\" ({} coincidencias)", term, total);
            if top.is_empty() {
                println!("   ❌ Sin resultados");
            }
            for entry in top {
                println!("   {}  {}", entry.cuit, entry.razon_social);
            }
            if total > crate::view::MAX_SUGGESTIONS {
                println!("   ... y {} más", total - crate::view::MAX_SUGGESTIONS);
            }
        }
        _ => {
            for entry in &entries {
                println!("   {}  {}", entry.cuit, entry.razon_social);
            }
        }
    }

    Ok(())
}
