use std::error::Error;

use crate::commands::print_banner;
use crate::geo::Polygon;
use crate::loader::DataSet;
use crate::models::Cuit;
use crate::view::ProducerView;

pub fn mostrar(data: &DataSet, cuit: &str) -> Result<(), Box<dyn Error>> {
    let cuit = Cuit::new(cuit);
    let view = ProducerView::build(data, &cuit, Default::default());

    print_banner(&format!("Polígonos: {}", view.razon_social()));
    let Some(snapshot) = &view.snapshot else {
        println!("❌ Productor {} no encontrado", cuit);
        return Ok(());
    };

    print_group("Propios", &view.poligonos_propios, snapshot.centroide_propios);
    print_group("Alquilados", &view.poligonos_alquilados, snapshot.centroide_alquilados);
    Ok(())
}

fn print_group(nombre: &str, poligonos: &[Polygon], centroide: (f64, f64)) {
    println!("🗺️  {}: {} polígono(s)", nombre, poligonos.len());
    if centroide != (0.0, 0.0) {
        println!("   Centroide: {:.5}, {:.5}", centroide.0, centroide.1);
    }
    for (i, poligono) in poligonos.iter().enumerate() {
        println!("   [{}] {} vértices", i + 1, poligono.coordenadas.len());
        for (lat, lng) in poligono.lat_lng() {
            println!("       {:.6}, {:.6}", lat, lng);
        }
    }
    println!();
}
