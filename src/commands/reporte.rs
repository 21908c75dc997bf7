use std::error::Error;

use chrono::Local;

use crate::agriculture::AgricultureView;
use crate::assets::AssetsView;
use crate::commands::{format_money, format_pct, print_banner};
use crate::config::ViewArgs;
use crate::credit::CreditView;
use crate::livestock::LivestockView;
use crate::loader::{DataSet, DataSource};
use crate::models::Cuit;
use crate::view::ProducerView;

pub fn mostrar(
    data: &DataSet,
    source: &DataSource,
    cuit: &str,
    vista: &ViewArgs,
) -> Result<(), Box<dyn Error>> {
    let cuit = Cuit::new(cuit);
    let view = ProducerView::build_with(data, &cuit, &vista.options());

    print_banner(&format!("Informe crediticio: {}", view.razon_social()));
    println!("🆔 CUIT: {}", cuit);
    match source {
        DataSource::Csv(dir) => println!("📂 Datos: {}", dir.display()),
        DataSource::Sample => println!("⚠️  Datos: modo muestra (sin directorio cargado)"),
    }
    println!("🕒 Generado: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    if !cuit.has_valid_check_digit() {
        println!("⚠️  El dígito verificador del CUIT no es válido");
    }
    println!();

    let Some(snapshot) = &view.snapshot else {
        println!("❌ Productor no encontrado en la tabla General");
        return Ok(());
    };

    println!("📋 Resumen general");
    println!("   Hectáreas totales: {:.0}", snapshot.ha_totales);
    println!(
        "   Agrícolas: {:.0} ({:.1}%) | No agrícolas: {:.0} ({:.1}%)",
        snapshot.ha_agricolas_totales,
        snapshot.pct_agricolas,
        snapshot.ha_no_agricolas_totales,
        snapshot.pct_no_agricolas
    );
    println!(
        "   Propias: {:.0} | Arrendadas: {:.0}",
        snapshot.ha_propias_totales(),
        snapshot.ha_arrendadas_totales()
    );
    println!(
        "   Score Nosis: {} | Endeudamiento: {}",
        snapshot.score_nosis,
        format_money(snapshot.endeudamiento)
    );
    println!();

    print_credit(&view.credito);
    print_agriculture(&view.agricultura);
    print_livestock(&view.ganaderia);
    print_assets(&view.activos);

    Ok(())
}

fn print_credit(credito: &CreditView) {
    print_banner(&format!("Capacidad crediticia (perfil {})", credito.perfil));
    let m = &credito.metricas;
    println!("📊 Score Nosis: {:.0}", m.score_nosis.valor);
    println!("💳 Deuda sistema financiero: {}", format_money(m.endeudamiento_total.valor));
    println!("🏦 Bancos con deuda: {:.0}", m.bancos_con_deuda.valor);
    println!("🧾 Cheques rechazados (último año): {:.0}", m.cheques_rechazados.valor);
    println!();

    println!("📐 Niveles por perfil:");
    for nivel in &credito.niveles {
        println!(
            "   {:<12} deuda máx. {:>16} | capacidad {:>16} | ratio {:.2} | garantías {}",
            nivel.perfil.to_string(),
            format_money(nivel.deuda_maxima),
            format_money(nivel.capacidad_adicional),
            nivel.ratio_servicio,
            nivel.limite_garantias
        );
    }
    println!(
        "   Ratio de servicio actual: {:.2} ({:?})",
        credito.ratios.servicio_actual, credito.estado_ratio_servicio
    );
    println!();

    let g = &credito.garantias;
    println!("🛡️  Garantías:");
    println!("   Campo + cría: {}", format_money(g.campo_plus_cria));
    println!("   Activos totales: {}", format_money(g.activos_totales));
    println!("   Cashflow anual: {}", format_money(g.cashflow));
    println!("   Monto recomendado: {}", format_money(g.monto_recomendado));
    println!();

    println!("🧮 Simulaciones:");
    for s in &credito.simulaciones {
        println!(
            "   {:>3} días @ {:.1}%: capital {} | total {} | impacto cashflow {}",
            s.plazo_dias,
            s.tasa * 100.0,
            format_money(s.capital),
            format_money(s.total_pagar),
            format_pct(s.impacto_cashflow)
        );
    }
    println!();

    println!("✔️  Criterios:");
    for c in &credito.criterios {
        let mark = if c.cumple { "✅" } else { "❌" };
        println!("   {} {} (valor {:.0})", mark, c.nombre, c.valor);
    }
    println!();

    let e = &credito.escenario;
    println!("🔮 Escenario post-crédito ({}):", e.perfil);
    println!("   Nueva deuda total: {}", format_money(e.nueva_deuda_total));
    println!(
        "   Deuda/activos: {} (límite {:.1}%){}",
        format_pct(e.ratio_deuda_activos),
        e.limite_deuda_activos * 100.0,
        if e.excede_limite_activos { " ⚠️" } else { "" }
    );
    println!(
        "   Deuda/campo: {} (límite {:.1}%){}",
        format_pct(e.ratio_deuda_campo),
        e.limite_deuda_campo * 100.0,
        if e.excede_limite_campo { " ⚠️" } else { "" }
    );
    println!("   Garantía libre: {}", format_money(e.garantia_libre));
    println!();

    if !credito.bancos.is_empty() {
        println!("🏦 Detalle por banco:");
        for b in &credito.bancos {
            println!("   {:<30} {} ({})", b.banco, format_money(b.monto), format_pct(b.porcentaje));
        }
        println!();
    }
}

fn print_agriculture(agricultura: &AgricultureView) {
    print_banner("Agricultura");
    println!(
        "🌾 Hectáreas propias: {:.0} ({:.1}%) | alquiladas: {:.0} ({:.1}%)",
        agricultura.ha_propias,
        agricultura.pct_propias,
        agricultura.ha_alquiladas,
        agricultura.pct_alquiladas
    );
    println!(
        "💰 Ingresos propios: {} | alquilados: {} | total: {}",
        format_money(agricultura.ingresos.propios),
        format_money(agricultura.ingresos.alquilados),
        format_money(agricultura.ingresos.total)
    );
    println!();

    if agricultura.cultivos.is_empty() {
        println!("   Sin cultivos con detalle productivo");
    }
    for c in &agricultura.cultivos {
        println!(
            "   {:<12} {:<10} {:>8.0} ha | bruto {} | neto {} | margen {:.1}%",
            c.cultivo,
            c.tenencia.as_str(),
            c.hectareas,
            format_money(c.ingreso_bruto),
            format_money(c.ingreso_neto),
            c.margen
        );
    }
    println!(
        "   Totales: {:.0} ha | bruto {} | neto {}",
        agricultura.totales.hectareas,
        format_money(agricultura.totales.ingreso_bruto),
        format_money(agricultura.totales.ingreso_neto)
    );
    println!();

    if !agricultura.rotacion.por_cultivo.is_empty() {
        println!("🔄 Rotación por cultivo:");
        for a in &agricultura.rotacion.por_cultivo {
            println!("   {:<20} {:.0} ha", a.nombre, a.hectareas);
        }
        println!();
    }
}

fn print_livestock(ganaderia: &LivestockView) {
    print_banner("Ganadería");
    if !ganaderia.has_activity() {
        println!("   Sin actividad ganadera");
        println!();
        return;
    }
    println!("🐄 Cabezas totales: {}", ganaderia.cabezas_totales);
    println!(
        "   Cría: {} ({:.1}%) | Engorde: {} ({:.1}%)",
        ganaderia.stock_cria, ganaderia.pct_cria, ganaderia.stock_engorde, ganaderia.pct_engorde
    );
    println!("   Carga animal: {:.2}", ganaderia.carga_animal);
    println!(
        "💰 Ingresos: {} | Costos: {} | Margen: {}",
        format_money(ganaderia.ingresos),
        format_money(ganaderia.costos),
        format_money(ganaderia.margen)
    );
    for v in &ganaderia.valuaciones_historicas {
        println!("   Valuación {}: {}", v.titulo, format_money(v.valor));
    }
    println!();
}

fn print_assets(activos: &AssetsView) {
    print_banner("Activos y garantías");
    if let Some(campo) = &activos.campo_seleccionado {
        println!("📍 Campo: {}", campo);
    }
    println!("🏞️  Hectáreas propias: {:.0}", activos.ha_propias_totales);
    println!(
        "   Valor tierra promedio: {} | mínimo: {}",
        format_money(activos.valor_tierra_promedio),
        format_money(activos.valor_tierra_minimo)
    );
    println!("   Valuación propias: {}", format_money(activos.valuacion_total_propias));
    println!("   Campo + cría: {}", format_money(activos.valor_campo_plus_cria));
    if let Some(riesgo) = &activos.riesgo_hidrico {
        println!("💧 Riesgo hídrico: {}", riesgo);
    }
    for p in &activos.garantias_por_periodo {
        println!("   {:<10} activos {}", p.periodo, format_money(p.activos_total));
    }
    println!();
}
