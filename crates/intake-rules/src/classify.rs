//! Sales-line inference from the free-text concept.

use intake_core::SalesLine;

/// Infer the sales line a concept belongs to.
///
/// Tests run in order and the first hit wins, so a forklift maintenance
/// concept is a forklift service, not plain maintenance. Returns
/// [`SalesLine::Unset`] when nothing matches.
pub fn classify(concept: &str) -> SalesLine {
    let c = concept.trim().to_lowercase();
    if c.is_empty() {
        return SalesLine::Unset;
    }

    if c.contains("montacarg") {
        if c.contains("alquiler") {
            return SalesLine::AlquilerMontacargas;
        }
        return SalesLine::ServicioMontacargas;
    }

    if c.contains("mantenimiento") || c.contains("manten") {
        return SalesLine::Mantenimiento;
    }

    if c.contains("venta") || c.contains("vent") {
        return SalesLine::Venta;
    }

    SalesLine::Unset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_concepts() {
        assert_eq!(classify("Venta de repuestos"), SalesLine::Venta);
        assert_eq!(
            classify("Mantenimiento preventivo montacargas"),
            SalesLine::ServicioMontacargas
        );
        assert_eq!(
            classify("Alquiler de montacargas electrico"),
            SalesLine::AlquilerMontacargas
        );
        assert_eq!(classify("Cotizacion"), SalesLine::Unset);
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(classify(""), SalesLine::Unset);
        assert_eq!(classify("   "), SalesLine::Unset);
    }

    #[test]
    fn test_uppercase_concept_from_normalizer() {
        assert_eq!(classify("VENTA DE BOMBAS"), SalesLine::Venta);
        assert_eq!(classify("REVISION MONTACARGA"), SalesLine::ServicioMontacargas);
    }

    #[test]
    fn test_partial_stems() {
        assert_eq!(classify("mantener equipo"), SalesLine::Mantenimiento);
        assert_eq!(classify("ventas de bombas"), SalesLine::Venta);
        assert_eq!(classify("vent. cilindro"), SalesLine::Venta);
    }

    #[test]
    fn test_verb_vender_is_not_a_stem() {
        assert_eq!(classify("vender cilindro"), SalesLine::Unset);
    }

    #[test]
    fn test_alquiler_without_forklift_is_not_rental() {
        assert_eq!(classify("alquiler de bodega"), SalesLine::Unset);
    }

    #[test]
    fn test_maintenance_outranks_sale() {
        assert_eq!(classify("mantenimiento y venta"), SalesLine::Mantenimiento);
    }
}
