//! Which fuel-per-transport-work ratios apply to which ship types.

use crate::extract::RawFpt;
use crate::model::FuelPerTransportWork;
use crate::parser::round2;

/// Denominators a ship type can meaningfully report against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applicability {
    /// Mass, volume and deadweight of cargo.
    pub cargo: bool,
    pub pax: bool,
    pub freight: bool,
}

pub fn applicability(ship_type: &str) -> Applicability {
    let t = ship_type.to_lowercase();
    let ro_pax = t.contains("ro-pax");
    let passenger = t.contains("passenger") || ro_pax;
    let ro_ro = t.contains("ro-ro") || ro_pax || t.contains("vehicle");

    Applicability {
        cargo: !passenger || ro_pax,
        pax: passenger,
        freight: ro_ro,
    }
}

/// Keeps the published ratios whose denominator applies, rounded to 2 decimals.
pub fn applicable_ratios(ship_type: &str, raw: &RawFpt) -> FuelPerTransportWork {
    let a = applicability(ship_type);
    let keep = |applies: bool, value: Option<f64>| value.filter(|_| applies).map(round2);

    FuelPerTransportWork {
        mass: keep(a.cargo, raw.mass),
        volume: keep(a.cargo, raw.volume),
        dwt: keep(a.cargo, raw.dwt),
        pax: keep(a.pax, raw.pax),
        freight: keep(a.freight, raw.freight),
    }
}
