//! System of units.
//!
//! Lengths are in millimeters, times in nanoseconds and energies in MeV.
//! Multiply a number by a unit to bring it into the system, divide to take
//! it out: `3.0 * units::cm` is 30 and `x / units::us` is `x` in
//! microseconds.
#![allow(non_upper_case_globals)]

pub const mm: f64 = 1.0;
pub const cm: f64 = 10.0 * mm;
pub const m: f64 = 1000.0 * mm;
pub const um: f64 = 1e-3 * mm;

pub const ns: f64 = 1.0;
pub const us: f64 = 1000.0 * ns;
pub const ms: f64 = 1e6 * ns;
pub const s: f64 = 1e9 * ns;

pub const MeV: f64 = 1.0;
pub const keV: f64 = 1e-3 * MeV;
pub const eV: f64 = 1e-6 * MeV;
pub const GeV: f64 = 1e3 * MeV;

/// Unit of electric potential consistent with `eV` for a unit charge.
pub const volt: f64 = 1e-6;
pub const kilovolt: f64 = 1e3 * volt;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_round_trip() {
        assert_relative_eq!(2.5 * cm / mm, 25.0);
        assert_relative_eq!(0.5 * us, 500.0);
        assert_relative_eq!(23.6 * eV / MeV, 23.6e-6);
    }
}
