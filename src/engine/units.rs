//! Unit conversion.
//!
//! This module provides the [`UnitConverter`], a table of direct linear
//! conversions between unit codes. Every supported pair is stored directly:
//! registering `a → b` also stores the exact inverse `b → a`, and lookups never
//! chain two entries together.

use std::collections::{BTreeSet, HashMap};

use crate::error::{EngineError, EngineResult};

/// A linear conversion: `to = from * factor + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    /// Multiplicative factor.
    pub factor: f64,
    /// Additive offset applied after the factor.
    pub offset: f64,
}

impl Conversion {
    fn apply(self, value: f64) -> f64 {
        value * self.factor + self.offset
    }

    fn inverse(self) -> Self {
        Self {
            factor: 1.0 / self.factor,
            offset: -self.offset / self.factor,
        }
    }
}

/// Pounds (avoirdupois) per kilogram, exact by definition.
pub const KG_PER_LB: f64 = 0.453_592_37;

/// Metres per inch, exact by definition.
pub const M_PER_IN: f64 = 0.0254;

/// Converts values between unit codes.
///
/// # Example
///
/// ```
/// use clinical_calculators::engine::UnitConverter;
///
/// let converter = UnitConverter::with_defaults();
/// let kg = converter.convert(154.324, "lb", "kg").unwrap();
/// assert!((kg - 70.0).abs() < 0.001);
///
/// assert!(converter.convert(1.0, "kg", "m").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct UnitConverter {
    table: HashMap<(String, String), Conversion>,
}

impl UnitConverter {
    /// Creates a converter with no conversions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a converter preloaded with mass, length and temperature units.
    pub fn with_defaults() -> Self {
        let mut converter = Self::new();
        for (from, to, factor, offset) in DEFAULT_CONVERSIONS {
            converter.insert_pair(from, to, Conversion { factor: *factor, offset: *offset });
        }
        converter
    }

    /// Registers `from → to` and its inverse.
    ///
    /// Fails if the factor is zero or either number is not finite.
    pub fn register(&mut self, from: &str, to: &str, factor: f64, offset: f64) -> EngineResult<()> {
        let invalid = |message: &str| EngineError::InvalidUnitConversion {
            from: from.to_string(),
            to: to.to_string(),
            message: message.to_string(),
        };

        if from == to {
            return Err(invalid("source and target units are the same"));
        }
        if !factor.is_finite() || !offset.is_finite() {
            return Err(invalid("factor and offset must be finite"));
        }
        if factor == 0.0 {
            return Err(invalid("factor must be non-zero"));
        }

        self.insert_pair(from, to, Conversion { factor, offset });
        Ok(())
    }

    fn insert_pair(&mut self, from: &str, to: &str, conversion: Conversion) {
        self.table
            .insert((from.to_string(), to.to_string()), conversion);
        self.table
            .insert((to.to_string(), from.to_string()), conversion.inverse());
    }

    /// Converts `value` from one unit to another.
    ///
    /// Converting a unit to itself returns the value unchanged. Any other pair
    /// without a direct table entry fails with `UnsupportedConversion`.
    pub fn convert(&self, value: f64, from: &str, to: &str) -> EngineResult<f64> {
        if from == to {
            return Ok(value);
        }
        self.table
            .get(&(from.to_string(), to.to_string()))
            .map(|c| c.apply(value))
            .ok_or_else(|| EngineError::UnsupportedConversion {
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    /// Returns true if `convert(_, from, to)` would succeed.
    pub fn supports(&self, from: &str, to: &str) -> bool {
        from == to || self.table.contains_key(&(from.to_string(), to.to_string()))
    }

    /// Returns every unit code that appears in the table.
    pub fn units(&self) -> BTreeSet<&str> {
        self.table
            .keys()
            .flat_map(|(from, to)| [from.as_str(), to.as_str()])
            .collect()
    }
}

const DEFAULT_CONVERSIONS: &[(&str, &str, f64, f64)] = &[
    // mass
    ("lb", "kg", KG_PER_LB, 0.0),
    ("g", "kg", 0.001, 0.0),
    ("oz", "kg", KG_PER_LB / 16.0, 0.0),
    ("lb", "g", KG_PER_LB * 1000.0, 0.0),
    ("oz", "g", KG_PER_LB * 1000.0 / 16.0, 0.0),
    ("oz", "lb", 1.0 / 16.0, 0.0),
    // length
    ("in", "m", M_PER_IN, 0.0),
    ("cm", "m", 0.01, 0.0),
    ("ft", "m", M_PER_IN * 12.0, 0.0),
    ("in", "cm", M_PER_IN * 100.0, 0.0),
    ("ft", "cm", M_PER_IN * 1200.0, 0.0),
    ("ft", "in", 12.0, 0.0),
    // temperature
    ("degF", "degC", 5.0 / 9.0, -160.0 / 9.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_pound_to_kilogram() {
        let converter = UnitConverter::with_defaults();
        let kg = converter.convert(1.0, "lb", "kg").unwrap();
        assert!(approx(kg, 0.45359237));
    }

    #[test]
    fn test_kilogram_to_pound_is_registered_directly() {
        let converter = UnitConverter::with_defaults();
        let lb = converter.convert(70.0, "kg", "lb").unwrap();
        assert!((lb - 154.3235835).abs() < 1e-6);
    }

    #[test]
    fn test_inch_to_metre() {
        let converter = UnitConverter::with_defaults();
        let m = converter.convert(68.8976, "in", "m").unwrap();
        assert!((m - 1.75).abs() < 1e-4);
    }

    #[test]
    fn test_fahrenheit_to_celsius_uses_offset() {
        let converter = UnitConverter::with_defaults();
        assert!(approx(converter.convert(212.0, "degF", "degC").unwrap(), 100.0));
        assert!(approx(converter.convert(32.0, "degF", "degC").unwrap(), 0.0));
        assert!(approx(converter.convert(37.0, "degC", "degF").unwrap(), 98.6));
    }

    #[test]
    fn test_same_unit_is_identity() {
        let converter = UnitConverter::new();
        assert_eq!(converter.convert(3.5, "kg", "kg").unwrap(), 3.5);
    }

    #[test]
    fn test_unregistered_pair_fails() {
        let converter = UnitConverter::with_defaults();
        match converter.convert(1.0, "kg", "m") {
            Err(EngineError::UnsupportedConversion { from, to }) => {
                assert_eq!(from, "kg");
                assert_eq!(to, "m");
            }
            other => panic!("Expected UnsupportedConversion, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_converter_does_not_fall_back_to_identity() {
        let converter = UnitConverter::new();
        assert!(converter.convert(1.0, "lb", "kg").is_err());
        assert!(!converter.supports("lb", "kg"));
    }

    #[test]
    fn test_register_adds_both_directions() {
        let mut converter = UnitConverter::new();
        converter.register("st", "kg", 6.350_293_18, 0.0).unwrap();
        assert!(converter.supports("st", "kg"));
        assert!(converter.supports("kg", "st"));
        let st = converter.convert(6.350_293_18, "kg", "st").unwrap();
        assert!(approx(st, 1.0));
    }

    #[test]
    fn test_register_rejects_zero_factor() {
        let mut converter = UnitConverter::new();
        let result = converter.register("a", "b", 0.0, 1.0);
        assert!(matches!(result, Err(EngineError::InvalidUnitConversion { .. })));
    }

    #[test]
    fn test_register_rejects_non_finite_values() {
        let mut converter = UnitConverter::new();
        assert!(converter.register("a", "b", f64::NAN, 0.0).is_err());
        assert!(converter.register("a", "b", 1.0, f64::INFINITY).is_err());
        assert!(converter.register("a", "a", 1.0, 0.0).is_err());
    }

    #[test]
    fn test_every_default_pair_is_direct() {
        let converter = UnitConverter::with_defaults();
        for (from, to, _, _) in DEFAULT_CONVERSIONS {
            assert!(converter.supports(from, to));
            assert!(converter.supports(to, from));
        }
        // no implicit chaining across dimensions
        assert!(!converter.supports("lb", "in"));
    }

    #[test]
    fn test_units_lists_all_codes() {
        let converter = UnitConverter::with_defaults();
        let units = converter.units();
        for code in ["kg", "g", "lb", "oz", "m", "cm", "in", "ft", "degC", "degF"] {
            assert!(units.contains(code), "missing unit {}", code);
        }
    }
}
