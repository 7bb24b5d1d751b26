//! Physical quantities for multi-state system models.
//!
//! Every boundary between a distribution parameter and a query argument, and
//! every performance value flowing through the composition algebra, carries a
//! [`Quantity`]: a plain `f64` tagged with a [`Unit`]. Operations that would
//! mix dimensions fail with a typed [`UnitError`] rather than a sentinel.
//!
//! # Quick start
//!
//! ```rust
//! use talos_units::{Quantity, Unit};
//!
//! let horizon = Quantity::new(2.0, Unit::Year);
//! assert_eq!(horizon.to_base(), 2.0 * 8760.0); // base time unit is the hour
//!
//! let feeder = Quantity::new(1.5, Unit::MegaWatt);
//! assert!(horizon.same_dimension(&feeder).is_err());
//! ```

mod error;

pub use error::UnitError;

use std::fmt;

/// Physical dimension of a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Pure number (probabilities, counts, weights).
    Dimensionless,
    /// Elapsed or holding time. Base unit: hour.
    Time,
    /// Electrical power. Base unit: kilowatt.
    Power,
    /// Volumetric flow. Base unit: cubic metre per hour.
    Flow,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dimension::Dimensionless => "dimensionless",
            Dimension::Time => "time",
            Dimension::Power => "power",
            Dimension::Flow => "flow",
        };
        f.write_str(s)
    }
}

/// Concrete measurement unit.
///
/// A closed set: the toolkit only needs time scales for holding times and a
/// handful of delivery units for performance values. Each unit knows its
/// [`Dimension`] and its conversion factor to the dimension's base unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Dimensionless (probabilities, per-unit performance).
    One,
    /// Minute.
    Minute,
    /// Hour (base time unit).
    Hour,
    /// Julian year of 8760 hours.
    Year,
    /// Watt.
    Watt,
    /// Kilowatt (base power unit).
    KiloWatt,
    /// Megawatt.
    MegaWatt,
    /// Cubic metre per hour (base flow unit).
    CubicMetrePerHour,
}

impl Unit {
    /// Returns the physical dimension of this unit.
    pub fn dimension(self) -> Dimension {
        match self {
            Unit::One => Dimension::Dimensionless,
            Unit::Minute | Unit::Hour | Unit::Year => Dimension::Time,
            Unit::Watt | Unit::KiloWatt | Unit::MegaWatt => Dimension::Power,
            Unit::CubicMetrePerHour => Dimension::Flow,
        }
    }

    /// Conversion factor from this unit to the base unit of its dimension.
    pub fn base_factor(self) -> f64 {
        match self {
            Unit::One => 1.0,
            Unit::Minute => 1.0 / 60.0,
            Unit::Hour => 1.0,
            Unit::Year => 8760.0,
            Unit::Watt => 1e-3,
            Unit::KiloWatt => 1.0,
            Unit::MegaWatt => 1e3,
            Unit::CubicMetrePerHour => 1.0,
        }
    }

    /// Returns the base unit of this unit's dimension.
    pub fn base_unit(self) -> Unit {
        match self.dimension() {
            Dimension::Dimensionless => Unit::One,
            Dimension::Time => Unit::Hour,
            Dimension::Power => Unit::KiloWatt,
            Dimension::Flow => Unit::CubicMetrePerHour,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unit::One => "1",
            Unit::Minute => "min",
            Unit::Hour => "h",
            Unit::Year => "yr",
            Unit::Watt => "W",
            Unit::KiloWatt => "kW",
            Unit::MegaWatt => "MW",
            Unit::CubicMetrePerHour => "m3/h",
        };
        f.write_str(s)
    }
}

/// An immutable value tagged with a measurement unit.
///
/// Values may be infinite: an unbounded performance level is a legitimate
/// state attribute. NaN is not rejected here; consumers validate where a
/// finite value is required.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    value: f64,
    unit: Unit,
}

impl Quantity {
    /// Creates a quantity from a value and unit.
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// A dimensionless quantity.
    pub fn dimensionless(value: f64) -> Self {
        Self::new(value, Unit::One)
    }

    /// The raw value in this quantity's own unit.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The unit this quantity was constructed with.
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// The physical dimension of this quantity.
    pub fn dimension(&self) -> Dimension {
        self.unit.dimension()
    }

    /// The value converted to the base unit of its dimension.
    pub fn to_base(&self) -> f64 {
        self.value * self.unit.base_factor()
    }

    /// The value converted to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Mismatch`] if `target` has a different dimension.
    pub fn in_unit(&self, target: Unit) -> Result<f64, UnitError> {
        if target.dimension() != self.dimension() {
            return Err(UnitError::Mismatch {
                expected: self.dimension(),
                got: target.dimension(),
            });
        }
        Ok(self.to_base() / target.base_factor())
    }

    /// Checks that `other` shares this quantity's dimension.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Mismatch`] otherwise.
    pub fn same_dimension(&self, other: &Quantity) -> Result<(), UnitError> {
        if self.dimension() != other.dimension() {
            return Err(UnitError::Mismatch {
                expected: self.dimension(),
                got: other.dimension(),
            });
        }
        Ok(())
    }

    /// Checks that this quantity has the given dimension.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Mismatch`] otherwise.
    pub fn expect_dimension(&self, expected: Dimension) -> Result<(), UnitError> {
        if self.dimension() != expected {
            return Err(UnitError::Mismatch {
                expected,
                got: self.dimension(),
            });
        }
        Ok(())
    }

    /// True if the value is ±infinity.
    pub fn is_infinite(&self) -> bool {
        self.value.is_infinite()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit == Unit::One {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}
