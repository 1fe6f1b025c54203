//! Unit newtypes for the quantities carried by the network model.
//!
//! Each wrapper is `#[repr(transparent)]` over `f64` and serializes as a bare
//! number, so persisted networks stay readable:
//!
//! ```
//! use powerflow_core::units::{Degrees, Megawatts};
//!
//! let total = Megawatts(90.0) + Megawatts(35.0);
//! assert_eq!(total.value(), 125.0);
//!
//! let angle = Degrees(180.0).to_radians();
//! assert!((angle.value() - std::f64::consts::PI).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Common access to the raw value of a unit newtype.
pub trait Quantity: Copy {
    fn value(self) -> f64;
    fn from_value(value: f64) -> Self;
}

macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl Quantity for $type {
            fn value(self) -> f64 {
                self.0
            }
            fn from_value(value: f64) -> Self {
                Self(value)
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

/// Active power (MW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

/// Reactive power (Mvar)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Megavars(pub f64);

impl_unit_ops!(Megavars, "Mvar");

/// Apparent power (MVA), used for branch ratings
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MegavoltAmperes(pub f64);

impl_unit_ops!(MegavoltAmperes, "MVA");

/// Voltage magnitude in per-unit of the bus base voltage
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct PerUnit(pub f64);

impl_unit_ops!(PerUnit, "pu");

impl PerUnit {
    pub const ONE: Self = Self(1.0);
}

/// Nominal voltage (kV)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Kilovolts(pub f64);

impl_unit_ops!(Kilovolts, "kV");

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Radians(pub f64);

impl_unit_ops!(Radians, "rad");

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Degrees(pub f64);

impl_unit_ops!(Degrees, "°");

impl Radians {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0.to_degrees())
    }
}

impl Degrees {
    #[inline]
    pub fn to_radians(self) -> Radians {
        Radians(self.0.to_radians())
    }
}

/// Serde adapters for limits that may be unbounded.
///
/// JSON has no infinity, so an infinite limit is written as `null` and read back
/// as +inf (`upper`) or -inf (`lower`).
pub mod limit_serde {
    use super::Quantity;
    use serde::{Deserialize, Deserializer, Serializer};

    fn serialize_limit<T: Quantity, S: Serializer>(limit: &T, s: S) -> Result<S::Ok, S::Error> {
        let value = limit.value();
        if value.is_finite() {
            s.serialize_some(&value)
        } else {
            s.serialize_none()
        }
    }

    pub mod upper {
        use super::*;

        pub fn serialize<T: Quantity, S: Serializer>(limit: &T, s: S) -> Result<S::Ok, S::Error> {
            serialize_limit(limit, s)
        }

        pub fn deserialize<'de, T: Quantity, D: Deserializer<'de>>(d: D) -> Result<T, D::Error> {
            Ok(T::from_value(
                Option::<f64>::deserialize(d)?.unwrap_or(f64::INFINITY),
            ))
        }
    }

    pub mod lower {
        use super::*;

        pub fn serialize<T: Quantity, S: Serializer>(limit: &T, s: S) -> Result<S::Ok, S::Error> {
            serialize_limit(limit, s)
        }

        pub fn deserialize<'de, T: Quantity, D: Deserializer<'de>>(d: D) -> Result<T, D::Error> {
            Ok(T::from_value(
                Option::<f64>::deserialize(d)?.unwrap_or(f64::NEG_INFINITY),
            ))
        }
    }
}
