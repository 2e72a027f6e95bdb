//! Named physical constants, in SI units (CODATA 2018).
//!
//! Nothing is predefined implicitly: pass [`physical`] (or a copy extended
//! with your own values) to [`CompiledExpression::parse`] to make these names
//! available.
//!
//! ```
//! # use fieldexpr::{constants, CompiledExpression};
//! let expr = CompiledExpression::parse("m_e * clight^2", &constants::physical()).unwrap();
//! assert!(expr.required_variable_names().is_empty());
//! ```
//!
//! [`CompiledExpression::parse`]: ../struct.CompiledExpression.html#method.parse

use std::collections::HashMap;

/// Speed of light in vacuum, m/s
pub const CLIGHT: f64 = 299_792_458.0;
/// Vacuum magnetic permeability, N/A^2
pub const MU0: f64 = 1.256_637_062_12e-6;
/// Vacuum electric permittivity, F/m
pub const EPSILON0: f64 = 8.854_187_812_8e-12;
/// Elementary charge, C
pub const Q_E: f64 = 1.602_176_634e-19;
/// Electron mass, kg
pub const M_E: f64 = 9.109_383_701_5e-31;
/// Proton mass, kg
pub const M_P: f64 = 1.672_621_923_69e-27;
/// Atomic mass constant, kg
pub const M_U: f64 = 1.660_539_066_60e-27;
/// Boltzmann constant, J/K
pub const KB: f64 = 1.380_649e-23;

/// The table of named physical constants
pub fn physical() -> HashMap<String, f64> {
    [
        ("pi", std::f64::consts::PI),
        ("clight", CLIGHT),
        ("mu0", MU0),
        ("epsilon0", EPSILON0),
        ("q_e", Q_E),
        ("m_e", M_E),
        ("m_p", M_P),
        ("m_u", M_U),
        ("kb", KB),
    ]
    .iter()
    .map(|&(name, value)| (name.to_string(), value))
    .collect()
}
