//! Kubernetes resource quantities
//!
//! Parses the `<number><suffix>` notation used for memory, cpu and storage
//! (`512Mi`, `500m`, `10Gi`, `1e3`) and converts to the integer and float
//! units the flat parameter list exposes. Arithmetic is exact: a quantity
//! is kept as `mantissa * 10^exp10 * 2^exp2`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

static QUANTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<sign>[+-]?)(?P<int>[0-9]*)(?:\.(?P<frac>[0-9]*))?(?P<suffix>[eE][+-]?[0-9]+|[KMGTPE]i|[numkMGTPE]?)$",
    )
    .expect("quantity pattern is valid")
});

/// Significant digits an i128 mantissa can hold with room for scaling
const MAX_DIGITS: usize = 30;

/// Largest decimal exponent accepted in `e` notation
const MAX_EXPONENT: i32 = 64;

/// Bytes-per-unit for the binary units the engine exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryUnit {
    /// Mi, used for memory
    Mebi,
    /// Gi, used for storage sizes
    Gibi,
}

impl BinaryUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            BinaryUnit::Mebi => "Mi",
            BinaryUnit::Gibi => "Gi",
        }
    }

    pub fn scale(&self) -> i64 {
        match self {
            BinaryUnit::Mebi => 1024 * 1024,
            BinaryUnit::Gibi => 1024 * 1024 * 1024,
        }
    }
}

pub const MEMORY_UNIT: BinaryUnit = BinaryUnit::Mebi;
pub const STORAGE_UNIT: BinaryUnit = BinaryUnit::Gibi;

/// Milli-units per core
pub const CPU_SCALE: f64 = 1000.0;

/// A parsed resource quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity {
    mantissa: i128,
    exp10: i32,
    exp2: u32,
}

impl Quantity {
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |message: &str| CoreError::InvalidQuantity {
            input: input.to_string(),
            message: message.to_string(),
        };

        let caps = QUANTITY_RE
            .captures(input.trim())
            .ok_or_else(|| invalid("expected <number><suffix>"))?;

        let int = caps.name("int").map_or("", |m| m.as_str());
        let frac = caps.name("frac").map_or("", |m| m.as_str());
        if int.is_empty() && frac.is_empty() {
            return Err(invalid("missing number"));
        }

        let digits = format!("{}{}", int, frac);
        let digits = digits.trim_start_matches('0');
        if digits.len() > MAX_DIGITS {
            return Err(invalid("too many significant digits"));
        }
        let mut mantissa: i128 = if digits.is_empty() {
            0
        } else {
            digits.parse().map_err(|_| invalid("malformed number"))?
        };
        if caps.name("sign").map(|m| m.as_str()) == Some("-") {
            mantissa = -mantissa;
        }

        let mut exp10 = -(frac.len() as i32);
        let mut exp2 = 0;
        match caps.name("suffix").map_or("", |m| m.as_str()) {
            "" => {}
            "n" => exp10 -= 9,
            "u" => exp10 -= 6,
            "m" => exp10 -= 3,
            "k" => exp10 += 3,
            "M" => exp10 += 6,
            "G" => exp10 += 9,
            "T" => exp10 += 12,
            "P" => exp10 += 15,
            "E" => exp10 += 18,
            "Ki" => exp2 = 10,
            "Mi" => exp2 = 20,
            "Gi" => exp2 = 30,
            "Ti" => exp2 = 40,
            "Pi" => exp2 = 50,
            "Ei" => exp2 = 60,
            exponent => {
                let value: i32 = exponent[1..]
                    .parse()
                    .map_err(|_| invalid("malformed exponent"))?;
                if value.abs() > MAX_EXPONENT {
                    return Err(invalid("exponent out of range"));
                }
                exp10 += value;
            }
        }

        Ok(Self {
            mantissa,
            exp10,
            exp2,
        })
    }

    /// Value in base units, rounded away from zero
    pub fn value(&self) -> Result<i64> {
        self.scaled(0)
    }

    /// Value in thousandths of a base unit, rounded away from zero
    pub fn milli_value(&self) -> Result<i64> {
        self.scaled(3)
    }

    fn scaled(&self, extra_exp10: i32) -> Result<i64> {
        let out_of_range = || CoreError::InvalidQuantity {
            input: self.to_string(),
            message: "value out of range".to_string(),
        };

        let num = 2i128
            .checked_pow(self.exp2)
            .and_then(|factor| self.mantissa.checked_mul(factor))
            .ok_or_else(out_of_range)?;

        let exp = self.exp10 + extra_exp10;
        let scaled = if exp >= 0 {
            10i128
                .checked_pow(exp as u32)
                .and_then(|factor| num.checked_mul(factor))
                .ok_or_else(out_of_range)?
        } else {
            match 10i128.checked_pow(exp.unsigned_abs()) {
                Some(divisor) => {
                    let quotient = num / divisor;
                    if num % divisor == 0 {
                        quotient
                    } else {
                        quotient + num.signum()
                    }
                }
                None => num.signum(),
            }
        };

        i64::try_from(scaled).map_err(|_| out_of_range())
    }
}

impl FromStr for Quantity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}e{}", self.mantissa, self.exp10)?;
        if self.exp2 > 0 {
            write!(f, "*2^{}", self.exp2)?;
        }
        Ok(())
    }
}

/// Parse a quantity into whole `unit`s, truncating any remainder
pub fn parse_binary(input: &str, unit: BinaryUnit) -> Result<i64> {
    Ok(Quantity::parse(input)?.value()? / unit.scale())
}

/// Parse a quantity into a core count (`500m` -> 0.5)
pub fn parse_cores(input: &str) -> Result<f64> {
    Ok(Quantity::parse(input)?.milli_value()? as f64 / CPU_SCALE)
}

/// Format whole units back to a quantity string (`512` -> `512Mi`)
pub fn format_binary(value: i64, unit: BinaryUnit) -> String {
    format!("{}{}", value, unit.suffix())
}

/// Format a core count without suffix, in `%g` style
pub fn format_cores(value: f64) -> String {
    format_general(value)
}

/// Shortest `%g` rendering of a float
///
/// Plain decimal for exponents in `[-4, 6)`, otherwise `d.ddde±XX`.
pub fn format_general(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let sci = format!("{:e}", value);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= 6 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        format!("{}", value)
    }
}
