//! Unit handling at the wire boundary.
//!
//! The node reports monetary fields in millisatoshi; everything public in
//! this crate is denominated in satoshi. Conversion happens exactly once,
//! inside the mappers, through the helpers below.

use serde::de::{self, Deserializer};
use serde::Deserialize;

pub const MSAT_PER_SAT: u64 = 1000;

/// Convert a millisatoshi amount to (possibly fractional) satoshi.
#[must_use]
pub fn msat_to_sat(msat: u64) -> f64 {
    msat as f64 / MSAT_PER_SAT as f64
}

/// Convert whole satoshi to millisatoshi. `None` on overflow.
#[must_use]
pub fn sat_to_msat(sat: u64) -> Option<u64> {
    sat.checked_mul(MSAT_PER_SAT)
}

// ==============================================================================
// Wire Encodings
// ==============================================================================

/// A millisatoshi amount as it appears on the wire.
///
/// Accepts a JSON integer (`5000`), a whole float (`5000.0`), a decimal
/// string (`"5000"`), or the suffixed form newer nodes emit (`"5000msat"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireMsat(pub u64);

impl WireMsat {
    #[must_use]
    pub fn to_sat(self) -> f64 {
        msat_to_sat(self.0)
    }
}

impl<'de> Deserialize<'de> for WireMsat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        parse_amount(&value, "msat")
            .map(WireMsat)
            .ok_or_else(|| de::Error::custom(format!("invalid msat amount: {value}")))
    }
}

/// A whole-satoshi amount on the wire: integer or decimal string
/// (`listchannels` has reported `satoshis` both ways), optionally suffixed
/// with `sat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireSat(pub u64);

impl<'de> Deserialize<'de> for WireSat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        parse_amount(&value, "sat")
            .map(WireSat)
            .ok_or_else(|| de::Error::custom(format!("invalid sat amount: {value}")))
    }
}

fn parse_amount(value: &serde_json::Value, suffix: &str) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.strip_suffix(suffix).unwrap_or(s).parse().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn msat_conversion_keeps_fractional_satoshi() {
        assert_eq!(msat_to_sat(5000), 5.0);
        assert_eq!(msat_to_sat(1500), 1.5);
        assert_eq!(msat_to_sat(1), 0.001);
    }

    #[test]
    fn whole_satoshi_amounts_survive_the_trip_back() {
        for msat in [0u64, 1000, 42_000, 21_000_000_000] {
            let sat = msat_to_sat(msat);
            assert_eq!((sat * MSAT_PER_SAT as f64) as u64, msat);
        }
    }

    #[test]
    fn sat_to_msat_detects_overflow() {
        assert_eq!(sat_to_msat(21), Some(21_000));
        assert_eq!(sat_to_msat(u64::MAX), None);
    }

    #[test]
    fn wire_msat_accepts_all_node_encodings() {
        for raw in [json!(5000), json!(5000.0), json!("5000"), json!("5000msat")] {
            let parsed: WireMsat = serde_json::from_value(raw.clone()).expect("must parse");
            assert_eq!(parsed, WireMsat(5000), "input {raw}");
        }
    }

    #[test]
    fn wire_msat_rejects_garbage() {
        for raw in [json!(-1), json!(1.5), json!("lots"), json!(true)] {
            assert!(serde_json::from_value::<WireMsat>(raw).is_err());
        }
    }

    #[test]
    fn wire_sat_parses_decimal_strings() {
        let parsed: WireSat = serde_json::from_value(json!("100000")).expect("must parse");
        assert_eq!(parsed, WireSat(100_000));
        let parsed: WireSat = serde_json::from_value(json!("100000sat")).expect("must parse");
        assert_eq!(parsed, WireSat(100_000));
    }
}
