//! Helpers over `stellar-xdr` `ScVal`s returned by the probe.
//!
//! Read-only calls return plain integers; `HealthRecordedEvent` payloads are
//! symbol-keyed maps. Both arrive as base64 XDR.

use crate::error::{HarnessError, Result};
use stellar_xdr::curr::{
    Int128Parts, Limits, ReadXdr, ScMap, ScSymbol, ScVal, ScVec, StringM, UInt128Parts, WriteXdr,
};

/// Decode a base64 `ScVal` XDR string
pub fn decode(xdr: &str) -> Result<ScVal> {
    Ok(ScVal::from_xdr_base64(xdr.trim(), Limits::none())?)
}

/// Encode an `ScVal` as base64 XDR
pub fn encode(value: &ScVal) -> Result<String> {
    Ok(value.to_xdr_base64(Limits::none())?)
}

/// `ScVal::Symbol` for `name`
pub fn symbol(name: &str) -> Result<ScVal> {
    let name: StringM<32> = name.try_into()?;
    Ok(ScVal::Symbol(ScSymbol(name)))
}

/// Widen any non-negative integer arm to `u128`
pub fn to_u128(value: &ScVal) -> Result<u128> {
    let widened = match value {
        ScVal::U32(v) => Some(u128::from(*v)),
        ScVal::U64(v) => Some(u128::from(*v)),
        ScVal::U128(UInt128Parts { hi, lo }) => Some((u128::from(*hi) << 64) | u128::from(*lo)),
        ScVal::I32(v) => u128::try_from(*v).ok(),
        ScVal::I64(v) => u128::try_from(*v).ok(),
        ScVal::I128(Int128Parts { hi, lo }) => {
            u128::try_from((i128::from(*hi) << 64) | i128::from(*lo)).ok()
        }
        _ => None,
    };
    widened.ok_or_else(|| {
        HarnessError::XdrDecodeError(format!("Expected unsigned integer, got {:?}", value))
    })
}

/// `u128` as `ScVal::U128`
pub fn from_u128(value: u128) -> ScVal {
    ScVal::U128(UInt128Parts {
        hi: (value >> 64) as u64,
        lo: value as u64,
    })
}

/// Look up a symbol-keyed field of an `ScVal::Map`
pub fn map_field<'a>(value: &'a ScVal, name: &str) -> Result<&'a ScVal> {
    let ScVal::Map(Some(ScMap(entries))) = value else {
        return Err(HarnessError::XdrDecodeError(format!(
            "Expected map, got {:?}",
            value
        )));
    };
    entries
        .iter()
        .find(|entry| matches!(&entry.key, ScVal::Symbol(key) if key.0.as_slice() == name.as_bytes()))
        .map(|entry| &entry.val)
        .ok_or_else(|| HarnessError::XdrDecodeError(format!("Missing map field {}", name)))
}

/// Variant name of a unit contract enum, encoded as a one-symbol vector
pub fn enum_variant(value: &ScVal) -> Result<String> {
    if let ScVal::Vec(Some(ScVec(items))) = value {
        if let [ScVal::Symbol(name)] = items.as_slice() {
            return Ok(String::from_utf8_lossy(name.0.as_slice()).into_owned());
        }
    }
    Err(HarnessError::XdrDecodeError(format!(
        "Expected enum variant, got {:?}",
        value
    )))
}
