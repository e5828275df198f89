//! Shareable `key=value&...` encoding of raw control values.
//!
//! Scalars are stored normalised to `[0, 1]` over their range and rounded to
//! three decimals, so `speed = 1.0` on a `[0, 3]` slider encodes as
//! `s=0.333`. Colours are three comma-separated components. Decoding accepts
//! percent escapes and `+` so links that went through a browser still parse.

use std::collections::BTreeMap;

use tracing::debug;

use crate::params::{ParamKind, ParamValue, ParameterSet};

pub fn encode(set: &ParameterSet, values: &BTreeMap<String, ParamValue>) -> String {
    let mut pairs = Vec::with_capacity(set.defs().len());
    for def in set.defs() {
        let Some(value) = values.get(def.key) else {
            continue;
        };
        let encoded = match (def.kind, value) {
            (ParamKind::Scalar { .. }, ParamValue::Scalar(raw)) => {
                let (min, max) = def.range();
                let span = max - min;
                let normalised = if span > 0.0 { (raw - min) / span } else { 0.0 };
                format_component(normalised.clamp(0.0, 1.0))
            }
            (ParamKind::Color { .. }, ParamValue::Color(rgb)) => rgb
                .iter()
                .map(|c| format_component(c.clamp(0.0, 1.0)))
                .collect::<Vec<_>>()
                .join(","),
            _ => continue,
        };
        pairs.push(format!("{}={encoded}", def.query_key));
    }
    pairs.join("&")
}

/// Parses a query string into raw values. Unknown keys and unparsable values
/// are ignored; numbers are clamped to `[0, 1]` before rescaling.
pub fn decode(set: &ParameterSet, query: &str) -> BTreeMap<String, ParamValue> {
    let mut values = BTreeMap::new();
    let query = query.trim().trim_start_matches('?');
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let Some((key, raw)) = pair.split_once('=') else {
            continue;
        };
        let Some(def) = set.defs().iter().find(|def| def.query_key == key) else {
            debug!(key, "ignoring unknown query key");
            continue;
        };
        let raw = percent_decode(raw);
        let parsed = match def.kind {
            ParamKind::Scalar { .. } => {
                let (min, max) = def.range();
                parse_unit(&raw).map(|unit| ParamValue::Scalar(min + unit * (max - min)))
            }
            ParamKind::Color { .. } => parse_color(&raw).map(ParamValue::Color),
        };
        match parsed {
            Some(value) => {
                values.insert(def.key.to_string(), value);
            }
            None => debug!(key, value = %raw, "ignoring malformed query value"),
        }
    }
    values
}

/// Undoes `%XX` escapes and `+` for space. Invalid escapes are kept as-is.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => decoded.push(b' '),
            b'%' => {
                let escaped = bytes
                    .get(i + 1..i + 3)
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                match escaped {
                    Some(byte) => {
                        decoded.push(byte);
                        i += 2;
                    }
                    None => decoded.push(b'%'),
                }
            }
            byte => decoded.push(byte),
        }
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn parse_unit(raw: &str) -> Option<f32> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}

fn parse_color(raw: &str) -> Option<[f32; 3]> {
    let mut parts = raw.split(',').map(parse_unit);
    let rgb = [parts.next()??, parts.next()??, parts.next()??];
    parts.next().is_none().then_some(rgb)
}

fn format_component(value: f32) -> String {
    let text = format!("{value:.3}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::ShaderVariant;

    fn basic() -> ParameterSet {
        ParameterSet::for_variant(ShaderVariant::Basic)
    }

    #[test]
    fn encodes_normalised_rounded_values() {
        let values = BTreeMap::from([
            ("hue".to_string(), ParamValue::Scalar(0.5)),
            ("speed".to_string(), ParamValue::Scalar(1.0)),
            ("intensity".to_string(), ParamValue::Scalar(1.0)),
            ("master".to_string(), ParamValue::Scalar(1.0)),
        ]);
        assert_eq!(encode(&basic(), &values), "h=0.5&s=0.333&i=0.5&m=1");
    }

    #[test]
    fn decodes_rescaled_and_clamped() {
        let values = decode(&basic(), "?h=0.25&s=2&i=-1&zz=4&m=abc");
        assert_eq!(values.get("hue"), Some(&ParamValue::Scalar(0.25)));
        assert_eq!(values.get("speed"), Some(&ParamValue::Scalar(3.0)));
        assert_eq!(values.get("intensity"), Some(&ParamValue::Scalar(0.0)));
        assert!(!values.contains_key("master"));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn colours_accept_escaped_commas() {
        let lab = ParameterSet::for_variant(ShaderVariant::Lab);
        let values = decode(&lab, "ta=1%2C0.5%2C0&tb=0.1,0.2");
        assert_eq!(values.get("themeA"), Some(&ParamValue::Color([1.0, 0.5, 0.0])));
        assert!(!values.contains_key("themeB"));
    }

    #[test]
    fn browser_escapes_are_decoded() {
        let lab = ParameterSet::for_variant(ShaderVariant::Lab);
        let values = decode(&lab, "m=0%2E5&ta=+0.2%2C+0.4%2C0.6&eh=0.1%zz");
        assert_eq!(values.get("master"), Some(&ParamValue::Scalar(0.5)));
        assert_eq!(values.get("themeA"), Some(&ParamValue::Color([0.2, 0.4, 0.6])));
        assert!(!values.contains_key("emblemHue"));
        assert_eq!(percent_decode("50%"), "50%");
    }

    #[test]
    fn lab_query_survives_a_round_trip() {
        let lab = ParameterSet::for_variant(ShaderVariant::Lab);
        let values = BTreeMap::from([
            ("rim".to_string(), ParamValue::Scalar(1.5)),
            ("companionCount".to_string(), ParamValue::Scalar(6.0)),
            ("themeB".to_string(), ParamValue::Color([0.25, 0.5, 0.75])),
        ]);
        let query = encode(&lab, &values);
        assert_eq!(query, "r=0.75&cc=1&tb=0.25,0.5,0.75");
        assert_eq!(decode(&lab, &query), values);
    }
}
