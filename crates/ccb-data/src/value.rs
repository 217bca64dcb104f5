//! Coercions from the generic property payloads (`serde_json::Value`) into
//! the shapes the legacy format actually stores: numbers, flags, fixed-size
//! float tuples, color channels, and sprite-frame references.

use serde_json::Value;

/// A raw `[x, y, unitType]` tuple as stored for positions and sizes.
/// Interpretation of `unit` is up to the coordinate normalizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizedValue {
    pub x: f32,
    pub y: f32,
    pub unit: i64,
}

impl SizedValue {
    pub fn new(x: f32, y: f32, unit: i64) -> Self {
        Self { x, y, unit }
    }
}

pub fn as_f32(v: &Value) -> Option<f32> {
    v.as_f64().map(|n| n as f32)
}

pub fn as_i64(v: &Value) -> Option<i64> {
    // Some exporters write integral codes as floats.
    v.as_i64().or_else(|| v.as_f64().map(|n| n as i64))
}

pub fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        _ => None,
    }
}

pub fn as_str(v: &Value) -> Option<&str> {
    v.as_str()
}

/// First `N` elements of a numeric array. Longer arrays are fine (the legacy
/// scale tuple carries trailing lock flags); shorter ones are not.
pub fn as_f32_array<const N: usize>(v: &Value) -> Option<[f32; N]> {
    let arr = v.as_array()?;
    if arr.len() < N {
        return None;
    }
    let mut out = [0.0f32; N];
    for (slot, item) in out.iter_mut().zip(arr.iter()) {
        *slot = as_f32(item)?;
    }
    Some(out)
}

pub fn as_bool_array<const N: usize>(v: &Value) -> Option<[bool; N]> {
    let arr = v.as_array()?;
    if arr.len() < N {
        return None;
    }
    let mut out = [false; N];
    for (slot, item) in out.iter_mut().zip(arr.iter()) {
        *slot = as_bool(item)?;
    }
    Some(out)
}

/// `[x, y]` or `[x, y, unitType]`; a missing unit tag reads as absolute (0).
pub fn as_sized(v: &Value) -> Option<SizedValue> {
    let arr = v.as_array()?;
    if arr.len() < 2 {
        return None;
    }
    let x = as_f32(&arr[0])?;
    let y = as_f32(&arr[1])?;
    let unit = arr.get(2).and_then(as_i64).unwrap_or(0);
    Some(SizedValue { x, y, unit })
}

pub fn as_color3(v: &Value) -> Option<[u8; 3]> {
    let [r, g, b] = as_f32_array::<3>(v)?;
    Some([clamp_channel(r), clamp_channel(g), clamp_channel(b)])
}

/// A `[base, variance]` pair of RGBA quads, as the particle color
/// properties store them. Channels are left unscaled here.
pub fn as_color_quad_pair(v: &Value) -> Option<([f32; 4], [f32; 4])> {
    let arr = v.as_array()?;
    if arr.len() < 2 {
        return None;
    }
    Some((as_f32_array::<4>(&arr[0])?, as_f32_array::<4>(&arr[1])?))
}

/// A `[sheet, name]` sprite-frame reference. Either element may be absent or
/// empty; a reference with both empty reads as "no frame".
pub fn as_frame_ref(v: &Value) -> Option<(String, String)> {
    let arr = v.as_array()?;
    if arr.len() < 2 {
        return None;
    }
    let first = arr[0].as_str().unwrap_or_default().to_string();
    let second = arr[1].as_str().unwrap_or_default().to_string();
    if first.is_empty() && second.is_empty() {
        return None;
    }
    Some((first, second))
}

fn clamp_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sized_tolerates_missing_unit() {
        let v = json!([12.0, 34.0]);
        assert_eq!(as_sized(&v), Some(SizedValue::new(12.0, 34.0, 0)));
    }

    #[test]
    fn f32_array_ignores_trailing_elements() {
        // The scale tuple is [sx, sy, locked, unit].
        let v = json!([2.0, 3.0, false, 0]);
        assert_eq!(as_f32_array::<2>(&v), Some([2.0, 3.0]));
        assert_eq!(as_f32_array::<4>(&v), None);
    }

    #[test]
    fn bool_accepts_numeric_flags() {
        assert_eq!(as_bool(&json!(1)), Some(true));
        assert_eq!(as_bool(&json!(0.0)), Some(false));
        assert_eq!(as_bool(&json!("yes")), None);
    }

    #[test]
    fn frame_ref_requires_some_content() {
        assert_eq!(as_frame_ref(&json!(["", ""])), None);
        assert_eq!(
            as_frame_ref(&json!(["sheet.plist", "icon.png"])),
            Some(("sheet.plist".into(), "icon.png".into()))
        );
    }
}
