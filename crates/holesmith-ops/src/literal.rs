// literal.rs
//! Rendering values as source literals.

use std::fmt::Write;

use crate::value::Value;

impl Value {
    /// Render the value as a literal expression of its own type.
    ///
    /// Sub-int integral literals carry an explicit cast so that the rendered
    /// expression has the same static type as the value.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Char(c) => char_literal(*c),
            Value::Byte(v) => format!("((byte) {v})"),
            Value::Short(v) => format!("((short) {v})"),
            Value::Int(v) => v.to_string(),
            Value::Long(v) => format!("{v}L"),
            Value::Float(v) => float_literal(*v),
            Value::Double(v) => double_literal(*v),
            Value::Array(elem, items) => {
                let mut out = format!("new {elem}[] {{");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&item.to_literal());
                }
                out.push('}');
                out
            }
        }
    }
}

fn char_literal(c: u16) -> String {
    let escaped = match c {
        0x08 => "\\b".to_string(),
        0x09 => "\\t".to_string(),
        0x0a => "\\n".to_string(),
        0x0c => "\\f".to_string(),
        0x0d => "\\r".to_string(),
        0x22 => "\\\"".to_string(),
        0x27 => "\\'".to_string(),
        0x5c => "\\\\".to_string(),
        0x20..=0x7e => char::from(c as u8).to_string(),
        _ => {
            let mut s = String::new();
            let _ = write!(s, "\\u{c:04x}");
            s
        }
    };
    format!("'{escaped}'")
}

fn float_literal(v: f32) -> String {
    if v.is_nan() {
        "Float.NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "Float.POSITIVE_INFINITY".to_string()
        } else {
            "Float.NEGATIVE_INFINITY".to_string()
        }
    } else {
        format!("{v:?}f")
    }
}

fn double_literal(v: f64) -> String {
    if v.is_nan() {
        "Double.NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "Double.POSITIVE_INFINITY".to_string()
        } else {
            "Double.NEGATIVE_INFINITY".to_string()
        }
    } else {
        format!("{v:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveType;

    #[test]
    fn scalar_literals() {
        assert_eq!(Value::Int(-3).to_literal(), "-3");
        assert_eq!(Value::Long(7).to_literal(), "7L");
        assert_eq!(Value::Byte(-1).to_literal(), "((byte) -1)");
        assert_eq!(Value::Float(1.0).to_literal(), "1.0f");
        assert_eq!(Value::Double(-0.5).to_literal(), "-0.5");
        assert_eq!(Value::Double(f64::NAN).to_literal(), "Double.NaN");
        assert_eq!(Value::Bool(true).to_literal(), "true");
    }

    #[test]
    fn char_literals_escape_specials() {
        assert_eq!(Value::Char(u16::from(b'a')).to_literal(), "'a'");
        assert_eq!(Value::Char(0x27).to_literal(), "'\\''");
        assert_eq!(Value::Char(0x0a).to_literal(), "'\\n'");
        assert_eq!(Value::Char(0xffff).to_literal(), "'\\uffff'");
        assert_eq!(Value::Char(0).to_literal(), "'\\u0000'");
    }

    #[test]
    fn array_literal() {
        let arr = Value::Array(PrimitiveType::Int, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(arr.to_literal(), "new int[] {1, 2}");
    }
}
