// random.rs
//! Random draws over primitive domains.

use rand::Rng;

use crate::types::PrimitiveType;
use crate::value::Value;

/// Draw a value uniformly from the full range of `prim`.
///
/// Floating-point draws are uniform in magnitude over `[0, MAX)` with a
/// random sign. Chars are drawn from the full 16-bit range.
pub fn draw<R: Rng + ?Sized>(prim: PrimitiveType, rng: &mut R) -> Value {
    match prim {
        PrimitiveType::Bool => Value::Bool(rng.gen_bool(0.5)),
        PrimitiveType::Char => Value::Char(rng.gen_range(u16::MIN..=u16::MAX)),
        PrimitiveType::Byte => Value::Byte(rng.gen_range(i8::MIN..=i8::MAX)),
        PrimitiveType::Short => Value::Short(rng.gen_range(i16::MIN..=i16::MAX)),
        PrimitiveType::Int => Value::Int(rng.gen_range(i32::MIN..=i32::MAX)),
        PrimitiveType::Long => Value::Long(rng.gen_range(i64::MIN..=i64::MAX)),
        PrimitiveType::Float => {
            let magnitude = rng.gen_range(0.0f32..1.0) * f32::MAX;
            Value::Float(if rng.gen_bool(0.5) { magnitude } else { -magnitude })
        }
        PrimitiveType::Double => {
            let magnitude = rng.gen_range(0.0f64..1.0) * f64::MAX;
            Value::Double(if rng.gen_bool(0.5) { magnitude } else { -magnitude })
        }
    }
}

/// Draw a value of `prim` uniformly from `[low, high)`.
///
/// Integral types draw integers; floating-point types draw continuously.
/// Returns `None` for `boolean` or an empty range.
pub fn draw_between<R: Rng + ?Sized>(
    prim: PrimitiveType,
    low: i64,
    high: i64,
    rng: &mut R,
) -> Option<Value> {
    if low >= high {
        return None;
    }
    match prim {
        PrimitiveType::Bool => None,
        PrimitiveType::Float => {
            let (l, h) = (low as f32, high as f32);
            let v = l + (h - l) * rng.gen_range(0.0f32..1.0);
            Some(Value::Float(if v < h { v } else { l }))
        }
        PrimitiveType::Double => {
            let (l, h) = (low as f64, high as f64);
            let v = l + (h - l) * rng.gen_range(0.0f64..1.0);
            Some(Value::Double(if v < h { v } else { l }))
        }
        integral => Value::from_i64(integral, rng.gen_range(low..high)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn bounded_draws_stay_in_range() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        for _ in 0..10_000 {
            let v = draw_between(PrimitiveType::Int, -3, 4, &mut rng).unwrap();
            let n = v.as_i64().unwrap();
            assert!((-3..4).contains(&n));

            let d = draw_between(PrimitiveType::Double, 0, 1, &mut rng).unwrap();
            let x = d.as_f64().unwrap();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn empty_or_boolean_ranges_yield_nothing() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        assert!(draw_between(PrimitiveType::Int, 2, 2, &mut rng).is_none());
        assert!(draw_between(PrimitiveType::Bool, 0, 2, &mut rng).is_none());
    }

    #[test]
    fn unbounded_draws_have_requested_type() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for prim in PrimitiveType::ALL {
            for _ in 0..100 {
                let v = draw(*prim, &mut rng);
                assert_eq!(v.ty(), crate::Type::Primitive(*prim));
                if let Some(x) = v.as_f64() {
                    assert!(x.is_finite());
                }
            }
        }
    }
}
