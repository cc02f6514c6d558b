use ion_core::context::{DecContext, DEC_INEXACT, DEC_OVERFLOW};
use ion_core::error::IonError;
use ion_core::prelude::*;

/// Context used across these tests; wide enough that only deliberate
/// overflows hit the precision ceiling.
fn test_context() -> DecContext {
    DecContext::new(100)
}

fn dec(text: &str, ctx: &mut DecContext) -> IonDecimal {
    IonDecimal::from_string(text, ctx).expect("parse decimal")
}

fn assert_decimal_eq(expected: &IonDecimal, actual: &IonDecimal) {
    assert!(
        expected.eq_value(actual),
        "expected {expected}, got {actual}"
    );
}

#[test]
fn fma_quad_operands() {
    let mut ctx = test_context();
    let lhs = IonDecimal::from_int32(10);
    let rhs = IonDecimal::from_int32(10);
    let fhs = IonDecimal::from_int32(1);
    let result = lhs.fma(&rhs, &fhs, &mut ctx).expect("fma");
    assert_decimal_eq(&IonDecimal::from_int32(101), &result);
    assert!(result.is_quad());
}

#[test]
fn fma_in_place_all_operands_same() {
    let mut ctx = test_context();
    let mut lhs = IonDecimal::from_int32(10);
    lhs = lhs.fma(&lhs.clone(), &lhs.clone(), &mut ctx).expect("fma");
    assert_decimal_eq(&IonDecimal::from_int32(110), &lhs);
    assert!(lhs.is_quad());
}

#[test]
fn fma_number_operands() {
    let mut ctx = test_context();
    let lhs = dec("100000000000000000000000000000000000001.", &mut ctx);
    let rhs = dec("100000000000000000000000000000000000001.", &mut ctx);
    let fhs = dec("-100000000000000000000000000000000000001.", &mut ctx);
    let result = lhs.fma(&rhs, &fhs, &mut ctx).expect("fma");
    let expected = dec(
        "10000000000000000000000000000000000000100000000000000000000000000000000000000.",
        &mut ctx,
    );
    assert_decimal_eq(&expected, &result);
    assert!(result.is_number());
}

#[test]
fn fma_mixed_operands() {
    let mut ctx = test_context();
    // One number operand forces the whole calculation into number space.
    let lhs = dec("100000000000000000000000000000000000001.", &mut ctx);
    let rhs = IonDecimal::from_int32(10);
    let fhs = IonDecimal::from_int32(1);
    let result = lhs.fma(&rhs, &fhs, &mut ctx).expect("fma");
    let expected = dec("1000000000000000000000000000000000000011.", &mut ctx);
    assert_decimal_eq(&expected, &result);

    // The operation did not change the operands.
    assert!(rhs.is_quad());
    assert!(fhs.is_quad());
    assert!(lhs.is_number());
}

#[test]
fn fma_mixed_in_place_number() {
    let mut ctx = test_context();
    let mut lhs = dec("100000000000000000000000000000000000001.", &mut ctx);
    let rhs = IonDecimal::from_int32(10);
    let fhs = IonDecimal::from_int32(1);
    lhs = lhs.fma(&rhs, &fhs, &mut ctx).expect("fma");
    let expected = dec("1000000000000000000000000000000000000011.", &mut ctx);
    assert_decimal_eq(&expected, &lhs);
    assert!(rhs.is_quad());
    assert!(fhs.is_quad());
}

#[test]
fn fma_mixed_in_place_quad() {
    let mut ctx = test_context();
    let lhs = dec("100000000000000000000000000000000000001.", &mut ctx);
    let rhs = IonDecimal::from_int32(10);
    let mut fhs = IonDecimal::from_int32(1);
    fhs = lhs.fma(&rhs, &fhs, &mut ctx).expect("fma");
    let expected = dec("1000000000000000000000000000000000000011.", &mut ctx);
    assert_decimal_eq(&expected, &fhs);
    assert!(lhs.is_number());
    assert!(rhs.is_quad());
}

#[test]
fn fma_quad_overflows() {
    let mut ctx = test_context();
    // Exactly 34 digits, so it fits a quad.
    let lhs = dec("1000000000000000000000000000000001.", &mut ctx);
    let rhs = IonDecimal::from_int32(10);
    let fhs = IonDecimal::from_int32(1);
    assert!(lhs.is_quad());
    // The engine tries quads first, detects the overflow, and upgrades.
    let result = lhs.fma(&rhs, &fhs, &mut ctx).expect("fma");
    let expected = dec("10000000000000000000000000000000011.", &mut ctx);
    assert_decimal_eq(&expected, &result);
    assert!(result.is_number());
    assert!(lhs.is_quad());
    assert!(rhs.is_quad());
    assert!(fhs.is_quad());
}

#[test]
fn fma_quad_overflows_in_place() {
    let mut ctx = test_context();
    let mut lhs = dec("1000000000000000000000000000000001.", &mut ctx);
    let rhs = IonDecimal::from_int32(10);
    let fhs = IonDecimal::from_int32(1);
    lhs = lhs.fma(&rhs, &fhs, &mut ctx).expect("fma");
    let expected = dec("10000000000000000000000000000000011.", &mut ctx);
    assert_decimal_eq(&expected, &lhs);
    assert!(lhs.is_number());
    assert!(rhs.is_quad());
    assert!(fhs.is_quad());
}

#[test]
fn fma_quad_overflows_two_operands_same_as_output() {
    let mut ctx = test_context();
    let lhs = dec("1000000000000000000000000000000001.", &mut ctx);
    let mut rhs = IonDecimal::from_int32(11);
    rhs = lhs.fma(&rhs.clone(), &rhs, &mut ctx).expect("fma");
    let expected = dec("11000000000000000000000000000000022.", &mut ctx);
    assert_decimal_eq(&expected, &rhs);
    assert!(rhs.is_number());
    assert!(lhs.is_quad());
}

#[test]
fn add_quad_operands() {
    let mut ctx = test_context();
    let result = IonDecimal::from_int32(9)
        .add(&IonDecimal::from_int32(1), &mut ctx)
        .expect("add");
    assert_decimal_eq(&IonDecimal::from_int32(10), &result);
    assert!(result.is_quad());
}

#[test]
fn add_number_operands() {
    let mut ctx = test_context();
    let lhs = dec("100000000000000000000000000000000000001.", &mut ctx);
    let result = lhs.add(&lhs, &mut ctx).expect("add");
    let expected = dec("200000000000000000000000000000000000002.", &mut ctx);
    assert_decimal_eq(&expected, &result);
    assert!(result.is_number());
}

#[test]
fn add_mixed_operands() {
    let mut ctx = test_context();
    let lhs = dec("100000000000000000000000000000000000002.", &mut ctx);
    let rhs = IonDecimal::from_int32(-1);
    let result = lhs.add(&rhs, &mut ctx).expect("add");
    let expected = dec("100000000000000000000000000000000000001.", &mut ctx);
    assert_decimal_eq(&expected, &result);
    assert!(rhs.is_quad());
}

#[test]
fn add_quad_overflows() {
    let mut ctx = test_context();
    // 34 nines: the largest coefficient a quad can carry.
    let lhs = dec("9999999999999999999999999999999999.", &mut ctx);
    let rhs = IonDecimal::from_int32(2);
    let result = lhs.add(&rhs, &mut ctx).expect("add");
    let expected = dec("10000000000000000000000000000000001.", &mut ctx);
    assert_decimal_eq(&expected, &result);
    assert!(result.is_number());
    assert!(lhs.is_quad());
    assert!(rhs.is_quad());
}

#[test]
fn add_quad_overflows_in_place() {
    let mut ctx = test_context();
    let mut lhs = dec("9999999999999999999999999999999999.", &mut ctx);
    let rhs = IonDecimal::from_int32(2);
    lhs = lhs.add(&rhs, &mut ctx).expect("add");
    let expected = dec("10000000000000000000000000000000001.", &mut ctx);
    assert_decimal_eq(&expected, &lhs);
    assert!(lhs.is_number());
    assert!(rhs.is_quad());
}

#[test]
fn add_in_place_all_operands_same() {
    let mut ctx = test_context();
    let mut lhs = IonDecimal::from_int32(1);
    lhs = lhs.add(&lhs.clone(), &mut ctx).expect("add");
    assert_decimal_eq(&IonDecimal::from_int32(2), &lhs);
    assert!(lhs.is_quad());
}

#[test]
fn subtract_and_multiply_and_divide() {
    let mut ctx = test_context();
    let six = IonDecimal::from_int32(6);
    let four = IonDecimal::from_int32(4);
    assert_decimal_eq(
        &IonDecimal::from_int32(2),
        &six.subtract(&four, &mut ctx).expect("subtract"),
    );
    assert_decimal_eq(
        &IonDecimal::from_int32(24),
        &six.multiply(&four, &mut ctx).expect("multiply"),
    );
    let quotient = six.divide(&four, &mut ctx).expect("divide");
    assert_decimal_eq(&dec("1.5", &mut ctx), &quotient);
}

#[test]
fn divide_integer_and_remainders() {
    let mut ctx = test_context();
    let a = IonDecimal::from_int32(17);
    let b = IonDecimal::from_int32(5);
    assert_decimal_eq(
        &IonDecimal::from_int32(3),
        &a.divide_integer(&b, &mut ctx).expect("divide_integer"),
    );
    assert_decimal_eq(
        &IonDecimal::from_int32(2),
        &a.remainder(&b, &mut ctx).expect("remainder"),
    );
    let near = IonDecimal::from_int32(18)
        .remainder_near(&b, &mut ctx)
        .expect("remainder_near");
    assert_decimal_eq(&IonDecimal::from_int32(-2), &near);
}

#[test]
fn min_max_and_magnitudes() {
    let mut ctx = test_context();
    let neg_nine = IonDecimal::from_int32(-9);
    let three = IonDecimal::from_int32(3);
    assert_decimal_eq(&three, &neg_nine.max(&three, &mut ctx).expect("max"));
    assert_decimal_eq(&neg_nine, &neg_nine.min(&three, &mut ctx).expect("min"));
    assert_decimal_eq(&neg_nine, &neg_nine.max_mag(&three, &mut ctx).expect("max_mag"));
    assert_decimal_eq(&three, &neg_nine.min_mag(&three, &mut ctx).expect("min_mag"));
}

#[test]
fn quantize_rescales() {
    let mut ctx = test_context();
    let value = dec("2.17", &mut ctx);
    let quantum = dec("0.001", &mut ctx);
    let result = value.quantize(&quantum, &mut ctx).expect("quantize");
    assert_eq!(result.exponent(), -3);
    assert_decimal_eq(&dec("2.170", &mut ctx), &result);
}

#[test]
fn scaleb_shift_rotate_and_logicals() {
    let mut ctx = test_context();
    let value = dec("1.5", &mut ctx);
    let scaled = value.scaleb(&IonDecimal::from_int32(2), &mut ctx).expect("scaleb");
    // Scaling moves the exponent only; the coefficient stays 15.
    assert_decimal_eq(&dec("1.5d2", &mut ctx), &scaled);

    let shifted = IonDecimal::from_int32(123)
        .shift(&IonDecimal::from_int32(1), &mut ctx)
        .expect("shift");
    assert_decimal_eq(&IonDecimal::from_int32(1230), &shifted);

    let rotated = IonDecimal::from_int32(123)
        .rotate(&IonDecimal::from_int32(-1), &mut ctx)
        .expect("rotate");
    // The low-order digit wraps to the top of the 34-digit window.
    let expected = dec("3000000000000000000000000000000012", &mut ctx);
    assert_decimal_eq(&expected, &rotated);

    let and = dec("1101", &mut ctx)
        .and(&dec("1011", &mut ctx), &mut ctx)
        .expect("and");
    assert_decimal_eq(&dec("1001", &mut ctx), &and);
    let or = dec("1100", &mut ctx)
        .or(&dec("0011", &mut ctx), &mut ctx)
        .expect("or");
    assert_decimal_eq(&dec("1111", &mut ctx), &or);
    let xor = dec("1101", &mut ctx)
        .xor(&dec("1011", &mut ctx), &mut ctx)
        .expect("xor");
    assert_decimal_eq(&dec("110", &mut ctx), &xor);
}

#[test]
fn abs_and_sign_family() {
    let mut ctx = test_context();
    let negative = dec("-1.5", &mut ctx);
    assert!(negative.is_negative());
    assert!(!negative.abs(&mut ctx).expect("abs").is_negative());
    assert!(!negative.minus(&mut ctx).expect("minus").is_negative());
    assert!(negative.plus(&mut ctx).expect("plus").is_negative());

    let number = dec("-100000000000000000000000000000000000001.", &mut ctx);
    let abs = number.abs(&mut ctx).expect("abs");
    assert!(!abs.is_negative());
    assert!(abs.is_number());

    let donor = IonDecimal::from_int32(-1);
    let signed = dec("7", &mut ctx).copy_sign(&donor, &mut ctx).expect("copy_sign");
    assert_decimal_eq(&dec("-7", &mut ctx), &signed);
}

#[test]
fn equals_is_representation_sensitive() {
    let mut ctx = test_context();
    assert!(!dec("1.0", &mut ctx).eq_value(&dec("1.00", &mut ctx)));
    assert!(dec("1.0", &mut ctx).eq_value(&dec("1.0", &mut ctx)));
    // Negative zero is distinct from positive zero.
    assert!(!dec("0", &mut ctx).eq_value(&dec("-0", &mut ctx)));
}

#[test]
fn equals_with_mixed_representations() {
    let mut ctx = test_context();
    let quad = IonDecimal::from_int32(7);
    let number = IonDecimal::from_number(
        match dec("7", &mut ctx) {
            IonDecimal::Quad(q) => q.to_number(),
            IonDecimal::Number { value, .. } => *value,
        },
    );
    assert!(number.is_number());
    // The quad is converted to number form for the comparison.
    assert!(quad.eq_value(&number));
    assert!(number.eq_value(&quad));
}

#[test]
fn from_string_fails_on_loss_of_precision() {
    // 40 significant digits cannot fit a 39-digit context.
    let mut ctx = DecContext::new(39);
    let result = IonDecimal::from_string("1.000000000000000000000000000000000000001e-2", &mut ctx);
    assert_eq!(result.unwrap_err(), IonError::NumericOverflow);
}

#[test]
fn from_string_preserves_up_to_34_digits_in_quads() {
    let mut ctx = test_context();
    let at_limit = dec("1.000000000000000000000000000000001", &mut ctx);
    assert!(at_limit.is_quad());
    assert_eq!(at_limit.digits(), 34);
    let over_limit = dec("1.0000000000000000000000000000000001", &mut ctx);
    assert!(over_limit.is_number());
    assert_eq!(over_limit.digits(), 35);
}

#[test]
fn status_flags_are_restored_around_upgrades() {
    let mut ctx = test_context();
    ctx.raise(DEC_OVERFLOW);
    let lhs = dec("9999999999999999999999999999999999.", &mut ctx);
    let _ = lhs.add(&IonDecimal::from_int32(2), &mut ctx).expect("add");
    assert!(!ctx.test_status(DEC_INEXACT), "upgrade hides the quad inexact");
    assert!(ctx.test_status(DEC_OVERFLOW), "unrelated flags survive");
}

#[test]
fn to_and_from_string_round_trips() {
    let mut ctx = test_context();
    for text in [
        "0",
        "-0",
        "0.00",
        "123.",
        "-123.456",
        "1d10",
        "1.5d-8",
        "9999999999999999999999999999999999.",
        "99999999999999999999999999999999999.",
        "3.14159265358979323846264338327950288",
    ] {
        let value = dec(text, &mut ctx);
        let rendered = value.to_decimal_string();
        let reparsed = dec(&rendered, &mut ctx);
        assert_decimal_eq(&value, &reparsed);
    }
}

#[test]
fn to_int32_families() {
    let mut ctx = test_context();
    assert_eq!(dec("32", &mut ctx).to_int32(&mut ctx).expect("to_int32"), 32);
    assert_eq!(dec("-32", &mut ctx).to_int32(&mut ctx).expect("to_int32"), -32);
    assert_eq!(dec("32", &mut ctx).to_uint32(&mut ctx).expect("to_uint32"), 32);
    assert_eq!(
        dec("3.2", &mut ctx).to_int32(&mut ctx).unwrap_err(),
        IonError::NumericOverflow
    );
    assert!(matches!(
        dec("-1", &mut ctx).to_uint32(&mut ctx),
        Err(IonError::InvalidArg(_))
    ));
    assert!(matches!(
        dec("5000000000", &mut ctx).to_int32(&mut ctx),
        Err(IonError::InvalidArg(_))
    ));
}

#[test]
fn to_big_int_requires_integer() {
    let mut ctx = test_context();
    let int = dec("123d3", &mut ctx).to_big_int().expect("to_big_int");
    assert_eq!(int.to_string(), "123000");
    assert!(matches!(
        dec("1.5", &mut ctx).to_big_int(),
        Err(IonError::InvalidArg(_))
    ));
}

#[test]
fn classification_predicates() {
    let mut ctx = test_context();
    let value = dec("-1.50", &mut ctx);
    assert!(value.is_finite());
    assert!(!value.is_infinite());
    assert!(!value.is_nan());
    assert!(value.is_negative());
    assert!(!value.is_zero());
    assert!(value.is_canonical());
    assert!(value.is_normal(&ctx));
    assert!(!value.is_subnormal(&ctx));
    assert!(!value.is_integer());
    assert!(dec("15", &mut ctx).is_integer());
    assert_eq!(value.digits(), 3);
    assert_eq!(value.exponent(), -2);
    assert_eq!(value.radix(), 10);
    assert!(value.same_quantum(&dec("9.99", &mut ctx)));
}

#[test]
fn claim_extends_lifetime_and_release_frees() {
    let mut ctx = test_context();
    let mut value = dec("100000000000000000000000000000000000001.", &mut ctx);
    assert!(value.is_number());
    value.claim();
    value.release();
    assert!(value.is_quad());
    assert!(value.is_zero());

    // Claim and release are no-ops for quads.
    let mut quad = IonDecimal::from_int32(3);
    quad.claim();
    quad.release();
    assert_decimal_eq(&IonDecimal::from_int32(3), &quad);
}

#[test]
fn quad_legacy_helpers() {
    let quad = Quad::from_digits_and_exponent(1099511627776, -4, false);
    let as_decimal = IonDecimal::from_quad(quad);
    assert_eq!(as_decimal.digits(), 13);
    assert_eq!(as_decimal.exponent(), -4);

    let integral = Quad::from_digits_and_exponent(42, 0, false);
    assert_eq!(integral.to_int64().expect("to_int64"), 42);
    assert!((integral.to_f64() - 42.0).abs() < f64::EPSILON);
}

mod properties {
    use super::*;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    #[derive(Debug, Clone)]
    struct DecimalText(String);

    impl Arbitrary for DecimalText {
        fn arbitrary(g: &mut Gen) -> Self {
            let negative = bool::arbitrary(g);
            let digits = (usize::arbitrary(g) % 40) + 1;
            let mut text = String::new();
            if negative {
                text.push('-');
            }
            for i in 0..digits {
                let d = u8::arbitrary(g) % 10;
                if i == 0 && d == 0 && digits > 1 {
                    text.push('1');
                } else {
                    text.push(char::from(b'0' + d));
                }
            }
            let exp = i16::arbitrary(g) % 50;
            text.push('d');
            text.push_str(&exp.to_string());
            Self(text)
        }
    }

    #[quickcheck]
    fn from_string_to_string_round_trips(input: DecimalText) -> bool {
        let mut ctx = DecContext::new(100);
        let value = IonDecimal::from_string(&input.0, &mut ctx).expect("generated lexeme parses");
        let rendered = value.to_decimal_string();
        let reparsed = IonDecimal::from_string(&rendered, &mut ctx).expect("rendered form parses");
        value.eq_value(&reparsed)
    }

    #[quickcheck]
    fn addition_never_narrows(a: i32, b: i32) -> bool {
        let mut ctx = DecContext::new(100);
        let lhs = IonDecimal::from_int32(a);
        let rhs = IonDecimal::from_int32(b);
        // Two quads whose sum fits a quad must stay a quad.
        lhs.add(&rhs, &mut ctx).expect("add").is_quad()
    }
}
