//! Integration tests for the in-memory facts host: conversion
//! classification, operator lookup over the base chain, and overload
//! resolution outcomes.

use opal_facts::{
    Conversion, FactsHost, OperatorKind, OverloadResolution, SemanticFacts, TypeId,
};

#[test]
fn identity_and_numeric_widening() {
    let host = FactsHost::new();
    assert!(host.classify_conversion(TypeId::INT32, TypeId::INT32).is_identity());
    let widen = host.classify_conversion(TypeId::INT8, TypeId::INT32);
    assert!(widen.is_implicit());
    assert_eq!(widen.describe(), "Numeric");
}

#[test]
fn numeric_narrowing_needs_a_cast() {
    let host = FactsHost::new();
    let narrow = host.classify_conversion(TypeId::INT32, TypeId::INT8);
    assert!(narrow.exists);
    assert!(!narrow.is_implicit());
}

#[test]
fn reference_conversions_walk_the_base_chain() {
    let mut host = FactsHost::new();
    let base = host.declare_class("Base", None);
    let mid = host.declare_class("Mid", Some(base));
    let derived = host.declare_class("Derived", Some(mid));

    assert!(host.classify_conversion(derived, base).is_implicit());
    let down = host.classify_conversion(base, derived);
    assert!(down.exists);
    assert!(!down.is_implicit());
    assert!(host.classify_conversion(derived, TypeId::OBJECT).is_implicit());
}

#[test]
fn null_literal_converts_to_references_and_nullables() {
    let mut host = FactsHost::new();
    let c = host.declare_class("C", None);
    let nullable_int = host.nullable_of(TypeId::INT32);
    assert!(host.classify_conversion(TypeId::NULL, c).is_implicit());
    assert!(host.classify_conversion(TypeId::NULL, nullable_int).is_implicit());
    assert_eq!(
        host.classify_conversion(TypeId::NULL, TypeId::INT32),
        Conversion::none()
    );
}

#[test]
fn nullable_wrapping_is_implicit_and_unwrapping_is_not() {
    let mut host = FactsHost::new();
    let nullable_int = host.nullable_of(TypeId::INT32);
    let nullable_long = host.nullable_of(TypeId::INT64);

    assert!(host.classify_conversion(TypeId::INT32, nullable_int).is_implicit());
    assert!(host.classify_conversion(TypeId::INT32, nullable_long).is_implicit());
    assert!(host.classify_conversion(nullable_int, nullable_long).is_implicit());
    let unwrap = host.classify_conversion(nullable_int, TypeId::INT32);
    assert!(unwrap.exists);
    assert!(!unwrap.is_implicit());
}

#[test]
fn distinct_delegate_types_never_convert() {
    let mut host = FactsHost::new();
    let d1 = host.declare_delegate("D1", &[TypeId::INT32], TypeId::VOID);
    let d2 = host.declare_delegate("D2", &[TypeId::INT32], TypeId::VOID);
    assert_eq!(host.classify_conversion(d1, d2), Conversion::none());
    assert_eq!(host.classify_conversion(d2, d1), Conversion::none());
    // Identity still holds for the same delegate type.
    assert!(host.classify_conversion(d1, d1).is_identity());
}

#[test]
fn user_defined_conversion_is_classified() {
    let mut host = FactsHost::new();
    let money = host.declare_struct("Money");
    host.declare_conversion_operator(money, TypeId::FLOAT64, true);
    host.declare_conversion_operator(TypeId::INT32, money, false);

    let up = host.classify_conversion(money, TypeId::FLOAT64);
    assert!(up.is_implicit());
    assert_eq!(up.describe(), "UserDefined");
    assert!(up.method.is_some());

    let down = host.classify_conversion(TypeId::INT32, money);
    assert!(down.exists);
    assert!(!down.is_implicit());
}

#[test]
fn operator_lookup_prefers_most_derived() {
    let mut host = FactsHost::new();
    let base = host.declare_class("Base", None);
    let derived = host.declare_class("Derived", Some(base));
    let on_base = host.declare_unary_operator(base, OperatorKind::Minus, base, base);
    let on_derived = host.declare_unary_operator(derived, OperatorKind::Minus, derived, derived);

    assert_eq!(host.lookup_operator(derived, OperatorKind::Minus), Some(on_derived));
    assert_eq!(host.lookup_operator(base, OperatorKind::Minus), Some(on_base));
    // Inherited lookup: the plus operator only exists on the base.
    let plus = host.declare_unary_operator(base, OperatorKind::Plus, base, base);
    assert_eq!(host.lookup_operator(derived, OperatorKind::Plus), Some(plus));
    assert_eq!(host.lookup_operator(derived, OperatorKind::BitwiseNot), None);
}

#[test]
fn overload_resolution_best_ambiguous_and_no_match() {
    let mut host = FactsHost::new();
    let c = host.declare_class("C", None);
    let m_int = host.declare_method(c, "M", &[TypeId::INT32], TypeId::VOID, false);
    let m_long = host.declare_method(c, "M", &[TypeId::INT64], TypeId::VOID, false);
    let m_two = host.declare_method(c, "M", &[TypeId::INT32, TypeId::INT32], TypeId::VOID, false);

    let candidates = host.resolve_name(c, "M");
    assert_eq!(candidates, vec![m_int, m_long, m_two]);

    // Exact match wins over a widening match.
    assert_eq!(
        host.resolve_overload(&[m_int, m_long], &[TypeId::INT32]),
        OverloadResolution::Best(m_int)
    );
    // sbyte widens to both candidates equally well.
    assert_eq!(
        host.resolve_overload(&[m_int, m_long], &[TypeId::INT8]),
        OverloadResolution::Ambiguous(m_int, m_long)
    );
    // No candidate takes a string.
    assert_eq!(
        host.resolve_overload(&[m_int, m_long, m_two], &[TypeId::STRING]),
        OverloadResolution::NoMatch
    );
    // Arity filters candidates before conversions are consulted.
    assert_eq!(
        host.resolve_overload(&[m_two], &[TypeId::INT32, TypeId::INT32]),
        OverloadResolution::Best(m_two)
    );
}

#[test]
fn name_resolution_collects_base_members_after_derived() {
    let mut host = FactsHost::new();
    let base = host.declare_class("Base", None);
    let derived = host.declare_class("Derived", Some(base));
    let on_base = host.declare_method(base, "M", &[TypeId::INT32], TypeId::VOID, false);
    let on_derived = host.declare_method(derived, "M", &[TypeId::STRING], TypeId::VOID, false);

    assert_eq!(host.resolve_name(derived, "M"), vec![on_derived, on_base]);
    assert!(host.resolve_name(derived, "Missing").is_empty());
}
