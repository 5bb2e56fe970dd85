//! Lenient and strict reflection asserts over the order model

mod common;

use app::{Order, OrderStatus};
use attest::compare::CompareMode;
use attest::{
    assert_lenient_eq, assert_property_lenient_eq, assert_reflect_eq, lenient_eq, reflect_eq,
};
use chrono::{TimeZone, Utc};

use common::{lines, pending_order};

#[test]
fn a_deep_copy_is_strictly_equal() {
    let order = pending_order(1);
    let copy = order.clone();
    assert_reflect_eq(&order, &copy, attest::compare::STRICT);
}

#[test]
fn lenient_comparison_ignores_line_order() {
    let order = pending_order(1);
    let mut shuffled = order.clone();
    shuffled.lines.reverse();

    assert!(lenient_eq(&order, &shuffled));
    assert!(!reflect_eq(&order, &shuffled, attest::compare::STRICT));
    assert_lenient_eq(&order, &shuffled);
}

#[test]
fn lenient_comparison_skips_expected_side_defaults() {
    let expected = pending_order(1);
    let actual = Order {
        note: Some("gift wrap".to_string()),
        ..pending_order(1)
    };
    // the expected side has no note, so the actual note is tolerated
    assert_lenient_eq(&expected, &actual);
    // the reverse comparison must flag the missing note
    assert!(!lenient_eq(&actual, &expected));
}

#[test]
fn lenient_dates_only_require_a_timestamp_to_be_present() {
    let order = pending_order(1);
    let later = Order {
        placed_at: Utc.with_ymd_and_hms(2026, 6, 1, 17, 0, 0).unwrap(),
        ..pending_order(1)
    };

    assert!(!reflect_eq(&order, &later, attest::compare::STRICT));
    assert_reflect_eq(
        &order,
        &later,
        &[CompareMode::LenientOrder, CompareMode::LenientDates],
    );
}

#[test]
fn property_asserts_navigate_the_object_graph() {
    let order = pending_order(1);
    assert_property_lenient_eq("customer.name", &"Ada", &order);
    assert_property_lenient_eq("lines[1].sku", &"B-7", &order);
    assert_property_lenient_eq("lines[0].quantity", &2u32, &order);
}

#[test]
#[should_panic(expected = "assert_reflect_eq failed")]
fn strict_comparison_flags_reordered_lines() {
    let order = pending_order(1);
    let mut shuffled = order.clone();
    shuffled.lines.reverse();
    assert_reflect_eq(&order, &shuffled, attest::compare::STRICT);
}

#[test]
#[should_panic(expected = "status")]
fn the_failure_report_names_the_differing_field() {
    let order = pending_order(1);
    let confirmed = Order {
        status: OrderStatus::Confirmed,
        ..pending_order(1)
    };
    assert_lenient_eq(&order, &confirmed);
}

#[test]
fn reordered_lines_match_line_by_line_when_unordered() {
    let mut reversed = lines();
    reversed.reverse();
    assert!(!reflect_eq(&lines(), &reversed, attest::compare::STRICT));
    assert!(reflect_eq(
        &lines(),
        &reversed,
        &[CompareMode::LenientOrder]
    ));
}
