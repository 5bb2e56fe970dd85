//! Async checkout tests with a mocked payment gateway

mod common;

use std::sync::Arc;

use app::{
    CheckoutService, MockNotifier, MockOrderRepository, MockPaymentGateway, PaymentError,
    PaymentReceipt, RepositoryError, ServiceError,
};
use attest::assert_lenient_eq;
use attest::compare::ReflectValue;
use attest::mock::matchers::{any, eq};
use attest::mock::TestContext;

use common::{confirmed_order, pending_order};

struct Mocks {
    context: TestContext,
    repository: MockOrderRepository,
    gateway: MockPaymentGateway,
    notifier: MockNotifier,
}

fn mocks() -> Mocks {
    let context = TestContext::new();
    let repository = MockOrderRepository::new(&context);
    let gateway = MockPaymentGateway::new(&context);
    let notifier = MockNotifier::new(&context);
    Mocks {
        context,
        repository,
        gateway,
        notifier,
    }
}

fn checkout_service(mocks: &Mocks) -> CheckoutService {
    CheckoutService::new(
        Arc::new(mocks.repository.clone()),
        Arc::new(mocks.gateway.clone()),
        Arc::new(mocks.notifier.clone()),
    )
}

fn receipt(amount_cents: i64) -> PaymentReceipt {
    PaymentReceipt {
        reference: "pay-001".to_string(),
        amount_cents,
    }
}

#[tokio::test]
async fn checkout_charges_the_order_total() {
    let mocks = mocks();
    mocks
        .repository
        .when("by_id")
        .returns(Some(confirmed_order(5)));
    mocks
        .gateway
        .when("charge")
        .with([eq(5u64), eq(4400i64)])
        .returns(Ok::<PaymentReceipt, PaymentError>(receipt(4400)));
    mocks
        .repository
        .when("save")
        .returns(Ok::<(), RepositoryError>(()));

    let paid = checkout_service(&mocks).checkout(5).await.unwrap();

    assert_lenient_eq(&receipt(4400), &paid);
    mocks.repository.verify("by_id").invoked_in_sequence();
    mocks
        .gateway
        .verify("charge")
        .with([eq(5u64), any()])
        .invoked_in_sequence();
    mocks.repository.verify("save").invoked_in_sequence();
    mocks.notifier.verify("order_confirmed").invoked_in_sequence();
    mocks.context.assert_no_more_invocations();
}

#[tokio::test]
async fn declined_payments_leave_the_order_untouched() {
    let mocks = mocks();
    mocks
        .repository
        .when("by_id")
        .returns(Some(confirmed_order(5)));
    mocks.gateway.when("charge").raises(PaymentError::Declined);

    let err = checkout_service(&mocks).checkout(5).await.unwrap_err();

    assert_eq!(err, ServiceError::Payment(PaymentError::Declined));
    mocks.repository.verify("save").not_invoked();
    mocks.notifier.verify("order_confirmed").not_invoked();
}

#[tokio::test]
async fn unconfirmed_orders_are_not_charged() {
    let mocks = mocks();
    mocks
        .repository
        .when("by_id")
        .returns(Some(pending_order(5)));

    let err = checkout_service(&mocks).checkout(5).await.unwrap_err();

    assert_eq!(err, ServiceError::InvalidState { id: 5 });
    mocks.gateway.verify("charge").not_invoked();
}

#[tokio::test]
async fn performs_builds_the_receipt_from_the_recorded_arguments() {
    let mocks = mocks();
    mocks
        .repository
        .when("by_id")
        .returns(Some(confirmed_order(8)));
    mocks
        .repository
        .when("save")
        .returns(Ok::<(), RepositoryError>(()));
    mocks.gateway.when("charge").performs(|invocation| {
        let amount = match invocation.argument(1) {
            Some(ReflectValue::Int(amount)) => *amount,
            _ => 0,
        };
        Ok::<PaymentReceipt, PaymentError>(PaymentReceipt {
            reference: format!("pay-{}", amount),
            amount_cents: amount,
        })
    });

    let paid = checkout_service(&mocks).checkout(8).await.unwrap();

    assert_eq!(paid.reference, "pay-4400");
    assert_eq!(paid.amount_cents, 4400);
}

#[tokio::test]
async fn one_time_gateway_failures_can_precede_success() {
    let mocks = mocks();
    mocks
        .repository
        .when("by_id")
        .returns(Some(confirmed_order(2)));
    mocks
        .repository
        .when("save")
        .returns(Ok::<(), RepositoryError>(()));
    mocks
        .gateway
        .when("charge")
        .once()
        .raises(PaymentError::Timeout);
    mocks
        .gateway
        .when("charge")
        .returns(Ok::<PaymentReceipt, PaymentError>(receipt(4400)));

    let service = checkout_service(&mocks);
    assert_eq!(
        service.checkout(2).await.unwrap_err(),
        ServiceError::Payment(PaymentError::Timeout)
    );
    assert!(service.checkout(2).await.is_ok());
}
