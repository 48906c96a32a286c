mod common;

use checkout::{
    domain::{
        event::{ORDER_CREATED_TOPIC, STOCK_CHANGED_TOPIC},
        requests::stock::StockAdjustmentRequest,
    },
    model::{
        cart::CartStatus,
        order::{OrderStatus, PaymentStatus},
        stock_movement::MovementType,
    },
};
use common::{FailPoint, TestApp, add_to_cart, checkout_request, percent_coupon};
use shared::errors::{RepositoryError, ServiceError};
use std::time::Duration;

#[tokio::test]
async fn checkout_turns_the_cart_into_a_discounted_order() {
    let app = TestApp::new();
    let kettle = app.store.seed_product("Kettle", 10_000, 5);
    app.store.seed_coupon(percent_coupon("SAVE10", 10, 5_000));

    add_to_cart(&app, 1, kettle, 2).await;

    let detail = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(1, Some(" save10 ")))
        .await
        .unwrap()
        .data;

    assert_eq!(detail.order.subtotal, 20_000);
    assert_eq!(detail.order.discount_amount, 2_000);
    assert_eq!(detail.order.total, 18_000);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.payment_status, PaymentStatus::Unpaid);
    assert!(detail.order.coupon_id.is_some());
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].unit_price, 10_000);
    assert_eq!(detail.items[0].product_name.as_deref(), Some("Kettle"));

    assert_eq!(app.store.product(kettle).stock, 3);
    assert!(app.store.active_cart(1).is_none());

    let movements = app.store.movements_of(kettle);
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, MovementType::Out);
    assert_eq!(movements[0].qty, 2);
    assert_eq!(movements[0].reason, format!("order #{}", detail.order.id));

    // the coupon stays usable for everyone else
    assert!(app.store.coupon("SAVE10").unwrap().active);
    let teapot = app.store.seed_product("Teapot", 8_000, 1);
    add_to_cart(&app, 2, teapot, 1).await;
    let second = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(2, Some("SAVE10")))
        .await
        .unwrap()
        .data;
    assert_eq!(second.order.discount_amount, 800);
}

#[tokio::test]
async fn checkout_publishes_order_and_stock_events_after_commit() {
    let app = TestApp::new();
    let mug = app.store.seed_product("Mug", 4_500, 10);
    let spoon = app.store.seed_product("Spoon", 1_000, 10);

    add_to_cart(&app, 3, mug, 2).await;
    add_to_cart(&app, 3, spoon, 4).await;

    let detail = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(3, None))
        .await
        .unwrap()
        .data;

    let orders = app.kafka.messages(ORDER_CREATED_TOPIC);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].0, detail.order.id.to_string());
    assert_eq!(orders[0].1["type"], "Created");
    assert_eq!(orders[0].1["total"], 13_000);

    let stock = app.kafka.messages(STOCK_CHANGED_TOPIC);
    assert_eq!(stock.len(), 2);
    assert!(stock.iter().any(|(key, event)| key == &mug.to_string() && event["new_stock"] == 8));
    assert!(stock.iter().any(|(key, event)| key == &spoon.to_string() && event["new_stock"] == 6));
}

#[tokio::test]
async fn unusable_coupons_are_ignored_at_checkout() {
    let app = TestApp::new();
    let lamp = app.store.seed_product("Lamp", 3_000, 5);
    app.store.seed_coupon(percent_coupon("BIGSPEND", 20, 100_000));

    add_to_cart(&app, 4, lamp, 1).await;
    let detail = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(4, Some("BIGSPEND")))
        .await
        .unwrap()
        .data;
    assert_eq!(detail.order.discount_amount, 0);
    assert_eq!(detail.order.total, 3_000);
    assert_eq!(detail.order.coupon_id, None);

    add_to_cart(&app, 4, lamp, 1).await;
    let detail = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(4, Some("NO-SUCH-CODE")))
        .await
        .unwrap()
        .data;
    assert_eq!(detail.order.total, 3_000);
    assert_eq!(detail.order.coupon_id, None);
}

#[tokio::test]
async fn missing_or_empty_cart_is_rejected() {
    let app = TestApp::new();

    let err = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(5, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NoActiveCart));

    app.deps.cart_service.get_cart(5).await.unwrap();
    let err = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(5, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::EmptyCart));
    assert!(app.store.active_cart(5).is_some());
}

#[tokio::test]
async fn blank_shipping_address_fails_validation() {
    let app = TestApp::new();
    let chair = app.store.seed_product("Chair", 50_000, 2);
    add_to_cart(&app, 6, chair, 1).await;

    let mut req = checkout_request(6, None);
    req.shipping_address = String::new();

    let err = app
        .deps
        .checkout_service
        .create_order_from_cart(&req)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(app.store.product(chair).stock, 2);
}

#[tokio::test]
async fn shortage_names_the_product_and_changes_nothing() {
    let app = TestApp::new();
    let a = app.store.seed_product("A", 2_000, 5);
    let b = app.store.seed_product("B", 3_000, 1);

    add_to_cart(&app, 7, a, 2).await;
    add_to_cart(&app, 7, b, 1).await;

    app.deps
        .stock_service
        .adjust(&StockAdjustmentRequest {
            product_id: b,
            qty: 1,
            movement_type: MovementType::Out,
            reason: Some("damaged".into()),
        })
        .await
        .unwrap();

    let err = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(7, None))
        .await
        .unwrap_err();

    match err {
        ServiceError::InsufficientStock {
            product_id,
            product_name,
            requested,
            available,
        } => {
            assert_eq!(product_id, b);
            assert_eq!(product_name, "B");
            assert_eq!(requested, 1);
            assert_eq!(available, 0);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(app.store.product(a).stock, 5);
    assert!(app.store.orders().is_empty());
    assert!(app.store.active_cart(7).is_some());
}

#[tokio::test]
async fn inactive_product_blocks_checkout() {
    let app = TestApp::new();
    let desk = app.store.seed_product("Desk", 90_000, 3);
    add_to_cart(&app, 8, desk, 1).await;
    app.store.set_product_active(desk, false);

    let err = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(8, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    assert_eq!(app.store.product(desk).stock, 3);
}

#[tokio::test]
async fn checkout_charges_the_current_price() {
    let app = TestApp::new();
    let pen = app.store.seed_product("Pen", 1_500, 10);
    add_to_cart(&app, 9, pen, 2).await;
    app.store.set_product_price(pen, 1_800);

    let detail = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(9, None))
        .await
        .unwrap()
        .data;

    assert_eq!(detail.order.subtotal, 3_600);
    assert_eq!(detail.items[0].unit_price, 1_800);
}

fn assert_rolled_back(app: &TestApp, user_id: i32, product_id: i32, stock: i32) {
    assert!(app.store.orders().is_empty());
    assert!(app.store.order_items().is_empty());
    assert!(app.store.movements_of(product_id).is_empty());
    assert_eq!(app.store.product(product_id).stock, stock);
    assert_eq!(
        app.store.active_cart(user_id).map(|cart| cart.status),
        Some(CartStatus::Active)
    );
    assert!(app.kafka.messages(ORDER_CREATED_TOPIC).is_empty());
}

#[tokio::test]
async fn failure_midway_leaves_no_partial_order() {
    for point in [
        FailPoint::InsertOrderItem,
        FailPoint::MarkCartCheckedOut,
        FailPoint::Commit,
    ] {
        let app = TestApp::new();
        let book = app.store.seed_product("Book", 12_000, 4);
        add_to_cart(&app, 10, book, 3).await;

        app.store.fail_at(point);
        let err = app
            .deps
            .checkout_service
            .create_order_from_cart(&checkout_request(10, None))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ServiceError::Repo(RepositoryError::Custom(_))),
            "{point:?}: {err:?}"
        );

        assert_rolled_back(&app, 10, book, 4);

        // the untouched cart can be retried
        app.deps
            .checkout_service
            .create_order_from_cart(&checkout_request(10, None))
            .await
            .unwrap();
        assert_eq!(app.store.product(book).stock, 1);
    }
}

#[tokio::test]
async fn checkout_times_out_while_stock_is_locked() {
    let app = TestApp::with_checkout_timeout(Duration::from_millis(100));
    let clock = app.store.seed_product("Clock", 25_000, 2);
    add_to_cart(&app, 11, clock, 1).await;

    let guard = app.store.hold_product_lock(clock).await;
    let err = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(11, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Timeout(_)));
    assert_eq!(err.kind(), "timeout");

    assert_rolled_back(&app, 11, clock, 2);

    drop(guard);
    app.deps
        .checkout_service
        .create_order_from_cart(&checkout_request(11, None))
        .await
        .unwrap();
    assert_eq!(app.store.product(clock).stock, 1);
}

#[tokio::test]
async fn slow_commit_still_reports_the_placed_order() {
    let app = TestApp::with_slow_commit(Duration::from_millis(100), Duration::from_millis(300));
    let kettle = app.store.seed_product("Kettle", 30_000, 3);
    add_to_cart(&app, 14, kettle, 1).await;

    let detail = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(14, None))
        .await
        .unwrap()
        .data;

    assert_eq!(app.store.orders().len(), 1);
    assert_eq!(app.store.orders()[0].order_id, detail.order.id);
    assert_eq!(app.store.product(kettle).stock, 2);

    let orders = app.kafka.messages(ORDER_CREATED_TOPIC);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].0, detail.order.id.to_string());
    let stock = app.kafka.messages(STOCK_CHANGED_TOPIC);
    assert_eq!(stock.len(), 1);
    assert_eq!(stock[0].1["new_stock"], 2);
}

#[tokio::test]
async fn broker_outage_does_not_fail_a_committed_checkout() {
    let app = TestApp::new();
    let rug = app.store.seed_product("Rug", 70_000, 1);
    add_to_cart(&app, 12, rug, 1).await;

    app.kafka.set_failing(true);
    let detail = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(12, None))
        .await
        .unwrap()
        .data;

    assert_eq!(app.store.orders().len(), 1);
    assert_eq!(app.store.orders()[0].order_id, detail.order.id);
    assert_eq!(app.store.product(rug).stock, 0);
}

#[tokio::test]
async fn a_closed_cart_is_never_reopened() {
    let app = TestApp::new();
    let vase = app.store.seed_product("Vase", 6_000, 5);
    add_to_cart(&app, 13, vase, 1).await;

    let first = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(13, None))
        .await
        .unwrap()
        .data;
    let closed = app.store.carts_of(13)[0].clone();
    assert_eq!(closed.status, CartStatus::CheckedOut);

    let err = app
        .deps
        .checkout_service
        .create_order_from_cart(&checkout_request(13, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NoActiveCart));

    // the next cart access starts a fresh cart
    let cart = app.deps.cart_service.get_cart(13).await.unwrap().data;
    assert_ne!(cart.id, closed.cart_id);
    assert!(cart.items.is_empty());
    assert_eq!(app.store.cart(closed.cart_id).status, CartStatus::CheckedOut);
    assert_eq!(app.store.orders().len(), 1);
    assert_eq!(app.store.orders()[0].order_id, first.order.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_never_oversell() {
    let app = TestApp::new();
    let ticket = app.store.seed_product("Concert Ticket", 150_000, 5);

    for user_id in 100..110 {
        add_to_cart(&app, user_id, ticket, 1).await;
    }

    let handles: Vec<_> = (100..110)
        .map(|user_id| {
            let service = app.deps.checkout_service.clone();
            tokio::spawn(async move {
                service
                    .create_order_from_cart(&checkout_request(user_id, None))
                    .await
            })
        })
        .collect();

    let mut placed = 0;
    let mut short = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(ServiceError::InsufficientStock { available, .. }) => {
                assert_eq!(available, 0);
                short += 1;
            }
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    assert_eq!(placed, 5);
    assert_eq!(short, 5);
    assert_eq!(app.store.product(ticket).stock, 0);
    assert_eq!(app.store.movements_of(ticket).len(), 5);
    assert_eq!(app.store.orders().len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn last_unit_goes_to_exactly_one_buyer() {
    let app = TestApp::new();
    let painting = app.store.seed_product("Painting", 900_000, 1);
    add_to_cart(&app, 200, painting, 1).await;
    add_to_cart(&app, 201, painting, 1).await;

    let first = app.deps.checkout_service.clone();
    let second = app.deps.checkout_service.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { first.create_order_from_cart(&checkout_request(200, None)).await }),
        tokio::spawn(async move { second.create_order_from_cart(&checkout_request(201, None)).await }),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|r| matches!(r, Err(ServiceError::InsufficientStock { .. }))));
    assert_eq!(app.store.product(painting).stock, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn double_submit_places_one_order() {
    let app = TestApp::new();
    let bike = app.store.seed_product("Bike", 2_500_000, 3);
    add_to_cart(&app, 300, bike, 1).await;

    let first = app.deps.checkout_service.clone();
    let second = app.deps.checkout_service.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { first.create_order_from_cart(&checkout_request(300, None)).await }),
        tokio::spawn(async move { second.create_order_from_cart(&checkout_request(300, None)).await }),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|r| matches!(r, Err(ServiceError::NoActiveCart))));
    assert_eq!(app.store.orders().len(), 1);
    assert_eq!(app.store.product(bike).stock, 2);
}
