use crate::{
    abstract_trait::{
        cart::{
            repository::{DynCartCommandRepository, DynCartQueryRepository},
            service::DynCartService,
        },
        checkout::DynCheckoutService,
        coupon::{
            repository::{DynCouponCommandRepository, DynCouponQueryRepository},
            service::DynCouponService,
        },
        order::{DynOrderQueryRepository, DynOrderQueryService},
        product::DynProductQueryRepository,
        stock::{DynStockMovementQueryRepository, DynStockService},
        transaction::DynUnitOfWork,
    },
    repository::{
        cart::{CartCommandRepository, CartQueryRepository},
        coupon::{CouponCommandRepository, CouponQueryRepository},
        order::OrderQueryRepository,
        product::ProductQueryRepository,
        stock::StockMovementQueryRepository,
        transaction::PgUnitOfWork,
    },
    service::{
        CartService, CartServiceDeps, CheckoutService, CheckoutServiceDeps, CouponService,
        CouponServiceDeps, EventPublisher, OrderQueryService, StockService, StockServiceDeps,
    },
};
use prometheus_client::registry::Registry;
use shared::{abstract_trait::DynKafka, config::ConnectionPool};
use std::{fmt, sync::Arc, time::Duration};

/// Storage handles the services are built from.
#[derive(Clone)]
pub struct Repositories {
    pub cart_query: DynCartQueryRepository,
    pub cart_command: DynCartCommandRepository,
    pub coupon_query: DynCouponQueryRepository,
    pub coupon_command: DynCouponCommandRepository,
    pub order_query: DynOrderQueryRepository,
    pub product_query: DynProductQueryRepository,
    pub stock_query: DynStockMovementQueryRepository,
    pub unit_of_work: DynUnitOfWork,
}

impl Repositories {
    pub fn postgres(pool: ConnectionPool, lock_timeout: Duration) -> Self {
        Self {
            cart_query: Arc::new(CartQueryRepository::new(pool.clone())),
            cart_command: Arc::new(CartCommandRepository::new(pool.clone())),
            coupon_query: Arc::new(CouponQueryRepository::new(pool.clone())),
            coupon_command: Arc::new(CouponCommandRepository::new(pool.clone())),
            order_query: Arc::new(OrderQueryRepository::new(pool.clone())),
            product_query: Arc::new(ProductQueryRepository::new(pool.clone())),
            stock_query: Arc::new(StockMovementQueryRepository::new(pool.clone())),
            unit_of_work: Arc::new(PgUnitOfWork::new(pool, lock_timeout)),
        }
    }
}

#[derive(Clone)]
pub struct DependenciesInject {
    pub cart_service: DynCartService,
    pub coupon_service: DynCouponService,
    pub checkout_service: DynCheckoutService,
    pub stock_service: DynStockService,
    pub order_query_service: DynOrderQueryService,
}

impl fmt::Debug for DependenciesInject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependenciesInject")
            .field("cart_service", &"CartService")
            .field("coupon_service", &"CouponService")
            .field("checkout_service", &"CheckoutService")
            .field("stock_service", &"StockService")
            .field("order_query_service", &"OrderQueryService")
            .finish()
    }
}

#[derive(Clone)]
pub struct DependenciesInjectDeps {
    pub repositories: Repositories,
    pub kafka: DynKafka,
    pub checkout_timeout: Duration,
}

impl DependenciesInject {
    pub fn new(deps: DependenciesInjectDeps, registry: &mut Registry) -> Self {
        let DependenciesInjectDeps {
            repositories: repos,
            kafka,
            checkout_timeout,
        } = deps;

        let publisher = EventPublisher::new(kafka);

        let cart_service = CartService::new(
            CartServiceDeps {
                query: repos.cart_query.clone(),
                command: repos.cart_command.clone(),
                product: repos.product_query.clone(),
            },
            registry,
        );

        let coupon_service = CouponService::new(
            CouponServiceDeps {
                query: repos.coupon_query.clone(),
                command: repos.coupon_command.clone(),
            },
            registry,
        );

        let checkout_service = CheckoutService::new(
            CheckoutServiceDeps {
                unit_of_work: repos.unit_of_work.clone(),
                publisher: publisher.clone(),
                timeout: checkout_timeout,
            },
            registry,
        );

        let stock_service = StockService::new(
            StockServiceDeps {
                unit_of_work: repos.unit_of_work.clone(),
                product: repos.product_query.clone(),
                movements: repos.stock_query.clone(),
                publisher,
            },
            registry,
        );

        let order_query_service =
            OrderQueryService::new(repos.order_query.clone(), repos.product_query.clone(), registry);

        Self {
            cart_service: Arc::new(cart_service),
            coupon_service: Arc::new(coupon_service),
            checkout_service: Arc::new(checkout_service),
            stock_service: Arc::new(stock_service),
            order_query_service: Arc::new(order_query_service),
        }
    }
}
