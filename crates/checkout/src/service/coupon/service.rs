use crate::{
    abstract_trait::coupon::{
        repository::{DynCouponCommandRepository, DynCouponQueryRepository},
        service::CouponServiceTrait,
    },
    domain::{
        requests::coupon::{CreateCouponRecordRequest, CreateCouponRequest, ValidateCouponRequest},
        response::coupon::{CouponResponse, CouponValidationResponse},
    },
    model::coupon::Coupon as CouponModel,
};
use super::evaluator::evaluate;
use async_trait::async_trait;
use chrono::Utc;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use shared::{
    domain::responses::ApiResponse,
    errors::{CouponError, ServiceError},
    utils::{Method, Metrics, OperationTracer},
};
use tracing::info;
use validator::Validate;

#[derive(Clone)]
pub struct CouponService {
    query: DynCouponQueryRepository,
    command: DynCouponCommandRepository,
    tracer: OperationTracer,
}

pub struct CouponServiceDeps {
    pub query: DynCouponQueryRepository,
    pub command: DynCouponCommandRepository,
}

impl CouponService {
    pub fn new(deps: CouponServiceDeps, registry: &mut Registry) -> Self {
        let CouponServiceDeps { query, command } = deps;

        let metrics = Metrics::new();
        metrics.register("coupon_service", registry);

        Self {
            query,
            command,
            tracer: OperationTracer::new("coupon-service", metrics),
        }
    }

    async fn find_coupon(&self, code: &str) -> Result<CouponModel, ServiceError> {
        self.query
            .find_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::Coupon(CouponError::NotFound(code.to_string())))
    }

    async fn validate_inner(
        &self,
        req: &ValidateCouponRequest,
    ) -> Result<CouponValidationResponse, ServiceError> {
        req.validate()?;

        let code = CouponModel::normalize_code(&req.code);
        let coupon = self.find_coupon(&code).await?;

        let applied = evaluate(&coupon, req.subtotal, Utc::now().naive_utc())?;

        Ok(CouponValidationResponse {
            coupon: CouponResponse::from(coupon),
            subtotal: req.subtotal,
            discount_amount: applied.discount_amount,
            total: req.subtotal - applied.discount_amount,
        })
    }

    async fn create_inner(&self, req: &CreateCouponRequest) -> Result<CouponResponse, ServiceError> {
        req.validate()?;

        let record = CreateCouponRecordRequest {
            code: CouponModel::normalize_code(&req.code),
            discount_type: req.discount_type,
            value: req.value,
            min_total: req.min_total,
            start_date: req.start_date,
            end_date: req.end_date,
        };

        let coupon = self.command.create_coupon(&record).await?;

        Ok(CouponResponse::from(coupon))
    }

    async fn deactivate_inner(&self, code: &str) -> Result<CouponResponse, ServiceError> {
        let code = CouponModel::normalize_code(code);

        let coupon = self
            .command
            .set_active(&code, false)
            .await?
            .ok_or_else(|| ServiceError::Coupon(CouponError::NotFound(code.clone())))?;

        Ok(CouponResponse::from(coupon))
    }
}

#[async_trait]
impl CouponServiceTrait for CouponService {
    async fn validate_for_display(
        &self,
        req: &ValidateCouponRequest,
    ) -> Result<ApiResponse<CouponValidationResponse>, ServiceError> {
        info!("🎟️ Validating coupon {} against subtotal {}", req.code, req.subtotal);

        let method = Method::Post;
        let tracing_ctx = self.tracer.start(
            "validate_coupon",
            vec![
                KeyValue::new("component", "coupon"),
                KeyValue::new("operation", "validate"),
                KeyValue::new("coupon.code", req.code.clone()),
            ],
        );

        match self.validate_inner(req).await {
            Ok(validation) => {
                self.tracer
                    .success(&tracing_ctx, method, "Coupon validated successfully");
                Ok(ApiResponse::success("Coupon applied", validation))
            }
            Err(e) => {
                self.tracer.error(&tracing_ctx, method, &e.to_string());
                Err(e)
            }
        }
    }

    async fn create_coupon(
        &self,
        req: &CreateCouponRequest,
    ) -> Result<ApiResponse<CouponResponse>, ServiceError> {
        info!("🏗️ Creating coupon {}", req.code);

        let method = Method::Post;
        let tracing_ctx = self.tracer.start(
            "create_coupon",
            vec![
                KeyValue::new("component", "coupon"),
                KeyValue::new("operation", "create"),
                KeyValue::new("coupon.code", req.code.clone()),
            ],
        );

        match self.create_inner(req).await {
            Ok(coupon) => {
                self.tracer
                    .success(&tracing_ctx, method, "Coupon created successfully");
                Ok(ApiResponse::success("Coupon created successfully", coupon))
            }
            Err(e) => {
                self.tracer.error(&tracing_ctx, method, &e.to_string());
                Err(e)
            }
        }
    }

    async fn deactivate_coupon(
        &self,
        code: &str,
    ) -> Result<ApiResponse<CouponResponse>, ServiceError> {
        info!("🛑 Deactivating coupon {}", code);

        let method = Method::Put;
        let tracing_ctx = self.tracer.start(
            "deactivate_coupon",
            vec![
                KeyValue::new("component", "coupon"),
                KeyValue::new("operation", "deactivate"),
                KeyValue::new("coupon.code", code.to_string()),
            ],
        );

        match self.deactivate_inner(code).await {
            Ok(coupon) => {
                self.tracer
                    .success(&tracing_ctx, method, "Coupon deactivated successfully");
                Ok(ApiResponse::success("Coupon deactivated", coupon))
            }
            Err(e) => {
                self.tracer.error(&tracing_ctx, method, &e.to_string());
                Err(e)
            }
        }
    }
}
