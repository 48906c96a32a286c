mod command;
mod query;

pub use self::command::{CouponCommandRepositoryTrait, DynCouponCommandRepository};
pub use self::query::{CouponQueryRepositoryTrait, DynCouponQueryRepository};
