mod service;

pub use self::service::{CheckoutServiceTrait, DynCheckoutService};
