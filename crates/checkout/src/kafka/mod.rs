mod consumer;
mod event;

pub use self::consumer::StockEventConsumer;
pub use self::event::StockEventHandler;
