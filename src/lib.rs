pub mod checks;
pub mod config;
pub mod credentials;
pub mod display;
pub mod engine;
pub mod errors;
pub mod model;
pub mod poller;
pub mod session;
pub mod stats;
pub mod store;
pub mod view;

pub use errors::{BookingError, BookingResult, StoreError, StoreResult};
