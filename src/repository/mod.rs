//! Repository Layer
//!
//! Local durable persistence for the three state slices
//! (items, exchange rate, active user).

mod db;
mod local_store;


pub use db::init_db;
pub use local_store::{
    LocalStore, DEFAULT_EXCHANGE_RATE, ITEMS_KEY, RATE_KEY, USER_KEY,
};
