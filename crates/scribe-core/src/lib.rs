//! Chat core: turns a conversation plus reference documents into vendor
//! requests, reads replies back, and keeps the persisted history.

pub mod ports;
pub mod event_bus;
pub mod store;
pub mod reference;
pub mod request;
pub mod extract;
pub mod manager;
