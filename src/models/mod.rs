//! Record types exchanged with the record store, plus request DTOs.

pub mod image;
pub mod pagination;
pub mod user;
