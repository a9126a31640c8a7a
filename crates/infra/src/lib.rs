//! Infrastructure layer: account storage, session storage and the account
//! services built on top of them.

pub mod accounts;
pub mod repository;
pub mod session_store;
