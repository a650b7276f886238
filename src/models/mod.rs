pub mod ai;
pub mod assessment;
pub mod auth;
pub mod message;
pub mod registro;
pub mod sensor;
pub mod summary;
