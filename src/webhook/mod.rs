pub mod routes;
pub mod signature;
