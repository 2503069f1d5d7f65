pub mod inbound;
pub mod reply;
mod xml;
