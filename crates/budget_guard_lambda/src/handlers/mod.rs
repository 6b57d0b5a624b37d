pub mod executor;
pub mod forwarder;
pub mod identity;
pub mod response;
pub mod runtime;
