pub mod aws;
pub mod identity;
pub mod notify;
pub mod policy;
pub mod publish;
