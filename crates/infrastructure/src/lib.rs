//! dclocate Infrastructure Layer
pub mod cldap;
pub mod dns;
pub mod observer;
pub mod system;
pub mod wire;
