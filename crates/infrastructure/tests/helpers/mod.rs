pub mod builders;
pub mod cldap_server_mock;
pub mod dns_server_mock;

#[allow(unused_imports)]
pub use builders::*;
#[allow(unused_imports)]
pub use cldap_server_mock::*;
#[allow(unused_imports)]
pub use dns_server_mock::*;
