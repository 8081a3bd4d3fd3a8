mod locator_observer;
mod netlogon_codec;
mod ping_transport;
mod srv_resolver;

pub use locator_observer::{LocatorObserver, NoopObserver};
pub use netlogon_codec::{NetlogonCodec, NetlogonRequest};
pub use ping_transport::{PingSocket, PingTransport};
pub use srv_resolver::SrvResolver;
