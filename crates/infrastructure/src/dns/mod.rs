pub mod answer_parser;
pub mod message_builder;
pub mod srv_resolver;
pub mod transport;

pub use answer_parser::{DnsHeader, ParseOutcome, ResourceRecord, SrvRecord};
pub use message_builder::MessageBuilder;
pub use srv_resolver::DnsSrvResolver;
