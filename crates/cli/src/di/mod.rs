use dclocate_application::ports::LocatorObserver;
use dclocate_application::use_cases::{LocateDcUseCase, LocateOptions};
use dclocate_domain::Config;
use dclocate_infrastructure::cldap::{CldapNetlogonCodec, UdpPingTransport};
use dclocate_infrastructure::dns::DnsSrvResolver;
use dclocate_infrastructure::observer::TracingObserver;
use std::sync::Arc;
use tracing::debug;

pub async fn build_locator(config: &Config, dump_candidates: bool) -> anyhow::Result<LocateDcUseCase> {
    let resolver = DnsSrvResolver::from_config(&config.resolver).await?;
    debug!(nameservers = ?resolver.nameservers(), "Resolver wired");

    let locator = LocateDcUseCase::new(
        Arc::new(resolver),
        Arc::new(UdpPingTransport::new()),
        Arc::new(CldapNetlogonCodec::new()),
        LocateOptions::from_config(&config.locator),
    );

    Ok(if dump_candidates {
        let observer: Arc<dyn LocatorObserver> = Arc::new(TracingObserver);
        locator.with_observer(observer)
    } else {
        locator
    })
}
