#![allow(dead_code)]
use super::builders::{cldap_reply, request_message_id};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

/// Answers every CLDAP ping with a fixed NetLogon payload, echoing the
/// request's message id.
pub struct MockCldapServer {
    addr: SocketAddr,
    pings: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockCldapServer {
    pub async fn start(payload: Vec<u8>) -> Result<Self, std::io::Error> {
        Self::start_on("127.0.0.1:0".parse().unwrap(), payload).await
    }

    pub async fn start_on(bind: SocketAddr, payload: Vec<u8>) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind(bind).await?;
        let addr = socket.local_addr()?;
        let pings = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pings);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 1024];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { continue };
                        counter.fetch_add(1, Ordering::SeqCst);
                        let Some(id) = request_message_id(&buf[..len]) else { continue };
                        let reply = cldap_reply(id, &payload, true);
                        let _ = socket.send_to(&reply, peer).await;
                    }
                }
            }
        });

        Ok(Self {
            addr,
            pings,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }
}

impl Drop for MockCldapServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
