//! Connection pool management for the bastion API

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct ConnectionPoolConfig {
    pub max_idle_connections: usize,
    pub idle_timeout: Duration,
    pub connection_timeout: Duration,
    pub request_timeout: Duration,
    pub tcp_keepalive: Option<Duration>,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: 10,
            idle_timeout: Duration::from_secs(90),
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            tcp_keepalive: Some(Duration::from_secs(30)),
        }
    }
}

/// Request counters kept by the client. A 404 counts as `not_found`, not as
/// a failure: it is how the appliance reports an absent item.
#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub not_found: u64,
    pub last_status: Option<u16>,
}

impl ConnectionStats {
    /// `status` is `None` when no response came back
    fn record(&mut self, status: Option<u16>) {
        self.total_requests += 1;
        match status {
            Some(404) => self.not_found += 1,
            Some(code) if code < 400 => {}
            _ => self.failed_requests += 1,
        }
        self.last_status = status;
    }
}

pub struct ConnectionPoolManager {
    stats: Arc<RwLock<ConnectionStats>>,
    config: ConnectionPoolConfig,
}

impl ConnectionPoolManager {
    pub fn new(config: ConnectionPoolConfig) -> Self {
        Self {
            stats: Arc::new(RwLock::new(ConnectionStats::default())),
            config,
        }
    }

    /// Returns the counters as they stand after this response
    pub async fn record_response(&self, status: u16) -> ConnectionStats {
        let mut stats = self.stats.write().await;
        stats.record(Some(status));
        stats.clone()
    }

    pub async fn record_failure(&self) -> ConnectionStats {
        let mut stats = self.stats.write().await;
        stats.record(None);
        stats.clone()
    }

    /// `insecure` disables certificate verification; appliances commonly
    /// ship with a self-signed certificate
    pub fn build_client(&self, insecure: bool) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .timeout(self.config.request_timeout)
            .connect_timeout(self.config.connection_timeout)
            .pool_idle_timeout(self.config.idle_timeout)
            .pool_max_idle_per_host(self.config.max_idle_connections);

        if let Some(keepalive) = self.config.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_request_outcomes() {
        let manager = ConnectionPoolManager::new(ConnectionPoolConfig::default());
        manager.record_response(204).await;
        manager.record_response(404).await;
        let stats = manager.record_response(500).await;
        assert_eq!(stats.last_status, Some(500));

        let stats = manager.record_failure().await;
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.not_found, 1);
        assert_eq!(stats.failed_requests, 2);
        assert_eq!(stats.last_status, None);
    }

    #[test]
    fn builds_client_with_custom_timeouts() {
        let manager = ConnectionPoolManager::new(ConnectionPoolConfig {
            request_timeout: Duration::from_secs(5),
            tcp_keepalive: None,
            ..Default::default()
        });
        assert!(manager.build_client(true).is_ok());
        assert!(manager.build_client(false).is_ok());
    }
}
