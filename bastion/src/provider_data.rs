//! Handle shared by every resource and data source of one provider instance

use crate::api::Client;
use crate::reconcile::Transport;
use std::sync::Arc;

#[derive(Clone)]
pub struct BastionProviderData {
    pub client: Arc<Client>,
}

impl BastionProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// The client as the transport reconcilers drive
    pub fn transport(&self) -> &dyn Transport {
        self.client.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ClientConfig;

    #[test]
    fn clones_share_one_client() {
        let client = Client::new(ClientConfig::new(
            "https://bastion.example.com",
            "admin",
            "token",
            "v3.3",
        ))
        .unwrap();
        let data = BastionProviderData::new(client);
        let copy = data.clone();

        assert!(Arc::ptr_eq(&data.client, &copy.client));
        assert_eq!(copy.transport().api_version(), "v3.3");
    }
}
