//! A queue of LLM clients, one per API key.
//!
//! Workers take a client from the queue, use it for one article, and the
//! client goes back to the queue when the [`Lease`] drops. With N keys at
//! most N requests are in flight and no key is used twice at once.

use crate::api::ChatClient;
use crate::config::{Credentials, LlmConfig};
use crate::error::LlmError;
use async_channel::{Receiver, Sender};
use std::ops::Deref;
use tracing::debug;

#[derive(Debug)]
pub struct CredentialPool {
    tx: Sender<ChatClient>,
    rx: Receiver<ChatClient>,
    size: usize,
}

impl CredentialPool {
    pub fn new(credentials: &Credentials, config: &LlmConfig) -> Result<Self, LlmError> {
        let clients = credentials
            .keys()
            .iter()
            .map(|key| ChatClient::new(key, config))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_clients(clients)
    }

    pub fn from_clients(clients: Vec<ChatClient>) -> Result<Self, LlmError> {
        if clients.is_empty() {
            return Err(LlmError::NoCredentials);
        }
        let size = clients.len();
        let (tx, rx) = async_channel::bounded(size);
        for client in clients {
            // Capacity equals the client count, so this cannot fail.
            let _ = tx.try_send(client);
        }
        Ok(Self { tx, rx, size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Wait for a free client.
    pub async fn checkout(&self) -> Result<Lease<'_>, LlmError> {
        let client = self.rx.recv().await.map_err(|_| LlmError::NoCredentials)?;
        debug!("Checked out LLM client");
        Ok(Lease {
            client: Some(client),
            pool: self,
        })
    }
}

/// A client on loan from a [`CredentialPool`].
#[derive(Debug)]
pub struct Lease<'a> {
    client: Option<ChatClient>,
    pool: &'a CredentialPool,
}

impl Deref for Lease<'_> {
    type Target = ChatClient;

    fn deref(&self) -> &ChatClient {
        // Only `drop` takes the client out.
        self.client.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            let _ = self.pool.tx.try_send(client);
        }
    }
}
