use crate::denomination::Denomination;
use crate::model::{Amendment, Coin, Fingerprint, Transaction};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ledger returned status {0}")]
    Status(StatusCode),
}

/// Read/write operations the wallet needs from the ledger. Protocol
/// concerns (document signing, peering, key lookup) live behind this
/// seam and stay out of the wallet's scope.
#[async_trait]
pub trait LedgerClient {
    /// Current spendable inventory of one wallet.
    async fn wallet_coins(&self, owner: &Fingerprint) -> Result<Vec<Coin>, LedgerError>;

    async fn sender_transactions(
        &self,
        owner: &Fingerprint,
    ) -> Result<Vec<Transaction>, LedgerError>;

    async fn recipient_transactions(
        &self,
        owner: &Fingerprint,
    ) -> Result<Vec<Transaction>, LedgerError>;

    async fn amendments(&self) -> Result<Vec<Amendment>, LedgerError>;

    /// Coins this wallet already minted against one amendment's
    /// dividend.
    async fn dividend_coins(
        &self,
        owner: &Fingerprint,
        amendment: u64,
    ) -> Result<Vec<Coin>, LedgerError>;

    /// Returns false when the ledger refuses the transfer.
    async fn submit_transfer(
        &self,
        owner: &Fingerprint,
        recipient: &Fingerprint,
        coins: &[Coin],
        message: &str,
    ) -> Result<bool, LedgerError>;

    /// Returns false when the ledger refuses the mint request.
    async fn submit_issuance(
        &self,
        owner: &Fingerprint,
        amendment: u64,
        coins: &[Denomination],
    ) -> Result<bool, LedgerError>;
}

/// HDC API client for a uCoin node.
#[derive(Clone)]
pub struct HttpLedgerClient {
    endpoint: String,
    client: Client,
}

/* transactions come wrapped as {"value": {"transaction": {...}}} */
#[derive(Debug, Deserialize)]
struct TransactionEnvelope {
    value: TransactionValue,
}

#[derive(Debug, Deserialize)]
struct TransactionValue {
    transaction: Transaction,
}

#[derive(Debug, Deserialize)]
struct CoinListResponse {
    coins: Vec<Coin>,
}

#[derive(Debug, Serialize)]
struct TransferRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    sender: &'a Fingerprint,
    recipient: &'a Fingerprint,
    coins: &'a [Coin],
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct IssuanceRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    issuer: &'a Fingerprint,
    amendment: u64,
    coins: &'a [Denomination],
}

impl HttpLedgerClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, LedgerError> {
        Ok(Self {
            endpoint: endpoint.into(),
            client: Client::builder().build()?,
        })
    }

    fn url(&self, api: impl fmt::Display) -> String {
        format!("{endpoint}/{api}", endpoint = self.endpoint)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        api: impl fmt::Display,
    ) -> Result<T, LedgerError> {
        let response = self.client.get(self.url(api)).send().await?;
        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            code => Err(LedgerError::Status(code)),
        }
    }

    async fn transactions(
        &self,
        api: impl fmt::Display,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let envelopes: Vec<TransactionEnvelope> = self.get_json(api).await?;
        Ok(envelopes
            .into_iter()
            .map(|envelope| envelope.value.transaction)
            .collect())
    }

    async fn process<B: Serialize + fmt::Debug>(&self, body: &B) -> Result<bool, LedgerError> {
        let response = self
            .client
            .post(self.url("hdc/transactions/process"))
            .json(body)
            .send()
            .await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            code if code.is_client_error() => {
                tracing::debug!("ledger refused {:?} with status {}", body, code);
                Ok(false)
            }
            code => Err(LedgerError::Status(code)),
        }
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn wallet_coins(&self, owner: &Fingerprint) -> Result<Vec<Coin>, LedgerError> {
        let list: CoinListResponse = self.get_json(format!("hdc/coins/{owner}/list")).await?;
        Ok(list.coins)
    }

    async fn sender_transactions(
        &self,
        owner: &Fingerprint,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.transactions(format!("hdc/transactions/sender/{owner}"))
            .await
    }

    async fn recipient_transactions(
        &self,
        owner: &Fingerprint,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.transactions(format!("hdc/transactions/recipient/{owner}"))
            .await
    }

    async fn amendments(&self) -> Result<Vec<Amendment>, LedgerError> {
        self.get_json("hdc/amendments/list").await
    }

    async fn dividend_coins(
        &self,
        owner: &Fingerprint,
        amendment: u64,
    ) -> Result<Vec<Coin>, LedgerError> {
        let transactions = self
            .transactions(format!(
                "hdc/transactions/sender/{owner}/issuance/dividend/{amendment}"
            ))
            .await?;
        Ok(transactions
            .into_iter()
            .flat_map(|transaction| transaction.coins)
            .collect())
    }

    async fn submit_transfer(
        &self,
        owner: &Fingerprint,
        recipient: &Fingerprint,
        coins: &[Coin],
        message: &str,
    ) -> Result<bool, LedgerError> {
        self.process(&TransferRequest {
            kind: "TRANSFER",
            sender: owner,
            recipient,
            coins,
            message,
        })
        .await
    }

    async fn submit_issuance(
        &self,
        owner: &Fingerprint,
        amendment: u64,
        coins: &[Denomination],
    ) -> Result<bool, LedgerError> {
        self.process(&IssuanceRequest {
            kind: "ISSUANCE",
            issuer: owner,
            amendment,
            coins,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::ledger::{HttpLedgerClient, TransactionEnvelope};

    #[test]
    fn urls_are_joined_with_the_endpoint() {
        let client = HttpLedgerClient::new("http://localhost:8081").unwrap();
        assert_eq!(
            client.url("hdc/amendments/list"),
            "http://localhost:8081/hdc/amendments/list"
        );
    }

    #[test]
    fn transaction_envelope_unwraps() {
        const FPR: &str = "2E69197FAB029D8669EF85E82457A1587CA0ED9C";
        let envelope: TransactionEnvelope = serde_json::from_str(&format!(
            "{{\"value\":{{\"transaction\":{{\"number\":1,\"sender\":\"{FPR}\",\
             \"recipient\":\"{FPR}\",\"coins\":[\"{FPR}-0-1-2-A-1\"]}}}}}}"
        ))
        .unwrap();
        assert_eq!(envelope.value.transaction.amount(), 100);
    }
}
