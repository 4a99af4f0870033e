use crate::dividend::Remainders;
use crate::model::{Fingerprint, Transaction};
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Plain key/value store with per-entry expiry. Values are recomputed
/// from the authoritative ledger once stale, so last-writer-wins is
/// fine here.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: HashMap<String, (Instant, V)>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries
            .get(key)
            .and_then(|(stored, value)| (stored.elapsed() < self.ttl).then(|| value.clone()))
    }

    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), (Instant::now(), value));
    }

    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Per-wallet cache service handed to the request layer. One namespace
/// per concern, all keyed by wallet fingerprint.
pub struct WalletCache {
    sender_transactions: TtlCache<Vec<Transaction>>,
    recipient_transactions: TtlCache<Vec<Transaction>>,
    remainders: TtlCache<Remainders>,
}

impl WalletCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sender_transactions: TtlCache::new(ttl),
            recipient_transactions: TtlCache::new(ttl),
            remainders: TtlCache::new(ttl),
        }
    }

    pub fn sender_transactions(&self, owner: &Fingerprint) -> Option<Vec<Transaction>> {
        self.sender_transactions.get(owner.as_str())
    }

    pub fn set_sender_transactions(&mut self, owner: &Fingerprint, transactions: Vec<Transaction>) {
        self.sender_transactions.set(owner.as_str(), transactions);
    }

    pub fn recipient_transactions(&self, owner: &Fingerprint) -> Option<Vec<Transaction>> {
        self.recipient_transactions.get(owner.as_str())
    }

    pub fn set_recipient_transactions(
        &mut self,
        owner: &Fingerprint,
        transactions: Vec<Transaction>,
    ) {
        self.recipient_transactions.set(owner.as_str(), transactions);
    }

    pub fn remainders(&self, owner: &Fingerprint) -> Option<Remainders> {
        self.remainders.get(owner.as_str())
    }

    pub fn set_remainders(&mut self, owner: &Fingerprint, remainders: Remainders) {
        self.remainders.set(owner.as_str(), remainders);
    }

    pub fn drop_history(&mut self, owner: &Fingerprint) {
        self.sender_transactions.invalidate(owner.as_str());
        self.recipient_transactions.invalidate(owner.as_str());
    }

    pub fn drop_remainders(&mut self, owner: &Fingerprint) {
        self.remainders.invalidate(owner.as_str());
    }
}

impl Default for WalletCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
