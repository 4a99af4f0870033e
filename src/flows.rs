use crate::cache::WalletCache;
use crate::denomination::Denomination;
use crate::dividend::{self, AmendmentNumber, DenominationCount, Remainders};
use crate::error::WalletError;
use crate::ledger::LedgerClient;
use crate::model::{Coin, Fingerprint, Transaction};
use crate::selection;
use std::collections::{BTreeMap, HashMap};

/// Request-layer control flow: fetch from the ledger, run the pure
/// reconciliation core, submit the result. Holds the cache service so
/// repeated history/remainder queries skip the ledger for a while.
pub struct WalletService<L> {
    ledger: L,
    cache: WalletCache,
}

#[derive(Clone, Debug, Default)]
pub struct WalletHistory {
    pub sent: Vec<Transaction>,
    pub received: Vec<Transaction>,
}

#[derive(Clone, Debug)]
pub struct TransferReceipt {
    pub coins: Vec<Coin>,
    pub amount: u64,
}

/// Mint requests the ledger accepted, per amendment. When issuance
/// fails mid-batch these stand; the flow is at-least-once, not atomic.
#[derive(Clone, Debug, Default)]
pub struct IssuanceReport {
    pub submitted: BTreeMap<AmendmentNumber, Vec<Denomination>>,
}

impl<L: LedgerClient> WalletService<L> {
    pub fn new(ledger: L, cache: WalletCache) -> Self {
        Self { ledger, cache }
    }

    pub async fn balance(&self, owner: &Fingerprint) -> Result<(u64, Vec<Coin>), WalletError> {
        let coins = self.ledger.wallet_coins(owner).await?;
        let balance = coins.iter().map(Coin::amount).sum();
        Ok((balance, coins))
    }

    pub async fn transfer(
        &self,
        owner: &Fingerprint,
        recipient: &Fingerprint,
        amount: u64,
        message: &str,
    ) -> Result<TransferReceipt, WalletError> {
        let (balance, coins) = self.balance(owner).await?;
        if amount > balance {
            return Err(WalletError::InsufficientBalance {
                requested: amount,
                available: balance,
            });
        }

        let selection = selection::select_coins(&coins, amount)?;
        tracing::info!(
            "transferring {} coins worth {} from {} to {}",
            selection.coins.len(),
            selection.total,
            owner,
            recipient
        );

        if !self
            .ledger
            .submit_transfer(owner, recipient, &selection.coins, message)
            .await?
        {
            return Err(WalletError::TransferSubmissionFailed);
        }
        Ok(TransferReceipt {
            coins: selection.coins,
            amount: selection.total,
        })
    }

    pub async fn history(&mut self, owner: &Fingerprint) -> Result<WalletHistory, WalletError> {
        let sent = match self.cache.sender_transactions(owner) {
            Some(sent) => sent,
            None => {
                let sent = self.ledger.sender_transactions(owner).await?;
                self.cache.set_sender_transactions(owner, sent.clone());
                sent
            }
        };
        let received = match self.cache.recipient_transactions(owner) {
            Some(received) => received,
            None => {
                let received = self.ledger.recipient_transactions(owner).await?;
                self.cache.set_recipient_transactions(owner, received.clone());
                received
            }
        };
        Ok(WalletHistory { sent, received })
    }

    pub fn refresh_history(&mut self, owner: &Fingerprint) {
        self.cache.drop_history(owner);
    }

    /// Cached dividend remainders for one wallet, recomputed from the
    /// ledger when stale.
    pub async fn outstanding_dividends(
        &mut self,
        owner: &Fingerprint,
    ) -> Result<Remainders, WalletError> {
        if let Some(remainders) = self.cache.remainders(owner) {
            return Ok(remainders);
        }

        let amendments = self.ledger.amendments().await?;
        let mut issued = HashMap::new();
        for amendment in amendments.iter() {
            if amendment.dividend.unwrap_or(0) == 0 {
                continue;
            }
            let coins = self.ledger.dividend_coins(owner, amendment.number).await?;
            issued.insert(amendment.number, coins);
        }

        let remainders = dividend::compute_remainders(&amendments, &issued);
        self.cache.set_remainders(owner, remainders.clone());
        Ok(remainders)
    }

    pub async fn issuance_plan(
        &mut self,
        owner: &Fingerprint,
    ) -> Result<Vec<DenominationCount>, WalletError> {
        let remainders = self.outstanding_dividends(owner).await?;
        Ok(dividend::plan_denominations(&remainders))
    }

    /// Mints the requested denomination quantities against outstanding
    /// remainders, amendment by amendment in ascending number order.
    /// Stops at the first refused amendment; earlier submissions stand.
    pub async fn issue_dividends(
        &mut self,
        owner: &Fingerprint,
        requested: &[(Denomination, u64)],
    ) -> Result<IssuanceReport, WalletError> {
        let remainders = self.outstanding_dividends(owner).await?;
        if remainders.is_empty() {
            return Err(WalletError::NoOutstandingDividend);
        }

        let issuances = dividend::allocate(&remainders, requested);
        // Anything submitted below changes ledger state, so the cached
        // remainders are stale no matter how the batch ends.
        self.cache.drop_remainders(owner);

        let mut report = IssuanceReport::default();
        for (amendment, coins) in issuances {
            if coins.is_empty() {
                continue;
            }
            tracing::info!(
                "issuing {} coins against amendment {} for {}",
                coins.len(),
                amendment,
                owner
            );
            if !self.ledger.submit_issuance(owner, amendment, &coins).await? {
                return Err(WalletError::IssuanceSubmissionFailed { amendment });
            }
            report.submitted.insert(amendment, coins);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::WalletCache;
    use crate::denomination::Denomination;
    use crate::error::WalletError;
    use crate::flows::WalletService;
    use crate::ledger::{LedgerClient, LedgerError};
    use crate::model::{Amendment, Coin, CoinOrigin, Fingerprint, Transaction};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    const FPR: &str = "2E69197FAB029D8669EF85E82457A1587CA0ED9C";
    const OTHER: &str = "31A6DE35E4E4E8A0C68AF86A4F2E5C3B5D8A01F7";

    fn owner() -> Fingerprint {
        FPR.parse().unwrap()
    }

    fn coin(number: u64, amount: u64) -> Coin {
        Coin {
            issuer: owner(),
            number,
            denomination: Denomination::from_amount(amount).unwrap(),
            origin: CoinOrigin::Amendment,
            origin_number: 1,
        }
    }

    fn denom(amount: u64) -> Denomination {
        Denomination::from_amount(amount).unwrap()
    }

    #[derive(Default)]
    struct FakeLedger {
        coins: Vec<Coin>,
        transactions: Vec<Transaction>,
        amendments: Vec<Amendment>,
        dividend_coins: HashMap<u64, Vec<Coin>>,
        refuse_transfers: bool,
        refuse_amendment: Option<u64>,
        submitted_issuances: Mutex<Vec<(u64, Vec<Denomination>)>>,
        fetches: Mutex<u64>,
    }

    #[async_trait]
    impl LedgerClient for FakeLedger {
        async fn wallet_coins(&self, _owner: &Fingerprint) -> Result<Vec<Coin>, LedgerError> {
            Ok(self.coins.clone())
        }

        async fn sender_transactions(
            &self,
            _owner: &Fingerprint,
        ) -> Result<Vec<Transaction>, LedgerError> {
            *self.fetches.lock().unwrap() += 1;
            Ok(self.transactions.clone())
        }

        async fn recipient_transactions(
            &self,
            _owner: &Fingerprint,
        ) -> Result<Vec<Transaction>, LedgerError> {
            *self.fetches.lock().unwrap() += 1;
            Ok(vec![])
        }

        async fn amendments(&self) -> Result<Vec<Amendment>, LedgerError> {
            Ok(self.amendments.clone())
        }

        async fn dividend_coins(
            &self,
            _owner: &Fingerprint,
            amendment: u64,
        ) -> Result<Vec<Coin>, LedgerError> {
            Ok(self.dividend_coins.get(&amendment).cloned().unwrap_or_default())
        }

        async fn submit_transfer(
            &self,
            _owner: &Fingerprint,
            _recipient: &Fingerprint,
            _coins: &[Coin],
            _message: &str,
        ) -> Result<bool, LedgerError> {
            Ok(!self.refuse_transfers)
        }

        async fn submit_issuance(
            &self,
            _owner: &Fingerprint,
            amendment: u64,
            coins: &[Denomination],
        ) -> Result<bool, LedgerError> {
            if self.refuse_amendment == Some(amendment) {
                return Ok(false);
            }
            self.submitted_issuances
                .lock()
                .unwrap()
                .push((amendment, coins.to_vec()));
            Ok(true)
        }
    }

    fn service(ledger: FakeLedger) -> WalletService<FakeLedger> {
        WalletService::new(ledger, WalletCache::new(Duration::from_secs(60)))
    }

    #[tokio::test]
    async fn transfer_selects_and_submits() {
        let ledger = FakeLedger {
            coins: vec![coin(1, 500), coin(2, 200), coin(3, 200), coin(4, 100)],
            ..Default::default()
        };
        let service = service(ledger);

        let receipt = service
            .transfer(&owner(), &OTHER.parse().unwrap(), 700, "rent")
            .await
            .unwrap();
        assert_eq!(receipt.amount, 700);
        assert_eq!(
            receipt.coins.iter().map(|c| c.number).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn transfer_checks_balance_before_selecting() {
        let ledger = FakeLedger {
            coins: vec![coin(1, 100)],
            ..Default::default()
        };
        let service = service(ledger);

        match service
            .transfer(&owner(), &OTHER.parse().unwrap(), 500, "")
            .await
        {
            Err(WalletError::InsufficientBalance {
                requested: 500,
                available: 100,
            }) => {}
            other => panic!("expected InsufficientBalance, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transfer_fails_on_unreachable_amount() {
        let ledger = FakeLedger {
            coins: vec![coin(1, 500), coin(2, 200)],
            ..Default::default()
        };
        let service = service(ledger);

        match service
            .transfer(&owner(), &OTHER.parse().unwrap(), 400, "")
            .await
        {
            Err(WalletError::UnreachableAmount { requested: 400 }) => {}
            other => panic!("expected UnreachableAmount, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_transfer_surfaces_as_submission_failure() {
        let ledger = FakeLedger {
            coins: vec![coin(1, 100)],
            refuse_transfers: true,
            ..Default::default()
        };
        let service = service(ledger);

        match service
            .transfer(&owner(), &OTHER.parse().unwrap(), 100, "")
            .await
        {
            Err(WalletError::TransferSubmissionFailed) => {}
            other => panic!("expected TransferSubmissionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn history_hits_cache_on_second_call() {
        let ledger = FakeLedger::default();
        let mut service = service(ledger);

        service.history(&owner()).await.unwrap();
        service.history(&owner()).await.unwrap();
        assert_eq!(*service.ledger.fetches.lock().unwrap(), 2);

        service.refresh_history(&owner());
        service.history(&owner()).await.unwrap();
        assert_eq!(*service.ledger.fetches.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn outstanding_dividends_subtract_prior_issuance() {
        let ledger = FakeLedger {
            amendments: vec![
                Amendment {
                    number: 1,
                    dividend: Some(1000),
                    generated_on: None,
                },
                Amendment {
                    number: 2,
                    dividend: None,
                    generated_on: None,
                },
            ],
            dividend_coins: HashMap::from([(1, vec![coin(0, 200), coin(1, 100)])]),
            ..Default::default()
        };
        let mut service = service(ledger);

        let remainders = service.outstanding_dividends(&owner()).await.unwrap();
        assert_eq!(remainders.get(&1), Some(&700));
        assert!(!remainders.contains_key(&2));
    }

    #[tokio::test]
    async fn issuance_submits_per_amendment() {
        let ledger = FakeLedger {
            amendments: vec![Amendment {
                number: 1,
                dividend: Some(700),
                generated_on: None,
            }],
            ..Default::default()
        };
        let mut service = service(ledger);

        let report = service
            .issue_dividends(&owner(), &[(denom(500), 1), (denom(200), 1)])
            .await
            .unwrap();
        assert_eq!(report.submitted[&1], vec![denom(500), denom(200)]);
        assert_eq!(
            *service.ledger.submitted_issuances.lock().unwrap(),
            vec![(1, vec![denom(500), denom(200)])]
        );
    }

    #[tokio::test]
    async fn issuance_halts_on_first_refusal_but_earlier_ones_stand() {
        let ledger = FakeLedger {
            amendments: vec![
                Amendment {
                    number: 1,
                    dividend: Some(200),
                    generated_on: None,
                },
                Amendment {
                    number: 2,
                    dividend: Some(200),
                    generated_on: None,
                },
                Amendment {
                    number: 3,
                    dividend: Some(200),
                    generated_on: None,
                },
            ],
            refuse_amendment: Some(2),
            ..Default::default()
        };
        let mut service = service(ledger);

        match service
            .issue_dividends(&owner(), &[(denom(200), 3)])
            .await
        {
            Err(WalletError::IssuanceSubmissionFailed { amendment: 2 }) => {}
            other => panic!("expected IssuanceSubmissionFailed, got {other:?}"),
        }
        // amendment 1 was accepted before the halt, amendment 3 never ran
        assert_eq!(
            *service.ledger.submitted_issuances.lock().unwrap(),
            vec![(1, vec![denom(200)])]
        );
    }

    #[tokio::test]
    async fn issuance_without_remainders_reports_nothing_to_do() {
        let ledger = FakeLedger::default();
        let mut service = service(ledger);

        match service.issue_dividends(&owner(), &[(denom(100), 1)]).await {
            Err(WalletError::NoOutstandingDividend) => {}
            other => panic!("expected NoOutstandingDividend, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn issuance_plan_lists_mintable_counts() {
        let ledger = FakeLedger {
            amendments: vec![Amendment {
                number: 1,
                dividend: Some(700),
                generated_on: None,
            }],
            ..Default::default()
        };
        let mut service = service(ledger);

        let plan = service.issuance_plan(&owner()).await.unwrap();
        assert_eq!(plan.last().unwrap().denomination, denom(500));
        assert_eq!(plan.last().unwrap().available, 1);
    }
}
