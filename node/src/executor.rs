//! # Single-Writer Executor
//!
//! Every invocation runs as its own transaction against the sled world
//! state. The database handle sits behind one mutex, so transactions are
//! serialized: a read-validate-write cycle never interleaves with another.
//!
//! A transaction commits only when the contract call succeeds. Rejections
//! and faults drop the context, and with it every buffered write and the
//! pending event. A commit records its transaction id as the database's
//! last committed transaction in the same sled transaction as its writes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;

use assetledger_contracts::{invoke, AssetManagementContract, ContractError, Invocation};
use assetledger_protocol::{LedgerDB, TxContext, TxReceipt};

use crate::metrics::NodeMetrics;

/// A committed invocation.
#[derive(Debug, Clone)]
pub struct Execution {
    /// The commit receipt, carrying the released event.
    pub receipt: TxReceipt,
    /// Read result, for invocations that return one.
    pub payload: Option<Vec<u8>>,
}

/// Runs invocations one at a time against a [`LedgerDB`].
pub struct Executor {
    db: Mutex<LedgerDB>,
    contract: AssetManagementContract,
    metrics: Arc<NodeMetrics>,
}

impl Executor {
    pub fn new(db: LedgerDB, metrics: Arc<NodeMetrics>) -> Self {
        Self {
            db: Mutex::new(db),
            contract: AssetManagementContract::new(),
            metrics,
        }
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    /// Run `invocation` with the current wall-clock time as its
    /// transaction timestamp.
    pub fn execute(&self, invocation: &Invocation) -> Result<Execution, ContractError> {
        self.execute_at(invocation, Utc::now())
    }

    /// Run `invocation` under an explicit transaction timestamp.
    pub fn execute_at(
        &self,
        invocation: &Invocation,
        at: DateTime<Utc>,
    ) -> Result<Execution, ContractError> {
        let timer = self.metrics.transaction_latency_seconds.start_timer();
        let result = {
            let mut db = self.db.lock();
            run_transaction(&self.contract, &mut db, invocation, at)
        };
        timer.observe_duration();

        match &result {
            Ok(execution) => {
                self.metrics.transactions_committed_total.inc();
                if execution.receipt.event.is_some() {
                    self.metrics.events_emitted_total.inc();
                }
            }
            Err(e) if e.is_infrastructure() => self.metrics.infrastructure_faults_total.inc(),
            Err(e) => self
                .metrics
                .transactions_rejected_total
                .with_label_values(&[e.code()])
                .inc(),
        }
        result
    }
}

fn run_transaction(
    contract: &AssetManagementContract,
    db: &mut LedgerDB,
    invocation: &Invocation,
    at: DateTime<Utc>,
) -> Result<Execution, ContractError> {
    let mut tx = TxContext::new(db, at);
    let tx_id = tx.tx_id().to_string();
    debug!(
        %tx_id,
        function = invocation.function_name(),
        read_only = invocation.is_read_only(),
        "transaction started"
    );

    let payload = invoke(contract, &mut tx, invocation)?;
    // Writes and the last-tx marker land together; reads never reach the store.
    let receipt = tx.commit()?;
    Ok(Execution { receipt, payload })
}
