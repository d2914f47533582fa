use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use eventbus::{Publisher, TransferEvent, TransferFields};
use ledger::{LedgerAdapter, LedgerBalance, LedgerError, SYSTEM_ACCOUNT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolRebalancerSetting {
    pub imbalance_threshold: f64,
    pub minimum_balance: f64,
    pub top_up_amount: f64,
    pub required_balance_for_top_up: f64,
}

/// Hardcoded per-asset liquidity policy; there's no config surface for
/// adjusting these short of a code change.
pub fn default_settings() -> HashMap<String, PoolRebalancerSetting> {
    let mut m = HashMap::new();
    m.insert(
        "USD".to_string(),
        PoolRebalancerSetting {
            imbalance_threshold: 0.7,
            minimum_balance: 400000.0,
            top_up_amount: 15000.0,
            required_balance_for_top_up: 0.0,
        },
    );
    m.insert(
        "EUR".to_string(),
        PoolRebalancerSetting {
            imbalance_threshold: 0.2,
            minimum_balance: 5000.0,
            top_up_amount: 10000.0,
            required_balance_for_top_up: 0.0,
        },
    );
    m.insert(
        "JPY".to_string(),
        PoolRebalancerSetting {
            imbalance_threshold: 0.3,
            minimum_balance: 500000.0,
            top_up_amount: 700000.0,
            required_balance_for_top_up: 0.0,
        },
    );
    m.insert(
        "GBP".to_string(),
        PoolRebalancerSetting {
            imbalance_threshold: 0.1,
            minimum_balance: 100000.0,
            top_up_amount: 120000.0,
            required_balance_for_top_up: 0.0,
        },
    );
    m.insert(
        "AUD".to_string(),
        PoolRebalancerSetting {
            imbalance_threshold: 0.2,
            minimum_balance: 300000.0,
            top_up_amount: 320000.0,
            required_balance_for_top_up: 0.0,
        },
    );
    m
}

/// The balance gaining liquidity fastest (most negative imbalance ratio).
/// `None` if nothing in the set is net-positive on inflow.
pub fn most_trending_deposit(balances: &[LedgerBalance]) -> Option<&LedgerBalance> {
    balances
        .iter()
        .filter(|b| b.imbalance_ratio() < 0.0)
        .min_by(|a, b| a.imbalance_ratio().partial_cmp(&b.imbalance_ratio()).unwrap())
}

/// Runs for the lifetime of the process, unlike the one-tick loop this was
/// adapted from.
pub async fn run(
    ledger: Arc<dyn LedgerAdapter>,
    publisher: Arc<dyn Publisher>,
    poll_interval: Duration,
    shutdown: CancellationToken,
) {
    let settings = default_settings();
    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("pool rebalancer shutting down");
                return;
            }
            _ = ticker.tick() => {
                if let Err(err) = check_system_pool(&ledger, &publisher, &settings).await {
                    tracing::error!(error = %err, "pool rebalancer tick failed");
                }
            }
        }
    }
}

async fn check_system_pool(
    ledger: &Arc<dyn LedgerAdapter>,
    publisher: &Arc<dyn Publisher>,
    settings: &HashMap<String, PoolRebalancerSetting>,
) -> Result<(), LedgerError> {
    let balances = ledger.get_balances(SYSTEM_ACCOUNT).await?;
    let source = most_trending_deposit(&balances);

    for balance in &balances {
        let setting = match settings.get(&balance.asset) {
            Some(s) => s,
            None => continue,
        };

        let ratio = balance.imbalance_ratio();
        if ratio < setting.imbalance_threshold || balance.amount >= setting.minimum_balance {
            continue;
        }

        let source = match source {
            Some(s) if s.asset != balance.asset => s,
            _ => continue,
        };
        let source_setting = match settings.get(&source.asset) {
            Some(s) => s,
            None => continue,
        };
        if source.amount < source_setting.required_balance_for_top_up {
            continue;
        }

        let event = TransferEvent::Created(TransferFields {
            transfer_id: uuid::Uuid::now_v7(),
            from_asset: source.asset.clone(),
            to_asset: balance.asset.clone(),
            sender: SYSTEM_ACCOUNT.to_string(),
            recipient: SYSTEM_ACCOUNT.to_string(),
            amount: setting.top_up_amount,
            fee: 0.0,
            rate: 0.0,
        });

        if let Err(err) = publisher.publish(&event).await {
            tracing::error!(error = %err, "failed to publish rebalance transfer");
        }
        return Ok(());
    }

    Ok(())
}
