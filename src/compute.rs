// src/compute.rs

// --- Imports ---
use crate::extractors::table::RawTransaction;
use crate::normalize::{round3, TransactionKind};
use serde::Serialize;

// --- Data Structures ---

/// A transaction after grouping. The per-entry purpose is gone: exactly one
/// purpose survives per group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount_transacted: Option<i64>,
    pub price: Option<i64>,
    pub date: Option<String>,
}

/// An ordered bucket of transactions sharing a classification (others vs
/// buy/sell), with the chronologically last entry's purpose.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionGroup {
    pub transactions: Vec<GroupedTransaction>,
    pub purpose: String,
}

/// Aggregate figures computed over one group.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedAggregate {
    pub price: f64,
    pub transaction_value: i64,
    pub transaction_type: TransactionKind,
}

// --- Operations ---

/// Partitions raw transactions into an "others" group and a "buy/sell"
/// group. Non-trade events are never netted against trades, so the two
/// buckets stay separate all the way to the output records. Entries whose
/// type mapped onto neither bucket are dropped.
pub fn split_transactions(
    transactions: Vec<RawTransaction>,
) -> (Option<TransactionGroup>, Option<TransactionGroup>) {
    let mut others: Vec<GroupedTransaction> = Vec::new();
    let mut others_purpose = String::new();
    let mut trades: Vec<GroupedTransaction> = Vec::new();
    let mut trades_purpose = String::new();

    for transaction in transactions {
        let RawTransaction {
            kind,
            amount_transacted,
            price,
            date,
            purpose,
        } = transaction;

        let entry = GroupedTransaction {
            kind,
            amount_transacted,
            price,
            date,
        };

        match entry.kind {
            TransactionKind::Others => {
                others_purpose = purpose;
                others.push(entry);
            }
            TransactionKind::Buy | TransactionKind::Sell => {
                trades_purpose = purpose;
                trades.push(entry);
            }
            TransactionKind::Correction(_) | TransactionKind::Unknown(_) => {
                tracing::debug!("dropping non-nettable transaction: {:?}", entry.kind);
            }
        }
    }

    let others_group = (!others.is_empty()).then(|| TransactionGroup {
        transactions: others,
        purpose: others_purpose,
    });
    let trades_group = (!trades.is_empty()).then(|| TransactionGroup {
        transactions: trades,
        purpose: trades_purpose,
    });

    (others_group, trades_group)
}

/// Sums amount × price per sub-type and nets buys against sells. A group
/// without any buy or sell entries aggregates as "others" over its own
/// totals instead.
pub fn compute_transactions(transactions: &[GroupedTransaction]) -> ComputedAggregate {
    let mut total_buy_shares: i64 = 0;
    let mut total_buy_value: f64 = 0.0;

    let mut total_sell_shares: i64 = 0;
    let mut total_sell_value: f64 = 0.0;

    let mut total_others_shares: i64 = 0;
    let mut total_others_value: f64 = 0.0;

    let mut has_buy_sell = false;

    for transaction in transactions {
        let amount = transaction.amount_transacted.unwrap_or(0);
        let price = transaction.price.unwrap_or(0) as f64;
        let value = amount as f64 * price;

        match transaction.kind {
            TransactionKind::Buy => {
                total_buy_shares += amount;
                total_buy_value += value;
                has_buy_sell = true;
            }
            TransactionKind::Sell => {
                total_sell_shares += amount;
                total_sell_value += value;
                has_buy_sell = true;
            }
            _ => {
                total_others_shares += amount;
                total_others_value += value;
            }
        }
    }

    if has_buy_sell {
        let net_value = total_buy_value - total_sell_value;
        let net_shares = total_buy_shares - total_sell_shares;

        let transaction_type = if net_value > 0.0 {
            TransactionKind::Buy
        } else if net_value < 0.0 {
            TransactionKind::Sell
        } else {
            TransactionKind::Others
        };

        let weighted_price = if net_shares != 0 {
            (net_value / net_shares as f64).abs()
        } else {
            0.0
        };

        ComputedAggregate {
            price: round3(weighted_price),
            transaction_value: net_value.abs().trunc() as i64,
            transaction_type,
        }
    } else {
        let weighted_price = if total_others_shares > 0 {
            total_others_value / total_others_shares as f64
        } else {
            0.0
        };

        ComputedAggregate {
            price: round3(weighted_price),
            transaction_value: total_others_value.abs().trunc() as i64,
            transaction_type: TransactionKind::Others,
        }
    }
}

/// The top-level transacted amount is the share-ledger delta, deliberately
/// independent of the group arithmetic: disclosed transaction counts and
/// ledger deltas can legitimately diverge.
pub fn holding_delta(holding_before: Option<i64>, holding_after: Option<i64>) -> Option<i64> {
    match (holding_before, holding_after) {
        (Some(before), Some(after)) => Some((before - after).abs()),
        _ => None,
    }
}
