//! Conversion between engine events and EVM logs.
//!
//! The simulated market journals [`MarketEvent`]s with the same fields as the
//! logs the deployed market emits, so a simulated batch can be compared log by
//! log against a real transaction receipt.

use alloy::primitives::{Address, LogData, B256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use sgl_rs_sim::MarketEvent;

use crate::error::{ContractError, Result};
use crate::singularity::ISingularity::{
    LogAccrue, LogAddAsset, LogAddCollateral, LogBorrow, LogExchangeRate, LogRemoveCollateral,
    LogRepay,
};

/// Topic hashes of every market event
pub const MARKET_EVENT_TOPICS: [B256; 7] = [
    LogAccrue::SIGNATURE_HASH,
    LogExchangeRate::SIGNATURE_HASH,
    LogAddCollateral::SIGNATURE_HASH,
    LogRemoveCollateral::SIGNATURE_HASH,
    LogBorrow::SIGNATURE_HASH,
    LogRepay::SIGNATURE_HASH,
    LogAddAsset::SIGNATURE_HASH,
];

/// Encodes an engine event as the log the market would emit.
pub fn encode_event(event: &MarketEvent) -> LogData {
    match *event {
        MarketEvent::LogAccrue {
            accrued_amount,
            fee_fraction,
            rate,
            utilization,
        } => LogAccrue {
            accruedAmount: accrued_amount,
            feeFraction: fee_fraction,
            rate,
            utilization,
        }
        .encode_log_data(),
        MarketEvent::LogExchangeRate { rate } => LogExchangeRate { rate }.encode_log_data(),
        MarketEvent::LogAddCollateral { from, to, share } => {
            LogAddCollateral { from, to, share }.encode_log_data()
        }
        MarketEvent::LogRemoveCollateral { from, to, share } => {
            LogRemoveCollateral { from, to, share }.encode_log_data()
        }
        MarketEvent::LogBorrow {
            from,
            to,
            amount,
            fee_amount,
            part,
        } => LogBorrow {
            from,
            to,
            amount,
            feeAmount: fee_amount,
            part,
        }
        .encode_log_data(),
        MarketEvent::LogRepay {
            from,
            to,
            amount,
            part,
        } => LogRepay {
            from,
            to,
            amount,
            part,
        }
        .encode_log_data(),
        MarketEvent::LogAddAsset {
            from,
            to,
            share,
            fraction,
        } => LogAddAsset {
            from,
            to,
            share,
            fraction,
        }
        .encode_log_data(),
    }
}

fn decode<E: SolEvent>(data: &LogData) -> Result<E> {
    E::decode_log_data(data)
        .map_err(|e| ContractError::UndecodableLog(format!("{}: {}", E::SIGNATURE, e)))
}

/// Decodes a market log back into an engine event.
pub fn decode_event(data: &LogData) -> Result<MarketEvent> {
    let topic = data
        .topics()
        .first()
        .copied()
        .ok_or_else(|| ContractError::UndecodableLog("log has no topics".to_string()))?;

    let event = match topic {
        topic if topic == LogAccrue::SIGNATURE_HASH => {
            let log: LogAccrue = decode(data)?;
            MarketEvent::LogAccrue {
                accrued_amount: log.accruedAmount,
                fee_fraction: log.feeFraction,
                rate: log.rate,
                utilization: log.utilization,
            }
        }
        topic if topic == LogExchangeRate::SIGNATURE_HASH => {
            let log: LogExchangeRate = decode(data)?;
            MarketEvent::LogExchangeRate { rate: log.rate }
        }
        topic if topic == LogAddCollateral::SIGNATURE_HASH => {
            let log: LogAddCollateral = decode(data)?;
            MarketEvent::LogAddCollateral {
                from: log.from,
                to: log.to,
                share: log.share,
            }
        }
        topic if topic == LogRemoveCollateral::SIGNATURE_HASH => {
            let log: LogRemoveCollateral = decode(data)?;
            MarketEvent::LogRemoveCollateral {
                from: log.from,
                to: log.to,
                share: log.share,
            }
        }
        topic if topic == LogBorrow::SIGNATURE_HASH => {
            let log: LogBorrow = decode(data)?;
            MarketEvent::LogBorrow {
                from: log.from,
                to: log.to,
                amount: log.amount,
                fee_amount: log.feeAmount,
                part: log.part,
            }
        }
        topic if topic == LogRepay::SIGNATURE_HASH => {
            let log: LogRepay = decode(data)?;
            MarketEvent::LogRepay {
                from: log.from,
                to: log.to,
                amount: log.amount,
                part: log.part,
            }
        }
        topic if topic == LogAddAsset::SIGNATURE_HASH => {
            let log: LogAddAsset = decode(data)?;
            MarketEvent::LogAddAsset {
                from: log.from,
                to: log.to,
                share: log.share,
                fraction: log.fraction,
            }
        }
        other => return Err(ContractError::UnknownEvent(other)),
    };
    Ok(event)
}

/// Decodes the market events of a receipt or `eth_getLogs` result.
///
/// Logs emitted by other contracts (tokens, the vault) are skipped.
pub fn decode_market_logs<'a>(
    market: Address,
    logs: impl IntoIterator<Item = &'a Log>,
) -> Result<Vec<MarketEvent>> {
    logs.into_iter()
        .filter(|log| log.address() == market)
        .filter(|log| {
            log.topics()
                .first()
                .is_some_and(|topic| MARKET_EVENT_TOPICS.contains(topic))
        })
        .map(|log| decode_event(log.data()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Bytes, U256};

    #[test]
    fn test_indexed_fields_become_topics() {
        let from = Address::repeat_byte(0xa1);
        let to = Address::repeat_byte(0x5a);
        let data = encode_event(&MarketEvent::LogRemoveCollateral {
            from,
            to,
            share: U256::from(7),
        });

        assert_eq!(data.topics().len(), 4);
        assert_eq!(data.topics()[0], LogRemoveCollateral::SIGNATURE_HASH);
        assert_eq!(data.topics()[1], from.into_word());
        assert_eq!(data.topics()[3], B256::from(U256::from(7)));
        assert!(data.data.is_empty());
    }

    #[test]
    fn test_non_indexed_fields_go_to_data() {
        let data = encode_event(&MarketEvent::LogAddAsset {
            from: Address::repeat_byte(1),
            to: Address::repeat_byte(2),
            share: U256::from(3),
            fraction: U256::from(4),
        });

        assert_eq!(data.data.len(), 32);
        assert_eq!(U256::from_be_slice(&data.data), U256::from(4));
    }

    #[test]
    fn test_unknown_topic() {
        let data = LogData::new_unchecked(vec![B256::repeat_byte(9)], Bytes::new());
        assert!(matches!(decode_event(&data), Err(ContractError::UnknownEvent(_))));
    }

    #[test]
    fn test_missing_topic() {
        let data = LogData::new_unchecked(Vec::new(), Bytes::new());
        assert!(matches!(decode_event(&data), Err(ContractError::UndecodableLog(_))));
    }
}
