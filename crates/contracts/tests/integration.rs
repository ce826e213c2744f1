//! Integration tests tying simulated liquidations to EVM logs.

use alloy::primitives::{Address, Bytes, Log, LogData, U256};
use alloy::rpc::types::Log as RpcLog;
use sgl_rs_contracts::{decode_event, decode_market_logs, encode_event, ContractError};
use sgl_rs_sim::{
    AllowList, Collaborators, FixedOracle, LiquidationRequest, Market, MarketConfig, MarketEvent,
    MemoryVault, RateSwapper, ShareVault, VaultAsset,
};

const NOW: u64 = 1_700_000_000;

fn market_address() -> Address {
    Address::repeat_byte(0x11)
}

fn rpc_log(address: Address, data: LogData) -> RpcLog {
    RpcLog {
        inner: Log { address, data },
        ..Default::default()
    }
}

/// Runs a closed-market liquidation and returns its journal.
fn simulated_events() -> Vec<MarketEvent> {
    let lender = Address::repeat_byte(0x1e);
    let borrower = Address::repeat_byte(0xa1);
    let swapper = Address::repeat_byte(0x5a);

    let mut vault = MemoryVault::new();
    vault.register_asset(1, VaultAsset::default());
    vault.register_asset(2, VaultAsset::default());

    let mut market = Market::new(market_address(), 1, 2, MarketConfig::default(), NOW);
    market.exchange_rate = U256::from(1_000_000_000_000_000_000u64);

    let share = vault.deposit(1, lender, U256::from(10_000_000)).unwrap();
    market.add_asset(&mut vault, lender, lender, share).unwrap();
    let share = vault.deposit(2, borrower, U256::from(1_200_000)).unwrap();
    market.add_collateral(&mut vault, borrower, borrower, share).unwrap();
    market.borrow(&mut vault, borrower, borrower, U256::from(800_000)).unwrap();

    let mut oracle = FixedOracle::new(U256::from(1_200_000_000_000_000_000u64));
    let mut rate_swapper = RateSwapper::new(swapper, U256::from(833_333_333_333_333_333u64));
    let registry: AllowList = [swapper].into_iter().collect();

    let request = LiquidationRequest {
        users: vec![borrower],
        max_borrow_parts: vec![U256::MAX],
        swapper,
        caller: Address::repeat_byte(0xca),
        timestamp: NOW,
        ..Default::default()
    };
    market
        .liquidate(
            &request,
            Collaborators {
                vault: &mut vault,
                oracle: &mut oracle,
                registry: &registry,
                order_book: None,
                swappers: vec![&mut rate_swapper],
            },
        )
        .unwrap();

    market.take_events()
}

#[test]
fn test_every_journaled_event_survives_log_encoding() {
    let events = simulated_events();
    let names: Vec<_> = events.iter().map(MarketEvent::name).collect();
    assert_eq!(
        names,
        [
            "LogAddAsset",
            "LogAddCollateral",
            "LogBorrow",
            "LogExchangeRate",
            "LogRemoveCollateral",
            "LogRepay",
            "LogAddAsset"
        ]
    );

    for event in &events {
        let decoded = decode_event(&encode_event(event)).unwrap();
        assert_eq!(&decoded, event);
    }
}

#[test]
fn test_accrue_event_survives_log_encoding() {
    let event = MarketEvent::LogAccrue {
        accrued_amount: U256::from(123_456),
        fee_fraction: U256::from(789),
        rate: 317_097_920,
        utilization: U256::from(100_000_000_000_000_000u64),
    };
    assert_eq!(decode_event(&encode_event(&event)).unwrap(), event);
}

#[test]
fn test_receipt_logs_are_filtered_by_market() {
    let events = simulated_events();
    let token = Address::repeat_byte(0x70);

    let mut logs: Vec<_> = events
        .iter()
        .map(|event| rpc_log(market_address(), encode_event(event)))
        .collect();
    // a log from another contract with a market topic
    logs.insert(0, rpc_log(token, encode_event(&events[0])));
    // a market log with a foreign topic
    logs.push(rpc_log(
        market_address(),
        LogData::new_unchecked(vec![alloy::primitives::B256::repeat_byte(1)], Bytes::new()),
    ));

    let decoded = decode_market_logs(market_address(), &logs).unwrap();
    assert_eq!(decoded, events);
}

#[test]
fn test_truncated_log_is_rejected() {
    let mut data = encode_event(&MarketEvent::LogRepay {
        from: Address::repeat_byte(1),
        to: Address::repeat_byte(2),
        amount: U256::from(3),
        part: U256::from(4),
    });
    let topics = data.topics()[..2].to_vec();
    data = LogData::new_unchecked(topics, data.data.clone());

    assert!(matches!(
        decode_event(&data),
        Err(ContractError::UndecodableLog(_))
    ));
}
