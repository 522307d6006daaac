use alloy_primitives::{Address, B256, U256};
use tracing::debug;

use super::burn::PoolSnapshot;
use super::currency::{Currency, CurrencyId, Token, pair_address, sort_tokens};
use super::error::{RemovalError, RemovalResult};
use crate::contracts::{IDefinixPair, IERC20Metadata};
use crate::multicall::{CallBatch, Multicall};

/// 定位交易对所需的工厂参数与原生币包装信息。
#[derive(Debug, Clone)]
pub struct PoolLocator {
    pub factory: Address,
    pub init_code_hash: B256,
    pub wrapped_native: Address,
    pub native_symbol: String,
}

impl PoolLocator {
    pub fn pair_for(&self, a: CurrencyId, b: CurrencyId) -> RemovalResult<(Address, Address, Address)> {
        let token_a = a.wrapped_address(self.wrapped_native);
        let token_b = b.wrapped_address(self.wrapped_native);
        if token_a == token_b {
            return Err(RemovalError::InvalidPair(format!(
                "{a} 与 {b} 是同一个代币"
            )));
        }
        let pair = pair_address(self.factory, self.init_code_hash, token_a, token_b);
        Ok((pair, token_a, token_b))
    }

    fn currency(&self, id: CurrencyId, token: &Token) -> Currency {
        if id.is_native() {
            Currency::Native {
                symbol: self.native_symbol.clone(),
            }
        } else {
            Currency::Token(token.clone())
        }
    }
}

/// 用一次 multicall 读取两侧代币元数据、储备、总供应量与用户 LP 余额。
pub async fn load_pool(
    multicall: &Multicall,
    locator: &PoolLocator,
    a: CurrencyId,
    b: CurrencyId,
    owner: Address,
) -> RemovalResult<PoolSnapshot> {
    let (pair, token_a_address, token_b_address) = locator.pair_for(a, b)?;

    let mut batch = CallBatch::new();
    let symbol_a = batch.add(token_a_address, &IERC20Metadata::symbolCall {});
    let decimals_a = batch.add(token_a_address, &IERC20Metadata::decimalsCall {});
    let symbol_b = batch.add(token_b_address, &IERC20Metadata::symbolCall {});
    let decimals_b = batch.add(token_b_address, &IERC20Metadata::decimalsCall {});
    let lp_symbol = batch.add(pair, &IERC20Metadata::symbolCall {});
    let reserves = batch.add(pair, &IDefinixPair::getReservesCall {});
    let total_supply = batch.add(pair, &IDefinixPair::totalSupplyCall {});
    let balance = batch.add(pair, &IDefinixPair::balanceOfCall { owner });

    let results = multicall.execute(batch).await?;

    let token_a = Token::new(
        token_a_address,
        results.decode(symbol_a)?,
        results.decode(decimals_a)?,
    );
    let token_b = Token::new(
        token_b_address,
        results.decode(symbol_b)?,
        results.decode(decimals_b)?,
    );
    let reserves = results.decode(reserves)?;
    let (token0, _) = sort_tokens(token_a_address, token_b_address);
    let (reserve0, reserve1) = (U256::from(reserves.reserve0), U256::from(reserves.reserve1));
    let (reserve_a, reserve_b) = if token0 == token_a_address {
        (reserve0, reserve1)
    } else {
        (reserve1, reserve0)
    };

    let snapshot = PoolSnapshot {
        pair,
        lp_symbol: results.decode(lp_symbol)?,
        currency_a: locator.currency(a, &token_a),
        currency_b: locator.currency(b, &token_b),
        token_a,
        token_b,
        reserve_a,
        reserve_b,
        total_supply: results.decode(total_supply)?,
        user_liquidity: results.decode(balance)?,
    };

    debug!(
        target: "liquidity::pool",
        pair = %snapshot.pair,
        block = %results.block_number(),
        calls = results.len(),
        reserve_a = %snapshot.reserve_a,
        reserve_b = %snapshot.reserve_b,
        total_supply = %snapshot.total_supply,
        user_liquidity = %snapshot.user_liquidity,
        "交易对快照已加载"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::multicall::testing::serve_aggregate;
    use crate::rpc::mock::MockProvider;
    use alloy_sol_types::{SolCall, SolValue};

    fn locator() -> PoolLocator {
        PoolLocator {
            factory: Address::repeat_byte(0xfa),
            init_code_hash: B256::repeat_byte(0x42),
            wrapped_native: Address::repeat_byte(0x77),
            native_symbol: "ETH".to_string(),
        }
    }

    fn answer(target: Address, data: &[u8]) -> Vec<u8> {
        let selector: [u8; 4] = data[..4].try_into().expect("selector");
        match selector {
            IERC20Metadata::symbolCall::SELECTOR => {
                let symbol = match target {
                    t if t == Address::repeat_byte(0xbb) => "BBB",
                    t if t == Address::repeat_byte(0xaa) => "AAA",
                    t if t == Address::repeat_byte(0x77) => "WETH",
                    _ => "DEFINIX-LP",
                };
                symbol.to_string().abi_encode()
            }
            IERC20Metadata::decimalsCall::SELECTOR => {
                let decimals: u8 = if target == Address::repeat_byte(0xaa) { 6 } else { 18 };
                U256::from(decimals).abi_encode()
            }
            IDefinixPair::getReservesCall::SELECTOR => {
                (U256::from(300u64), U256::from(700u64), 0u32).abi_encode_params()
            }
            IDefinixPair::totalSupplyCall::SELECTOR => U256::from(100u64).abi_encode(),
            IDefinixPair::balanceOfCall::SELECTOR => U256::from(25u64).abi_encode(),
            _ => Vec::new(),
        }
    }

    fn multicall() -> Multicall {
        let provider =
            MockProvider::new(1).with_call_handler(|request| serve_aggregate(request, answer));
        Multicall::new(Arc::new(provider), Address::repeat_byte(0x01))
    }

    #[tokio::test(flavor = "current_thread")]
    async fn reserves_follow_requested_token_order() {
        let a = CurrencyId::Token(Address::repeat_byte(0xbb));
        let b = CurrencyId::Token(Address::repeat_byte(0xaa));
        let snapshot = load_pool(&multicall(), &locator(), a, b, Address::repeat_byte(0x01))
            .await
            .unwrap();

        // token0 为 0xaa.. 即 B 侧
        assert_eq!(snapshot.reserve_a, U256::from(700u64));
        assert_eq!(snapshot.reserve_b, U256::from(300u64));
        assert_eq!(snapshot.token_a.symbol, "BBB");
        assert_eq!(snapshot.token_b.decimals, 6);
        assert_eq!(snapshot.lp_symbol, "DEFINIX-LP");
        assert_eq!(snapshot.total_supply, U256::from(100u64));
        assert_eq!(snapshot.user_liquidity, U256::from(25u64));
        assert_eq!(
            snapshot.pair,
            pair_address(
                locator().factory,
                locator().init_code_hash,
                Address::repeat_byte(0xaa),
                Address::repeat_byte(0xbb)
            )
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn native_side_is_wrapped_for_reads() {
        let a = CurrencyId::Token(Address::repeat_byte(0xaa));
        let snapshot = load_pool(
            &multicall(),
            &locator(),
            a,
            CurrencyId::Native,
            Address::repeat_byte(0x01),
        )
        .await
        .unwrap();
        assert!(snapshot.currency_b.is_native());
        assert_eq!(snapshot.currency_b.symbol(), "ETH");
        assert_eq!(snapshot.token_b.address, Address::repeat_byte(0x77));
        assert_eq!(snapshot.token_b.symbol, "WETH");
    }

    #[test]
    fn identical_tokens_are_rejected() {
        let err = locator()
            .pair_for(CurrencyId::Native, CurrencyId::Token(Address::repeat_byte(0x77)))
            .unwrap_err();
        assert!(matches!(err, RemovalError::InvalidPair(_)));
    }
}
