//! 路由移除方法的候选表与调用构造。
//!
//! 候选列表按优先级排列，提交时选第一个 gas 估算成功的方法。

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;

use super::currency::Currency;
use super::error::{RemovalError, RemovalResult};
use super::permit::PermitSignature;
use crate::contracts::IDefinixRouter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    RemoveLiquidity,
    RemoveLiquidityEth,
    RemoveLiquidityEthSupportingFee,
    RemoveLiquidityWithPermit,
    RemoveLiquidityEthWithPermit,
    RemoveLiquidityEthWithPermitSupportingFee,
}

impl MethodKind {
    pub fn name(&self) -> &'static str {
        match self {
            MethodKind::RemoveLiquidity => "removeLiquidity",
            MethodKind::RemoveLiquidityEth => "removeLiquidityETH",
            MethodKind::RemoveLiquidityEthSupportingFee => {
                "removeLiquidityETHSupportingFeeOnTransferTokens"
            }
            MethodKind::RemoveLiquidityWithPermit => "removeLiquidityWithPermit",
            MethodKind::RemoveLiquidityEthWithPermit => "removeLiquidityETHWithPermit",
            MethodKind::RemoveLiquidityEthWithPermitSupportingFee => {
                "removeLiquidityETHWithPermitSupportingFeeOnTransferTokens"
            }
        }
    }

    pub fn uses_permit(&self) -> bool {
        matches!(
            self,
            MethodKind::RemoveLiquidityWithPermit
                | MethodKind::RemoveLiquidityEthWithPermit
                | MethodKind::RemoveLiquidityEthWithPermitSupportingFee
        )
    }

    pub fn unwraps_native(&self) -> bool {
        !matches!(
            self,
            MethodKind::RemoveLiquidity | MethodKind::RemoveLiquidityWithPermit
        )
    }
}

/// 交易对两侧是否有原生币，决定走 ETH 系列还是 ERC20 系列方法。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyShape {
    Erc20,
    NativeA,
    NativeB,
}

impl CurrencyShape {
    pub fn of(currency_a: &Currency, currency_b: &Currency) -> Self {
        if currency_b.is_native() {
            CurrencyShape::NativeB
        } else if currency_a.is_native() {
            CurrencyShape::NativeA
        } else {
            CurrencyShape::Erc20
        }
    }

    pub fn is_native(&self) -> bool {
        !matches!(self, CurrencyShape::Erc20)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationKind {
    Approved,
    Permit,
}

const APPROVED_ERC20: &[MethodKind] = &[MethodKind::RemoveLiquidity];
const APPROVED_NATIVE: &[MethodKind] = &[
    MethodKind::RemoveLiquidityEth,
    MethodKind::RemoveLiquidityEthSupportingFee,
];
const PERMIT_ERC20: &[MethodKind] = &[MethodKind::RemoveLiquidityWithPermit];
const PERMIT_NATIVE: &[MethodKind] = &[
    MethodKind::RemoveLiquidityEthWithPermit,
    MethodKind::RemoveLiquidityEthWithPermitSupportingFee,
];

pub fn candidate_methods(
    authorization: AuthorizationKind,
    shape: CurrencyShape,
) -> &'static [MethodKind] {
    match (authorization, shape.is_native()) {
        (AuthorizationKind::Approved, false) => APPROVED_ERC20,
        (AuthorizationKind::Approved, true) => APPROVED_NATIVE,
        (AuthorizationKind::Permit, false) => PERMIT_ERC20,
        (AuthorizationKind::Permit, true) => PERMIT_NATIVE,
    }
}

/// 所有候选方法共享的参数，最小数量已按滑点折算。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalArgs {
    pub shape: CurrencyShape,
    pub token_a: Address,
    pub token_b: Address,
    pub liquidity: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub to: Address,
    pub deadline: U256,
}

impl RemovalArgs {
    /// ETH 系列的 `(token, amountTokenMin, amountETHMin)`，token 为非原生的一侧。
    fn native_side(&self) -> (Address, U256, U256) {
        match self.shape {
            CurrencyShape::NativeB => (self.token_a, self.amount_a_min, self.amount_b_min),
            _ => (self.token_b, self.amount_b_min, self.amount_a_min),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalCall {
    RemoveLiquidity(IDefinixRouter::removeLiquidityCall),
    RemoveLiquidityEth(IDefinixRouter::removeLiquidityETHCall),
    RemoveLiquidityEthSupportingFee(
        IDefinixRouter::removeLiquidityETHSupportingFeeOnTransferTokensCall,
    ),
    RemoveLiquidityWithPermit(IDefinixRouter::removeLiquidityWithPermitCall),
    RemoveLiquidityEthWithPermit(IDefinixRouter::removeLiquidityETHWithPermitCall),
    RemoveLiquidityEthWithPermitSupportingFee(
        IDefinixRouter::removeLiquidityETHWithPermitSupportingFeeOnTransferTokensCall,
    ),
}

impl RemovalCall {
    /// permit 方法使用签名里的 deadline，其余方法使用 `args.deadline`。
    pub fn build(
        kind: MethodKind,
        args: &RemovalArgs,
        permit: Option<&PermitSignature>,
    ) -> RemovalResult<Self> {
        if kind.unwraps_native() != args.shape.is_native() {
            return Err(RemovalError::InvalidPair(format!(
                "{} 与交易对币种不匹配",
                kind.name()
            )));
        }
        let signature = if kind.uses_permit() {
            Some(permit.ok_or(RemovalError::MissingDependency("permit signature"))?)
        } else {
            None
        };
        let (token, amount_token_min, amount_eth_min) = args.native_side();

        let call = match (kind, signature) {
            (MethodKind::RemoveLiquidity, _) => {
                RemovalCall::RemoveLiquidity(IDefinixRouter::removeLiquidityCall {
                    tokenA: args.token_a,
                    tokenB: args.token_b,
                    liquidity: args.liquidity,
                    amountAMin: args.amount_a_min,
                    amountBMin: args.amount_b_min,
                    to: args.to,
                    deadline: args.deadline,
                })
            }
            (MethodKind::RemoveLiquidityEth, _) => {
                RemovalCall::RemoveLiquidityEth(IDefinixRouter::removeLiquidityETHCall {
                    token,
                    liquidity: args.liquidity,
                    amountTokenMin: amount_token_min,
                    amountETHMin: amount_eth_min,
                    to: args.to,
                    deadline: args.deadline,
                })
            }
            (MethodKind::RemoveLiquidityEthSupportingFee, _) => {
                RemovalCall::RemoveLiquidityEthSupportingFee(
                    IDefinixRouter::removeLiquidityETHSupportingFeeOnTransferTokensCall {
                        token,
                        liquidity: args.liquidity,
                        amountTokenMin: amount_token_min,
                        amountETHMin: amount_eth_min,
                        to: args.to,
                        deadline: args.deadline,
                    },
                )
            }
            (MethodKind::RemoveLiquidityWithPermit, Some(sig)) => {
                RemovalCall::RemoveLiquidityWithPermit(
                    IDefinixRouter::removeLiquidityWithPermitCall {
                        tokenA: args.token_a,
                        tokenB: args.token_b,
                        liquidity: args.liquidity,
                        amountAMin: args.amount_a_min,
                        amountBMin: args.amount_b_min,
                        to: args.to,
                        deadline: sig.deadline,
                        approveMax: false,
                        v: sig.v,
                        r: sig.r,
                        s: sig.s,
                    },
                )
            }
            (MethodKind::RemoveLiquidityEthWithPermit, Some(sig)) => {
                RemovalCall::RemoveLiquidityEthWithPermit(
                    IDefinixRouter::removeLiquidityETHWithPermitCall {
                        token,
                        liquidity: args.liquidity,
                        amountTokenMin: amount_token_min,
                        amountETHMin: amount_eth_min,
                        to: args.to,
                        deadline: sig.deadline,
                        approveMax: false,
                        v: sig.v,
                        r: sig.r,
                        s: sig.s,
                    },
                )
            }
            (MethodKind::RemoveLiquidityEthWithPermitSupportingFee, Some(sig)) => {
                RemovalCall::RemoveLiquidityEthWithPermitSupportingFee(
                    IDefinixRouter::removeLiquidityETHWithPermitSupportingFeeOnTransferTokensCall {
                        token,
                        liquidity: args.liquidity,
                        amountTokenMin: amount_token_min,
                        amountETHMin: amount_eth_min,
                        to: args.to,
                        deadline: sig.deadline,
                        approveMax: false,
                        v: sig.v,
                        r: sig.r,
                        s: sig.s,
                    },
                )
            }
            (_, None) => return Err(RemovalError::MissingDependency("permit signature")),
        };
        Ok(call)
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            RemovalCall::RemoveLiquidity(_) => MethodKind::RemoveLiquidity,
            RemovalCall::RemoveLiquidityEth(_) => MethodKind::RemoveLiquidityEth,
            RemovalCall::RemoveLiquidityEthSupportingFee(_) => {
                MethodKind::RemoveLiquidityEthSupportingFee
            }
            RemovalCall::RemoveLiquidityWithPermit(_) => MethodKind::RemoveLiquidityWithPermit,
            RemovalCall::RemoveLiquidityEthWithPermit(_) => {
                MethodKind::RemoveLiquidityEthWithPermit
            }
            RemovalCall::RemoveLiquidityEthWithPermitSupportingFee(_) => {
                MethodKind::RemoveLiquidityEthWithPermitSupportingFee
            }
        }
    }

    pub fn calldata(&self) -> Bytes {
        let encoded = match self {
            RemovalCall::RemoveLiquidity(call) => call.abi_encode(),
            RemovalCall::RemoveLiquidityEth(call) => call.abi_encode(),
            RemovalCall::RemoveLiquidityEthSupportingFee(call) => call.abi_encode(),
            RemovalCall::RemoveLiquidityWithPermit(call) => call.abi_encode(),
            RemovalCall::RemoveLiquidityEthWithPermit(call) => call.abi_encode(),
            RemovalCall::RemoveLiquidityEthWithPermitSupportingFee(call) => call.abi_encode(),
        };
        Bytes::from(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    fn args(shape: CurrencyShape) -> RemovalArgs {
        RemovalArgs {
            shape,
            token_a: Address::repeat_byte(0x0a),
            token_b: Address::repeat_byte(0x0b),
            liquidity: U256::from(500u64),
            amount_a_min: U256::from(995u64),
            amount_b_min: U256::from(1_990u64),
            to: Address::repeat_byte(0xee),
            deadline: U256::from(1_700_000_000u64),
        }
    }

    fn signature() -> PermitSignature {
        PermitSignature {
            v: 28,
            r: B256::repeat_byte(0x11),
            s: B256::repeat_byte(0x22),
            deadline: U256::from(1_800_000_000u64),
        }
    }

    #[test]
    fn erc20_pairs_never_yield_native_methods() {
        for authorization in [AuthorizationKind::Approved, AuthorizationKind::Permit] {
            let candidates = candidate_methods(authorization, CurrencyShape::Erc20);
            assert!(!candidates.is_empty());
            assert!(candidates.iter().all(|kind| !kind.unwraps_native()));
            assert!(candidates.iter().all(|kind| !kind.name().contains("ETH")));
        }
    }

    #[test]
    fn candidate_tables_follow_priority_order() {
        assert_eq!(
            candidate_methods(AuthorizationKind::Approved, CurrencyShape::NativeA),
            &[
                MethodKind::RemoveLiquidityEth,
                MethodKind::RemoveLiquidityEthSupportingFee
            ]
        );
        assert_eq!(
            candidate_methods(AuthorizationKind::Permit, CurrencyShape::NativeB),
            &[
                MethodKind::RemoveLiquidityEthWithPermit,
                MethodKind::RemoveLiquidityEthWithPermitSupportingFee
            ]
        );
        assert!(
            candidate_methods(AuthorizationKind::Permit, CurrencyShape::Erc20)
                .iter()
                .all(MethodKind::uses_permit)
        );
    }

    #[test]
    fn remove_liquidity_calldata_carries_min_amounts() {
        let call = RemovalCall::build(
            MethodKind::RemoveLiquidity,
            &args(CurrencyShape::Erc20),
            None,
        )
        .unwrap();
        let data = call.calldata();
        assert_eq!(&data[..4], IDefinixRouter::removeLiquidityCall::SELECTOR.as_slice());

        let decoded = IDefinixRouter::removeLiquidityCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.amountAMin, U256::from(995u64));
        assert_eq!(decoded.amountBMin, U256::from(1_990u64));
        assert_eq!(decoded.deadline, U256::from(1_700_000_000u64));
        assert_eq!(call.kind(), MethodKind::RemoveLiquidity);
    }

    #[test]
    fn native_b_uses_token_a_as_token_side() {
        let call = RemovalCall::build(
            MethodKind::RemoveLiquidityEth,
            &args(CurrencyShape::NativeB),
            None,
        )
        .unwrap();
        let RemovalCall::RemoveLiquidityEth(inner) = call else {
            panic!("unexpected call variant");
        };
        assert_eq!(inner.token, Address::repeat_byte(0x0a));
        assert_eq!(inner.amountTokenMin, U256::from(995u64));
        assert_eq!(inner.amountETHMin, U256::from(1_990u64));
    }

    #[test]
    fn native_a_uses_token_b_as_token_side() {
        let call = RemovalCall::build(
            MethodKind::RemoveLiquidityEthSupportingFee,
            &args(CurrencyShape::NativeA),
            None,
        )
        .unwrap();
        let RemovalCall::RemoveLiquidityEthSupportingFee(inner) = call else {
            panic!("unexpected call variant");
        };
        assert_eq!(inner.token, Address::repeat_byte(0x0b));
        assert_eq!(inner.amountTokenMin, U256::from(1_990u64));
        assert_eq!(inner.amountETHMin, U256::from(995u64));
    }

    #[test]
    fn permit_methods_use_signature_deadline() {
        let sig = signature();
        let call = RemovalCall::build(
            MethodKind::RemoveLiquidityEthWithPermit,
            &args(CurrencyShape::NativeB),
            Some(&sig),
        )
        .unwrap();
        let RemovalCall::RemoveLiquidityEthWithPermit(inner) = call else {
            panic!("unexpected call variant");
        };
        assert_eq!(inner.deadline, sig.deadline);
        assert_eq!(inner.v, 28);
        assert!(!inner.approveMax);
        assert_eq!(inner.r, sig.r);
    }

    #[test]
    fn permit_method_without_signature_is_rejected() {
        let err = RemovalCall::build(
            MethodKind::RemoveLiquidityWithPermit,
            &args(CurrencyShape::Erc20),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, RemovalError::MissingDependency(_)));

        let err = RemovalCall::build(
            MethodKind::RemoveLiquidityEth,
            &args(CurrencyShape::Erc20),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, RemovalError::InvalidPair(_)));
    }
}
