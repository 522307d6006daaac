use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, B256, keccak256};

/// 原生币统一按 18 位精度处理。
pub const NATIVE_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Currency {
    Native { symbol: String },
    Token(Token),
}

impl Currency {
    pub fn is_native(&self) -> bool {
        matches!(self, Currency::Native { .. })
    }

    pub fn symbol(&self) -> &str {
        match self {
            Currency::Native { symbol } => symbol,
            Currency::Token(token) => &token.symbol,
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            Currency::Native { .. } => NATIVE_DECIMALS,
            Currency::Token(token) => token.decimals,
        }
    }

    /// 原生币映射为包装代币，其余原样返回。
    pub fn wrapped(&self, wrapped_native: &Token) -> Token {
        match self {
            Currency::Native { .. } => wrapped_native.clone(),
            Currency::Token(token) => token.clone(),
        }
    }
}

/// 命令行中的币种标识：合约地址或原生币关键字。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyId {
    Native,
    Token(Address),
}

impl CurrencyId {
    pub fn is_native(&self) -> bool {
        matches!(self, CurrencyId::Native)
    }

    pub fn wrapped_address(&self, wrapped_native: Address) -> Address {
        match self {
            CurrencyId::Native => wrapped_native,
            CurrencyId::Token(address) => *address,
        }
    }
}

impl FromStr for CurrencyId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if ["ETH", "BNB", "KLAY", "NATIVE"]
            .iter()
            .any(|keyword| trimmed.eq_ignore_ascii_case(keyword))
        {
            return Ok(CurrencyId::Native);
        }
        Address::from_str(trimmed)
            .map(CurrencyId::Token)
            .map_err(|err| format!("币种标识无效 {trimmed}: {err}"))
    }
}

impl fmt::Display for CurrencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrencyId::Native => write!(f, "NATIVE"),
            CurrencyId::Token(address) => write!(f, "{address}"),
        }
    }
}

pub fn sort_tokens(a: Address, b: Address) -> (Address, Address) {
    if a < b { (a, b) } else { (b, a) }
}

/// 通过 CREATE2 推导交易对地址，salt 为 `keccak256(token0 ++ token1)`。
pub fn pair_address(factory: Address, init_code_hash: B256, a: Address, b: Address) -> Address {
    let (token0, token1) = sort_tokens(a, b);
    let mut packed = [0u8; 40];
    packed[..20].copy_from_slice(token0.as_slice());
    packed[20..].copy_from_slice(token1.as_slice());
    factory.create2(keccak256(packed), init_code_hash)
}
