use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::liquidity::{BurnField, CurrencyId};

#[derive(Parser, Debug)]
#[command(name = "lpburn", version, about = "DEX 流动性移除工具")]
pub struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径（默认查找 lpburn.toml 或 config/lpburn.toml）"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 查看交易对储备与当前账户的 LP 仓位
    Position(PairArgs),
    /// 授权并移除流动性
    Remove(RemoveCmd),
    /// 初始化配置模版文件
    Init(InitCmd),
}

#[derive(Args, Debug, Clone)]
pub struct PairArgs {
    #[arg(
        long,
        value_name = "TOKEN",
        help = "A 侧代币地址，原生币可写 ETH / BNB / NATIVE"
    )]
    pub token_a: CurrencyId,
    #[arg(
        long,
        value_name = "TOKEN",
        help = "B 侧代币地址，原生币可写 ETH / BNB / NATIVE"
    )]
    pub token_b: CurrencyId,
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("amount")
        .required(true)
        .multiple(false)
        .args(["percent", "liquidity", "amount_a", "amount_b"])
))]
pub struct RemoveCmd {
    #[command(flatten)]
    pub pair: PairArgs,
    #[arg(
        long,
        value_name = "PERCENT",
        value_parser = clap::value_parser!(u8).range(1..=100),
        help = "移除当前 LP 余额的百分比（1-100）"
    )]
    pub percent: Option<u8>,
    #[arg(long, value_name = "AMOUNT", help = "移除的 LP 数量（按 18 位精度解析）")]
    pub liquidity: Option<String>,
    #[arg(long, value_name = "AMOUNT", help = "期望取回的 A 侧数量，按 A 的精度解析")]
    pub amount_a: Option<String>,
    #[arg(long, value_name = "AMOUNT", help = "期望取回的 B 侧数量，按 B 的精度解析")]
    pub amount_b: Option<String>,
    #[arg(long, value_name = "BPS", help = "覆盖配置中的滑点（基点）")]
    pub slippage_bps: Option<u16>,
    #[arg(long, value_name = "SECS", help = "覆盖配置中的交易截止时间（秒）")]
    pub deadline_secs: Option<u64>,
    #[arg(long, help = "不请求 permit 签名，直接走链上授权")]
    pub no_permit: bool,
    #[arg(long, help = "只完成链上授权，不提交移除交易")]
    pub approve_only: bool,
}

impl RemoveCmd {
    /// 四个数量参数互斥，返回被填写的那一个。
    pub fn burn_input(&self) -> Option<(BurnField, String)> {
        if let Some(percent) = self.percent {
            return Some((BurnField::LiquidityPercent, percent.to_string()));
        }
        [
            (BurnField::Liquidity, &self.liquidity),
            (BurnField::CurrencyA, &self.amount_a),
            (BurnField::CurrencyB, &self.amount_b),
        ]
        .into_iter()
        .find_map(|(field, value)| value.clone().map(|value| (field, value)))
    }
}

#[derive(Args, Debug)]
pub struct InitCmd {
    #[arg(long, value_name = "DIR", help = "可选输出目录（默认当前目录）")]
    pub output: Option<PathBuf>,
    #[arg(long, help = "若文件存在则覆盖")]
    pub force: bool,
}
