use crate::format::to_decimal;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::Deserialize;

/// Raw on-chain amounts travel as decimal strings.
mod raw_amount {
    use num_bigint::BigUint;
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let text = String::deserialize(deserializer)?;
        BigUint::parse_bytes(text.trim().as_bytes(), 10)
            .ok_or_else(|| D::Error::custom(format!("invalid raw amount: {}", text)))
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub page_info: PageInfo,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub symbol: String,
    pub decimals: u32,
    #[serde(default)]
    pub price_usd: Option<f64>,
}

impl Asset {
    pub fn usd_value(&self, amount: &BigUint) -> Option<f64> {
        self.price_usd.map(|price| to_decimal(amount, self.decimals) * price)
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MarketResponse {
    pub unique_key: String,
    pub loan_asset: Asset,
    #[serde(default)]
    pub collateral_asset: Option<Asset>,
    #[serde(with = "raw_amount")]
    pub total_supply_assets: BigUint,
    #[serde(with = "raw_amount")]
    pub total_borrow_assets: BigUint,
    #[serde(default)]
    pub supply_apy: f64,
    #[serde(default)]
    pub borrow_apy: f64,
    #[serde(with = "raw_amount")]
    pub lltv: BigUint,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VaultResponse {
    pub address: String,
    pub name: String,
    pub asset: Asset,
    #[serde(with = "raw_amount")]
    pub total_assets: BigUint,
    #[serde(default)]
    pub apy: f64,
    #[serde(default)]
    pub curator: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PositionResponse {
    pub market_key: String,
    #[serde(with = "raw_amount")]
    pub supply_assets: BigUint,
    #[serde(with = "raw_amount")]
    pub borrow_assets: BigUint,
    #[serde(with = "raw_amount")]
    pub collateral: BigUint,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Market {
    pub id: String,
    pub loan_asset: Asset,
    pub collateral_asset: Option<Asset>,
    pub total_supply: BigUint,
    pub total_borrow: BigUint,
    pub supply_apy: f64,
    pub borrow_apy: f64,
    /// Liquidation LTV scaled by 1e18.
    pub lltv: BigUint,
}

impl From<MarketResponse> for Market {
    fn from(resp: MarketResponse) -> Self {
        Self {
            id: resp.unique_key,
            loan_asset: resp.loan_asset,
            collateral_asset: resp.collateral_asset,
            total_supply: resp.total_supply_assets,
            total_borrow: resp.total_borrow_assets,
            supply_apy: resp.supply_apy,
            borrow_apy: resp.borrow_apy,
            lltv: resp.lltv,
        }
    }
}

impl Market {
    pub fn label(&self) -> String {
        match &self.collateral_asset {
            Some(collateral) => format!("{}/{}", collateral.symbol, self.loan_asset.symbol),
            None => self.loan_asset.symbol.clone(),
        }
    }

    /// Borrowed share of supplied assets, 0.0 for an empty market.
    pub fn utilization(&self) -> f64 {
        if self.total_supply.is_zero() {
            return 0.0;
        }
        let borrow = self.total_borrow.to_f64().unwrap_or(0.0);
        let supply = self.total_supply.to_f64().unwrap_or(f64::INFINITY);
        borrow / supply
    }

    pub fn liquidity(&self) -> BigUint {
        if self.total_borrow >= self.total_supply {
            BigUint::zero()
        } else {
            &self.total_supply - &self.total_borrow
        }
    }

    pub fn lltv_fraction(&self) -> f64 {
        to_decimal(&self.lltv, 18)
    }

    pub fn supply_usd(&self) -> Option<f64> {
        self.loan_asset.usd_value(&self.total_supply)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Vault {
    pub address: String,
    pub name: String,
    pub asset: Asset,
    pub total_assets: BigUint,
    pub apy: f64,
    pub curator: Option<String>,
}

impl From<VaultResponse> for Vault {
    fn from(resp: VaultResponse) -> Self {
        Self {
            address: resp.address,
            name: resp.name,
            asset: resp.asset,
            total_assets: resp.total_assets,
            apy: resp.apy,
            curator: resp.curator,
        }
    }
}

impl Vault {
    pub fn total_usd(&self) -> Option<f64> {
        self.asset.usd_value(&self.total_assets)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Position {
    pub market_id: String,
    pub supply: BigUint,
    pub borrow: BigUint,
    pub collateral: BigUint,
}

impl From<PositionResponse> for Position {
    fn from(resp: PositionResponse) -> Self {
        Self {
            market_id: resp.market_key,
            supply: resp.supply_assets,
            borrow: resp.borrow_assets,
            collateral: resp.collateral,
        }
    }
}

impl Position {
    pub fn is_empty(&self) -> bool {
        self.supply.is_zero() && self.borrow.is_zero() && self.collateral.is_zero()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PortfolioSummary {
    pub supplied_usd: f64,
    pub borrowed_usd: f64,
    pub collateral_usd: f64,
    pub positions: usize,
}

impl PortfolioSummary {
    pub fn net_usd(&self) -> f64 {
        self.supplied_usd + self.collateral_usd - self.borrowed_usd
    }

    /// Positions whose market is unknown or unpriced count but add no value.
    pub fn compute(positions: &[Position], markets: &[Market]) -> Self {
        let mut summary = Self::default();
        for position in positions.iter().filter(|p| !p.is_empty()) {
            summary.positions += 1;
            let Some(market) = markets.iter().find(|m| m.id == position.market_id) else {
                continue;
            };
            let loan = &market.loan_asset;
            summary.supplied_usd += loan.usd_value(&position.supply).unwrap_or(0.0);
            summary.borrowed_usd += loan.usd_value(&position.borrow).unwrap_or(0.0);
            if let Some(collateral) = &market.collateral_asset {
                summary.collateral_usd +=
                    collateral.usd_value(&position.collateral).unwrap_or(0.0);
            }
        }
        summary
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn asset(symbol: &str, decimals: u32, price: f64) -> Asset {
        Asset {
            symbol: symbol.to_string(),
            decimals,
            price_usd: Some(price),
        }
    }

    pub fn market(id: &str, supply: u64, borrow: u64, supply_apy: f64) -> Market {
        Market {
            id: id.to_string(),
            loan_asset: asset("USDC", 6, 1.0),
            collateral_asset: Some(asset("WETH", 18, 2_000.0)),
            total_supply: BigUint::from(supply),
            total_borrow: BigUint::from(borrow),
            supply_apy,
            borrow_apy: supply_apy * 1.5,
            lltv: BigUint::from(860_000_000_000_000_000u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn market_from_wire() {
        let json = serde_json::json!({
            "uniqueKey": "0xabc",
            "loanAsset": { "symbol": "USDC", "decimals": 6, "priceUsd": 1.0 },
            "collateralAsset": { "symbol": "WETH", "decimals": 18 },
            "totalSupplyAssets": "1000000000000",
            "totalBorrowAssets": "250000000000",
            "supplyApy": 0.031,
            "borrowApy": 0.052,
            "lltv": "860000000000000000"
        });
        let market: Market = serde_json::from_value::<MarketResponse>(json).unwrap().into();

        assert_eq!(market.label(), "WETH/USDC");
        assert_eq!(market.utilization(), 0.25);
        assert_eq!(market.liquidity(), BigUint::from(750_000_000_000u64));
        assert_eq!(market.lltv_fraction(), 0.86);
        assert_eq!(market.supply_usd(), Some(1_000_000.0));
        assert_eq!(market.collateral_asset.unwrap().price_usd, None);
    }

    #[test]
    fn rejects_non_numeric_amounts() {
        let json = serde_json::json!({
            "address": "0x1",
            "name": "Steakhouse USDC",
            "asset": { "symbol": "USDC", "decimals": 6 },
            "totalAssets": "12.5"
        });
        assert!(serde_json::from_value::<VaultResponse>(json).is_err());
    }

    #[test]
    fn portfolio_summary_prices_each_leg() {
        let markets = vec![market("m1", 0, 0, 0.05)];
        let positions = vec![
            Position {
                market_id: "m1".into(),
                supply: BigUint::from(1_500_000u64),
                borrow: BigUint::from(500_000u64),
                collateral: BigUint::from(1_000_000_000_000_000_000u64),
            },
            Position {
                market_id: "unknown".into(),
                supply: BigUint::from(1u32),
                borrow: BigUint::zero(),
                collateral: BigUint::zero(),
            },
            Position {
                market_id: "m1".into(),
                supply: BigUint::zero(),
                borrow: BigUint::zero(),
                collateral: BigUint::zero(),
            },
        ];

        let summary = PortfolioSummary::compute(&positions, &markets);
        assert_eq!(summary.positions, 2);
        assert_eq!(summary.supplied_usd, 1.5);
        assert_eq!(summary.borrowed_usd, 0.5);
        assert_eq!(summary.collateral_usd, 2_000.0);
        assert_eq!(summary.net_usd(), 2_001.0);
    }
}
