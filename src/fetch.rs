use crate::api::indexer::IndexerClient;
use crate::models::{Market, Position, Vault};
use anyhow::Result;

#[derive(Default, Clone, Debug, PartialEq)]
pub struct FetchErrors {
    pub markets: Option<String>,
    pub vaults: Option<String>,
    pub positions: Option<String>,
}

impl FetchErrors {
    pub fn is_empty(&self) -> bool {
        self.markets.is_none() && self.vaults.is_none() && self.positions.is_none()
    }
}

pub struct FetchOutcome {
    pub markets: Vec<Market>,
    pub vaults: Vec<Vault>,
    pub positions: Vec<Position>,
    pub errors: FetchErrors,
}

/// What to request on a refresh.
#[derive(Clone, Copy, Debug)]
pub struct FetchPlan<'a> {
    pub vaults: bool,
    pub wallet: Option<&'a str>,
}

fn append_error(target: &mut Option<String>, message: String) {
    if let Some(existing) = target.take() {
        *target = Some(format!("{}; {}", existing, message));
    } else {
        *target = Some(message);
    }
}

pub async fn fetch_data(client: &IndexerClient, plan: FetchPlan<'_>) -> FetchOutcome {
    tracing::info!(vaults = plan.vaults, wallet = ?plan.wallet, "refreshing data");

    let vaults_fut = async {
        if plan.vaults {
            client.fetch_vaults().await.map(Some)
        } else {
            Ok(None)
        }
    };
    let positions_fut = async {
        match plan.wallet {
            Some(wallet) => client.fetch_positions(wallet).await.map(Some),
            None => Ok(None),
        }
    };
    let (markets_result, vaults_result, positions_result) =
        tokio::join!(client.fetch_markets(), vaults_fut, positions_fut);

    let outcome = assemble(
        markets_result.map(|items| items.into_iter().map(Market::from).collect()),
        vaults_result.map(|items| {
            items
                .map(|v| v.into_iter().map(Vault::from).collect())
                .unwrap_or_default()
        }),
        positions_result.map(|items| {
            items
                .map(|p| p.into_iter().map(Position::from).collect())
                .unwrap_or_default()
        }),
    );
    if outcome.errors.is_empty() {
        tracing::info!(
            markets = outcome.markets.len(),
            vaults = outcome.vaults.len(),
            positions = outcome.positions.len(),
            "refresh complete"
        );
    } else {
        tracing::warn!(errors = ?outcome.errors, "refresh finished with errors");
    }
    outcome
}

/// Orders every data set and records failures without discarding the
/// sets that did load.
fn assemble(
    markets: Result<Vec<Market>>,
    vaults: Result<Vec<Vault>>,
    positions: Result<Vec<Position>>,
) -> FetchOutcome {
    let mut errors = FetchErrors::default();

    let mut markets = markets.unwrap_or_else(|e| {
        append_error(&mut errors.markets, format!("Markets fetch failed: {:#}", e));
        Vec::new()
    });
    markets.sort_by(|a, b| b.total_supply.cmp(&a.total_supply));

    let mut vaults = vaults.unwrap_or_else(|e| {
        append_error(&mut errors.vaults, format!("Vaults fetch failed: {:#}", e));
        Vec::new()
    });
    vaults.sort_by(|a, b| a.name.cmp(&b.name));

    let mut positions = positions.unwrap_or_else(|e| {
        append_error(&mut errors.positions, format!("Positions fetch failed: {:#}", e));
        Vec::new()
    });
    positions.retain(|p| !p.is_empty());
    // Without the market list every position would look orphaned.
    if errors.markets.is_none()
        && positions.iter().any(|p| !markets.iter().any(|m| m.id == p.market_id))
    {
        append_error(
            &mut errors.positions,
            "Some positions reference unknown markets".to_string(),
        );
    }
    positions.sort_by(|a, b| a.market_id.cmp(&b.market_id));

    FetchOutcome {
        markets,
        vaults,
        positions,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::market;
    use num_bigint::BigUint;
    use num_traits::Zero;

    fn position(market_id: &str, supply: u64) -> Position {
        Position {
            market_id: market_id.to_string(),
            supply: BigUint::from(supply),
            borrow: BigUint::zero(),
            collateral: BigUint::zero(),
        }
    }

    #[test]
    fn keeps_successful_sets_when_one_fails() {
        let outcome = assemble(
            Ok(vec![market("small", 10, 0, 0.01), market("big", 1_000, 0, 0.02)]),
            Err(anyhow::anyhow!("503 Service Unavailable")),
            Ok(vec![position("big", 5), position("small", 0)]),
        );

        assert_eq!(outcome.markets[0].id, "big");
        assert!(outcome.vaults.is_empty());
        assert_eq!(outcome.positions.len(), 1);
        assert_eq!(
            outcome.errors.vaults.as_deref(),
            Some("Vaults fetch failed: 503 Service Unavailable")
        );
        assert!(outcome.errors.markets.is_none());
    }

    #[test]
    fn flags_orphan_positions() {
        let outcome = assemble(Ok(vec![]), Ok(vec![]), Ok(vec![position("gone", 1)]));
        assert_eq!(
            outcome.errors.positions.as_deref(),
            Some("Some positions reference unknown markets")
        );
    }

    #[test]
    fn failed_markets_do_not_orphan_positions() {
        let outcome = assemble(
            Err(anyhow::anyhow!("timeout")),
            Ok(vec![]),
            Ok(vec![position("big", 5)]),
        );
        assert_eq!(
            outcome.errors.markets.as_deref(),
            Some("Markets fetch failed: timeout")
        );
        assert_eq!(outcome.positions.len(), 1);
        assert!(outcome.errors.positions.is_none());
    }

    #[test]
    fn errors_accumulate() {
        let mut target = None;
        append_error(&mut target, "a".into());
        append_error(&mut target, "b".into());
        assert_eq!(target.as_deref(), Some("a; b"));
    }
}
