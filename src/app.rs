use crate::config::{AppMode, Config};
use crate::fetch::{FetchErrors, FetchOutcome, FetchPlan};
use crate::format::{to_decimal, validate_amount, AmountError};
use crate::memo::{DebouncedMemo, DeepMemo, Shallow, TimerQueue};
use crate::models::{Market, PortfolioSummary, Position, Vault};
use crate::settings::Settings;
use chrono::{DateTime, Local};
use crossterm::event::KeyModifiers;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

/// Rows and positions worth less than this are dust.
pub const DUST_USD: f64 = 0.01;
const FAST_STEP: isize = 5;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub enum View {
    Markets,
    Vaults,
    Positions,
}

impl View {
    pub fn label(self) -> &'static str {
        match self {
            View::Markets => "Markets",
            View::Vaults => "Vaults",
            View::Positions => "Positions",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Supply,
    SupplyApy,
    BorrowApy,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Supply => "Total supply",
            SortKey::SupplyApy => "Supply APY",
            SortKey::BorrowApy => "Borrow APY",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortKey::Supply => SortKey::SupplyApy,
            SortKey::SupplyApy => SortKey::BorrowApy,
            SortKey::BorrowApy => SortKey::Supply,
        }
    }
}

/// Modifier keys seen on the most recent key event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl ModifierState {
    pub fn update(&mut self, modifiers: KeyModifiers) {
        self.shift = modifiers.contains(KeyModifiers::SHIFT);
        self.ctrl = modifiers.contains(KeyModifiers::CONTROL);
        self.alt = modifiers.contains(KeyModifiers::ALT);
    }

    pub fn step(&self) -> isize {
        if self.shift {
            FAST_STEP
        } else {
            1
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountSide {
    Supply,
    Borrow,
}

impl AmountSide {
    pub fn label(self) -> &'static str {
        match self {
            AmountSide::Supply => "Supply",
            AmountSide::Borrow => "Borrow",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AmountInput {
    pub market: Market,
    pub side: AmountSide,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AmountPreview {
    pub amount: BigUint,
    pub usd: Option<f64>,
    /// Interest earned (supply) or owed (borrow) over a year, in tokens.
    pub yearly_interest: f64,
    pub utilization_after: f64,
}

#[derive(Clone, Debug)]
pub enum InputMode {
    Normal,
    Search,
    Amount(AmountInput),
}

type MarketDeps = (Shallow<Vec<Market>>, String, SortKey, bool);
type VaultDeps = (Shallow<Vec<Vault>>, String, SortKey, bool);
type SummaryDeps = (Vec<Position>, Shallow<Vec<Market>>);

pub struct App {
    pub mode: AppMode,
    pub wallet: Option<String>,
    pub settings: Settings,
    settings_path: Option<PathBuf>,
    pub loading: bool,
    pub animation_frame: u32,
    pub modifiers: ModifierState,
    pub input: InputMode,
    pub search_query: String,
    pub selected: usize,
    pub markets: Shallow<Vec<Market>>,
    pub vaults: Shallow<Vec<Vault>>,
    pub positions: Vec<Position>,
    pub errors: FetchErrors,
    pub last_updated: Option<DateTime<Local>>,
    pub timers: TimerQueue,
    redraw: Arc<AtomicBool>,
    market_rows: DebouncedMemo<MarketDeps, Vec<Market>>,
    vault_rows: DebouncedMemo<VaultDeps, Vec<Vault>>,
    summary: DeepMemo<SummaryDeps, PortfolioSummary>,
}

impl App {
    pub fn new(config: &Config, settings: Settings) -> Self {
        let mut app = Self::with_parts(
            config.mode,
            config.wallet.clone(),
            settings,
            config.search_debounce(),
            TimerQueue::new(),
        );
        app.settings_path = Some(config.settings_path());
        app
    }

    /// Builds an app that never touches the settings file.
    pub fn with_parts(
        mode: AppMode,
        wallet: Option<String>,
        settings: Settings,
        debounce: Duration,
        timers: TimerQueue,
    ) -> Self {
        let markets = Shallow::new(Vec::new());
        let vaults = Shallow::new(Vec::new());
        let market_deps = (markets.clone(), String::new(), settings.sort, settings.hide_dust);
        let vault_deps = (vaults.clone(), String::new(), settings.sort, settings.hide_dust);

        let market_rows = DebouncedMemo::new(
            |deps: &MarketDeps| filter_markets(&deps.0, &deps.1, deps.2, deps.3),
            market_deps,
            debounce,
            Arc::new(timers.clone()),
        );
        let vault_rows = DebouncedMemo::new(
            |deps: &VaultDeps| filter_vaults(&deps.0, &deps.1, deps.2, deps.3),
            vault_deps,
            debounce,
            Arc::new(timers.clone()),
        );

        let redraw = Arc::new(AtomicBool::new(true));
        let flag = redraw.clone();
        market_rows.subscribe(move |_| flag.store(true, AtomicOrdering::Relaxed));
        let flag = redraw.clone();
        vault_rows.subscribe(move |_| flag.store(true, AtomicOrdering::Relaxed));

        let mut app = Self {
            mode,
            wallet,
            settings,
            settings_path: None,
            loading: false,
            animation_frame: 0,
            modifiers: ModifierState::default(),
            input: InputMode::Normal,
            search_query: String::new(),
            selected: 0,
            markets,
            vaults,
            positions: Vec::new(),
            errors: FetchErrors::default(),
            last_updated: None,
            timers,
            redraw,
            market_rows,
            vault_rows,
            summary: DeepMemo::new(),
        };
        app.ensure_view_available();
        app
    }

    pub fn available_views(&self) -> Vec<View> {
        let mut views = vec![View::Markets];
        if self.mode == AppMode::Full {
            views.push(View::Vaults);
            if self.wallet.is_some() {
                views.push(View::Positions);
            }
        }
        views
    }

    pub fn positions_visible(&self) -> bool {
        self.available_views().contains(&View::Positions)
    }

    pub fn current_view(&self) -> View {
        self.settings.view
    }

    fn ensure_view_available(&mut self) {
        if !self.available_views().contains(&self.settings.view) {
            self.settings.view = View::Markets;
        }
    }

    pub fn fetch_plan(&self) -> FetchPlan<'_> {
        FetchPlan {
            vaults: self.mode == AppMode::Full,
            wallet: match self.mode {
                AppMode::Full => self.wallet.as_deref(),
                AppMode::Lite => None,
            },
        }
    }

    pub fn move_view(&mut self, delta: isize) {
        let views = self.available_views();
        let len = views.len() as isize;
        let current_idx = views
            .iter()
            .position(|&v| v == self.settings.view)
            .unwrap_or(0) as isize;
        let next = views[(current_idx + delta).rem_euclid(len) as usize];
        if next != self.settings.view {
            self.settings.view = next;
            self.selected = 0;
            self.persist_settings();
        }
    }

    pub fn cycle_sort(&mut self) {
        self.settings.sort = self.settings.sort.next();
        self.selected = 0;
        self.persist_settings();
    }

    pub fn toggle_dust(&mut self) {
        self.settings.hide_dust = !self.settings.hide_dust;
        self.selected = 0;
        self.persist_settings();
    }

    fn persist_settings(&self) {
        if let Some(path) = &self.settings_path {
            if let Err(e) = self.settings.save(path) {
                tracing::warn!(error = %format!("{:#}", e), "failed to persist settings");
            }
        }
    }

    pub fn move_selection(&mut self, direction: isize) {
        let len = self.row_count();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let delta = direction * self.modifiers.step();
        let next = (self.selected as isize + delta).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    pub fn row_count(&self) -> usize {
        match self.settings.view {
            View::Markets => self.market_rows.with_value(Vec::len),
            View::Vaults => self.vault_rows.with_value(Vec::len),
            View::Positions => self.visible_positions().len(),
        }
    }

    pub fn start_search(&mut self) {
        self.input = InputMode::Search;
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.selected = 0;
        self.input = InputMode::Normal;
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search_query.push(ch);
        self.selected = 0;
    }

    pub fn pop_search_char(&mut self) {
        self.search_query.pop();
        self.selected = 0;
    }

    pub fn open_amount_input(&mut self) {
        if self.settings.view != View::Markets {
            return;
        }
        let rows = self.visible_markets();
        if let Some(market) = rows.get(self.selected) {
            self.input = InputMode::Amount(AmountInput {
                market: market.clone(),
                side: AmountSide::Supply,
                text: String::new(),
            });
        }
    }

    pub fn close_popup(&mut self) {
        self.input = InputMode::Normal;
    }

    pub fn amount_key(&mut self, ch: char) {
        if let InputMode::Amount(input) = &mut self.input {
            let decimals = input.market.loan_asset.decimals;
            if let Some(text) = crate::format::sanitize_amount_input(&input.text, ch, decimals) {
                input.text = text;
            }
        }
    }

    pub fn amount_backspace(&mut self) {
        if let InputMode::Amount(input) = &mut self.input {
            input.text.pop();
        }
    }

    pub fn toggle_amount_side(&mut self) {
        if let InputMode::Amount(input) = &mut self.input {
            input.side = match input.side {
                AmountSide::Supply => AmountSide::Borrow,
                AmountSide::Borrow => AmountSide::Supply,
            };
        }
    }

    pub fn amount_preview(&self) -> Option<Result<AmountPreview, AmountError>> {
        match &self.input {
            InputMode::Amount(input) => Some(preview_amount(input)),
            _ => None,
        }
    }

    pub fn start_fetch(&mut self) {
        self.loading = true;
        self.errors = FetchErrors::default();
    }

    pub fn finish_fetch(&mut self, outcome: FetchOutcome) {
        self.markets = Shallow::new(outcome.markets);
        self.vaults = Shallow::new(outcome.vaults);
        self.positions = outcome.positions;
        self.errors = outcome.errors;
        self.last_updated = Some(Local::now());
        self.loading = false;
        self.request_redraw();
    }

    /// Pulls every memo with the current dependencies. Called once per frame
    /// before drawing; the draw itself only reads.
    pub fn refresh_derived(&mut self) {
        let query = self.search_query.trim().to_lowercase();
        let sort = self.settings.sort;
        let hide_dust = self.settings.hide_dust;
        self.market_rows
            .get(&(self.markets.clone(), query.clone(), sort, hide_dust));
        self.vault_rows
            .get(&(self.vaults.clone(), query, sort, hide_dust));
        let summary_deps = (self.positions.clone(), self.markets.clone());
        self.summary.get(&summary_deps, |(positions, markets)| {
            PortfolioSummary::compute(positions, markets)
        });

        let len = self.row_count();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn visible_markets(&self) -> Vec<Market> {
        self.market_rows.value()
    }

    pub fn visible_vaults(&self) -> Vec<Vault> {
        self.vault_rows.value()
    }

    pub fn search_pending(&self) -> bool {
        self.market_rows.is_pending() || self.vault_rows.is_pending()
    }

    pub fn visible_positions(&self) -> Vec<(&Position, Option<&Market>)> {
        self.positions
            .iter()
            .map(|p| (p, self.markets.iter().find(|m| m.id == p.market_id)))
            .filter(|(p, market)| !self.settings.hide_dust || !is_dust_position(p, *market))
            .collect()
    }

    pub fn portfolio(&self) -> Option<&PortfolioSummary> {
        self.summary.peek()
    }

    pub fn request_redraw(&self) {
        self.redraw.store(true, AtomicOrdering::Relaxed);
    }

    pub fn take_redraw(&self) -> bool {
        self.redraw.swap(false, AtomicOrdering::Relaxed)
    }

    pub fn update_animation_frame(&mut self) {
        if self.loading {
            self.animation_frame = self.animation_frame.wrapping_add(1);
        } else {
            self.animation_frame = 0;
        }
    }
}

fn matches_query(query: &str, fields: &[&str]) -> bool {
    query.is_empty() || fields.iter().any(|f| f.to_lowercase().contains(query))
}

fn compare_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

pub fn filter_markets(markets: &[Market], query: &str, sort: SortKey, hide_dust: bool) -> Vec<Market> {
    let mut rows: Vec<Market> = markets
        .iter()
        .filter(|m| {
            let collateral = m
                .collateral_asset
                .as_ref()
                .map(|a| a.symbol.as_str())
                .unwrap_or("");
            matches_query(query, &[&m.id, &m.loan_asset.symbol, collateral])
        })
        .filter(|m| {
            !hide_dust
                || match m.supply_usd() {
                    Some(usd) => usd >= DUST_USD,
                    None => m.total_supply > BigUint::from(0u32),
                }
        })
        .cloned()
        .collect();
    rows.sort_by(|a, b| match sort {
        SortKey::Supply => compare_desc(
            a.supply_usd().unwrap_or(0.0),
            b.supply_usd().unwrap_or(0.0),
        ),
        SortKey::SupplyApy => compare_desc(a.supply_apy, b.supply_apy),
        SortKey::BorrowApy => compare_desc(a.borrow_apy, b.borrow_apy),
    });
    rows
}

pub fn filter_vaults(vaults: &[Vault], query: &str, sort: SortKey, hide_dust: bool) -> Vec<Vault> {
    let mut rows: Vec<Vault> = vaults
        .iter()
        .filter(|v| {
            let curator = v.curator.as_deref().unwrap_or("");
            matches_query(query, &[&v.name, &v.asset.symbol, curator, &v.address])
        })
        .filter(|v| !hide_dust || v.total_usd().map_or(true, |usd| usd >= DUST_USD))
        .cloned()
        .collect();
    rows.sort_by(|a, b| match sort {
        SortKey::Supply => compare_desc(a.total_usd().unwrap_or(0.0), b.total_usd().unwrap_or(0.0)),
        SortKey::SupplyApy | SortKey::BorrowApy => compare_desc(a.apy, b.apy),
    });
    rows
}

fn is_dust_position(position: &Position, market: Option<&Market>) -> bool {
    let Some(market) = market else {
        return false;
    };
    let loan = &market.loan_asset;
    let value = [&position.supply, &position.borrow]
        .into_iter()
        .filter_map(|amount| loan.usd_value(amount))
        .chain(
            market
                .collateral_asset
                .as_ref()
                .and_then(|c| c.usd_value(&position.collateral)),
        )
        .fold(None, |acc: Option<f64>, v| Some(acc.unwrap_or(0.0) + v));
    matches!(value, Some(v) if v < DUST_USD)
}

fn preview_amount(input: &AmountInput) -> Result<AmountPreview, AmountError> {
    let market = &input.market;
    let decimals = market.loan_asset.decimals;
    let liquidity = market.liquidity();
    let max = match input.side {
        AmountSide::Supply => None,
        AmountSide::Borrow => Some(&liquidity),
    };
    let amount = validate_amount(&input.text, decimals, max)?;

    let tokens = to_decimal(&amount, decimals);
    let supply = to_decimal(&market.total_supply, decimals);
    let borrow = to_decimal(&market.total_borrow, decimals);
    let (apy, supply_after, borrow_after) = match input.side {
        AmountSide::Supply => (market.supply_apy, supply + tokens, borrow),
        AmountSide::Borrow => (market.borrow_apy, supply, borrow + tokens),
    };
    let utilization_after = if supply_after > 0.0 {
        borrow_after / supply_after
    } else {
        0.0
    };

    Ok(AmountPreview {
        usd: market.loan_asset.usd_value(&amount),
        yearly_interest: tokens * apy,
        utilization_after,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::market;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    fn app(mode: AppMode, wallet: Option<&str>) -> App {
        App::with_parts(
            mode,
            wallet.map(str::to_string),
            Settings::default(),
            DEBOUNCE,
            TimerQueue::new(),
        )
    }

    fn loaded(markets: Vec<Market>) -> FetchOutcome {
        FetchOutcome {
            markets,
            vaults: Vec::new(),
            positions: Vec::new(),
            errors: FetchErrors::default(),
        }
    }

    #[test]
    fn views_depend_on_mode_and_wallet() {
        assert_eq!(app(AppMode::Lite, Some("0x1")).available_views(), vec![View::Markets]);
        assert_eq!(
            app(AppMode::Full, None).available_views(),
            vec![View::Markets, View::Vaults]
        );
        let mut full = app(AppMode::Full, Some("0x1"));
        full.move_view(-1);
        assert_eq!(full.current_view(), View::Positions);
        assert!(full.fetch_plan().wallet.is_some());
    }

    #[test]
    fn unavailable_saved_view_falls_back() {
        let settings = Settings {
            view: View::Positions,
            ..Settings::default()
        };
        let app = App::with_parts(AppMode::Full, None, settings, DEBOUNCE, TimerQueue::new());
        assert_eq!(app.current_view(), View::Markets);
    }

    #[test]
    fn new_data_shows_on_the_next_frame() {
        let mut app = app(AppMode::Full, None);
        app.timers.advance(DEBOUNCE);
        app.finish_fetch(loaded(vec![market("a", 5_000_000, 0, 0.01)]));
        app.refresh_derived();
        assert_eq!(app.visible_markets().len(), 1);
    }

    #[test]
    fn search_is_debounced() {
        let mut app = app(AppMode::Full, None);
        app.timers.advance(DEBOUNCE);
        app.finish_fetch(loaded(vec![
            market("alpha", 5_000_000, 0, 0.01),
            market("beta", 9_000_000, 0, 0.02),
        ]));
        app.refresh_derived();
        assert!(app.take_redraw());

        for ch in "alp".chars() {
            app.push_search_char(ch);
            app.refresh_derived();
            app.timers.advance(Duration::from_millis(20));
        }
        assert!(app.search_pending());
        assert_eq!(app.visible_markets().len(), 2);

        app.timers.advance(DEBOUNCE);
        assert!(app.take_redraw());
        let rows = app.visible_markets();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "alpha");
    }

    #[test]
    fn sorting_and_dust() {
        let markets = vec![
            market("dust", 1, 0, 0.50),
            market("low-apy", 9_000_000, 0, 0.01),
            market("high-apy", 1_000_000, 0, 0.09),
        ];
        let by_supply = filter_markets(&markets, "", SortKey::Supply, true);
        let ids: Vec<_> = by_supply.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["low-apy", "high-apy"]);

        let by_apy = filter_markets(&markets, "", SortKey::SupplyApy, false);
        assert_eq!(by_apy[0].id, "dust");
        assert_eq!(by_apy.len(), 3);
    }

    #[test]
    fn shift_moves_faster() {
        let mut app = app(AppMode::Full, None);
        app.timers.advance(DEBOUNCE);
        let markets = (0..12)
            .map(|i| market(&format!("m{i}"), 1_000_000 * (i + 1), 0, 0.01))
            .collect();
        app.finish_fetch(loaded(markets));
        app.refresh_derived();

        app.modifiers.update(KeyModifiers::SHIFT);
        app.move_selection(1);
        assert_eq!(app.selected, 5);
        app.modifiers.update(KeyModifiers::NONE);
        app.move_selection(1);
        assert_eq!(app.selected, 6);
        app.modifiers.update(KeyModifiers::SHIFT);
        app.move_selection(1);
        app.move_selection(1);
        assert_eq!(app.selected, 11);
    }

    #[test]
    fn amount_preview_for_supply_and_borrow() {
        let mut app = app(AppMode::Full, None);
        app.timers.advance(DEBOUNCE);
        // 10 USDC supplied, 5 borrowed, 10% supply APY.
        app.finish_fetch(loaded(vec![market("m", 10_000_000, 5_000_000, 0.10)]));
        app.refresh_derived();
        app.open_amount_input();
        for ch in "10".chars() {
            app.amount_key(ch);
        }

        let preview = app.amount_preview().unwrap().unwrap();
        assert_eq!(preview.amount, BigUint::from(10_000_000u32));
        assert_eq!(preview.usd, Some(10.0));
        assert_eq!(preview.yearly_interest, 1.0);
        assert_eq!(preview.utilization_after, 0.25);

        app.toggle_amount_side();
        assert_eq!(
            app.amount_preview().unwrap(),
            Err(AmountError::ExceedsBalance)
        );
        app.amount_backspace();
        let preview = app.amount_preview().unwrap().unwrap();
        assert_eq!(preview.utilization_after, 0.6);

        app.close_popup();
        assert!(app.amount_preview().is_none());
    }

    #[test]
    fn portfolio_summary_is_available_after_refresh() {
        let mut app = app(AppMode::Full, Some("0x1"));
        let mut outcome = loaded(vec![market("m", 10_000_000, 0, 0.1)]);
        outcome.positions = vec![Position {
            market_id: "m".into(),
            supply: BigUint::from(2_000_000u32),
            borrow: BigUint::from(0u32),
            collateral: BigUint::from(0u32),
        }];
        app.finish_fetch(outcome);
        app.refresh_derived();
        assert_eq!(app.portfolio().map(|s| s.supplied_usd), Some(2.0));
        assert_eq!(app.visible_positions().len(), 1);
    }
}
