use crate::app::{App, View};
use crate::format::{format_balance, format_percent, format_usd};
use crate::models::{Market, Position, Vault};
use crate::ui::colors::ColorPalette;
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let palette = ColorPalette::for_mode(app.mode);
    let view = app.current_view();
    let title = format!("{} ({})", view.label(), app.row_count());
    let block = Block::default().borders(Borders::ALL).title(title);

    if let Some(error) = error_for_view(app, view) {
        f.render_widget(
            Paragraph::new(error.to_string())
                .style(Style::default().fg(palette.error))
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let (header, widths, rows) = match view {
        View::Markets => market_table(&app.visible_markets()),
        View::Vaults => vault_table(&app.visible_vaults()),
        View::Positions => position_table(&app.visible_positions()),
    };

    if rows.is_empty() {
        let message = if app.loading {
            "Fetching data..."
        } else if !app.search_query.is_empty() {
            "No rows match the search"
        } else {
            "Nothing to show"
        };
        f.render_widget(
            Paragraph::new(Line::from(message))
                .style(Style::default().fg(palette.muted))
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let table = Table::new(rows, widths)
        .header(
            Row::new(header)
                .style(
                    Style::default()
                        .fg(palette.primary)
                        .add_modifier(Modifier::BOLD),
                )
                .bottom_margin(1),
        )
        .block(block)
        .highlight_style(
            Style::default()
                .fg(palette.selected_fg)
                .bg(palette.selected_bg),
        )
        .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(table, area, &mut state);
}

fn error_for_view(app: &App, view: View) -> Option<&String> {
    match view {
        View::Markets => app.errors.markets.as_ref(),
        View::Vaults => app.errors.vaults.as_ref(),
        View::Positions => app.errors.positions.as_ref(),
    }
}

type TableParts = (Vec<&'static str>, Vec<Constraint>, Vec<Row<'static>>);

fn usd_cell(value: Option<f64>) -> Cell<'static> {
    Cell::from(value.map(format_usd).unwrap_or_else(|| "-".to_string()))
}

fn market_table(markets: &[Market]) -> TableParts {
    let header = vec![
        "Market", "Supply", "Supply $", "Borrow", "Liquidity", "Util", "Supply APY",
        "Borrow APY", "LLTV",
    ];
    let widths = vec![
        Constraint::Percentage(16),
        Constraint::Percentage(11),
        Constraint::Percentage(11),
        Constraint::Percentage(11),
        Constraint::Percentage(11),
        Constraint::Percentage(8),
        Constraint::Percentage(11),
        Constraint::Percentage(11),
        Constraint::Percentage(8),
    ];
    let rows = markets
        .iter()
        .map(|m| {
            let decimals = m.loan_asset.decimals;
            let symbol = &m.loan_asset.symbol;
            Row::new(vec![
                Cell::from(m.label()),
                Cell::from(format!("{} {}", format_balance(&m.total_supply, decimals), symbol)),
                usd_cell(m.supply_usd()),
                Cell::from(format!("{} {}", format_balance(&m.total_borrow, decimals), symbol)),
                Cell::from(format!("{} {}", format_balance(&m.liquidity(), decimals), symbol)),
                Cell::from(format_percent(m.utilization())),
                Cell::from(format_percent(m.supply_apy)),
                Cell::from(format_percent(m.borrow_apy)),
                Cell::from(format_percent(m.lltv_fraction())),
            ])
        })
        .collect();
    (header, widths, rows)
}

fn vault_table(vaults: &[Vault]) -> TableParts {
    let header = vec!["Vault", "Asset", "Total assets", "Total $", "APY", "Curator"];
    let widths = vec![
        Constraint::Percentage(28),
        Constraint::Percentage(10),
        Constraint::Percentage(16),
        Constraint::Percentage(14),
        Constraint::Percentage(10),
        Constraint::Percentage(22),
    ];
    let rows = vaults
        .iter()
        .map(|v| {
            Row::new(vec![
                Cell::from(v.name.clone()),
                Cell::from(v.asset.symbol.clone()),
                Cell::from(format_balance(&v.total_assets, v.asset.decimals)),
                usd_cell(v.total_usd()),
                Cell::from(format_percent(v.apy)),
                Cell::from(v.curator.clone().unwrap_or_else(|| "-".to_string())),
            ])
        })
        .collect();
    (header, widths, rows)
}

fn position_table(positions: &[(&Position, Option<&Market>)]) -> TableParts {
    let header = vec!["Market", "Supplied", "Borrowed", "Collateral", "Net APY"];
    let widths = vec![
        Constraint::Percentage(24),
        Constraint::Percentage(19),
        Constraint::Percentage(19),
        Constraint::Percentage(19),
        Constraint::Percentage(19),
    ];
    let rows = positions
        .iter()
        .map(|(position, market)| match market {
            Some(market) => {
                let loan = &market.loan_asset;
                let collateral = match &market.collateral_asset {
                    Some(asset) => format!(
                        "{} {}",
                        format_balance(&position.collateral, asset.decimals),
                        asset.symbol
                    ),
                    None => "-".to_string(),
                };
                Row::new(vec![
                    Cell::from(market.label()),
                    Cell::from(format!(
                        "{} {}",
                        format_balance(&position.supply, loan.decimals),
                        loan.symbol
                    )),
                    Cell::from(format!(
                        "{} {}",
                        format_balance(&position.borrow, loan.decimals),
                        loan.symbol
                    )),
                    Cell::from(collateral),
                    Cell::from(net_apy(position, market)),
                ])
            }
            None => Row::new(vec![
                Cell::from(position.market_id.clone()),
                Cell::from(position.supply.to_string()),
                Cell::from(position.borrow.to_string()),
                Cell::from(position.collateral.to_string()),
                Cell::from("-"),
            ]),
        })
        .collect();
    (header, widths, rows)
}

/// Supply yield minus borrow cost, relative to the supplied leg.
fn net_apy(position: &Position, market: &Market) -> String {
    let decimals = market.loan_asset.decimals;
    let supplied = crate::format::to_decimal(&position.supply, decimals);
    let borrowed = crate::format::to_decimal(&position.borrow, decimals);
    if supplied <= 0.0 {
        return if borrowed > 0.0 {
            format!("-{}", format_percent(market.borrow_apy))
        } else {
            "-".to_string()
        };
    }
    let earned = supplied * market.supply_apy - borrowed * market.borrow_apy;
    format_percent(earned / supplied)
}
