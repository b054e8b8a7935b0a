use crate::app::{AmountInput, AmountSide, App, InputMode};
use crate::format::balance::format_magnitude;
use crate::format::{format_balance, format_percent, format_usd};
use crate::ui::colors::ColorPalette;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    let area = f.size();
    let palette = ColorPalette::for_mode(app.mode);

    if let InputMode::Amount(input) = &app.input {
        render_amount_popup(f, app, area, input, &palette);
    } else if app.loading && app.markets.is_empty() {
        render_loading_popup(f, area, &palette);
    }
}

fn create_centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn create_popup_block(title: &str, primary_color: Color) -> Block {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(primary_color))
        .title(title)
        .title_style(
            Style::default()
                .fg(primary_color)
                .add_modifier(Modifier::BOLD),
        )
}

fn render_loading_popup(f: &mut Frame, area: Rect, palette: &ColorPalette) {
    let popup_area = create_centered_popup(area, 40, 5);
    let block = create_popup_block(" Loading ", palette.primary);
    let inner = block.inner(popup_area);

    f.render_widget(Clear, popup_area);
    f.render_widget(block, popup_area);
    f.render_widget(
        Paragraph::new("Fetching markets...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White)),
        inner,
    );
}

fn render_amount_popup(
    f: &mut Frame,
    app: &App,
    area: Rect,
    input: &AmountInput,
    palette: &ColorPalette,
) {
    let market = &input.market;
    let loan = &market.loan_asset;
    let popup_area = create_centered_popup(area, 64, 12);
    let title = format!(" {} {} ", input.side.label(), market.label());
    let block = create_popup_block(&title, palette.primary);
    let inner = block.inner(popup_area);

    let label_style = Style::default().fg(Color::Gray);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Amount: ", label_style),
            Span::styled(
                format!("{}_ {}", input.text, loan.symbol),
                Style::default()
                    .fg(palette.primary)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Available liquidity: ", label_style),
            Span::raw(format!(
                "{} {}",
                format_balance(&market.liquidity(), loan.decimals),
                loan.symbol
            )),
        ]),
        Line::from(""),
    ];

    match app.amount_preview() {
        Some(Ok(preview)) => {
            lines.push(Line::from(vec![
                Span::styled("You enter: ", label_style),
                Span::raw(format!(
                    "{} {} ({})",
                    format_balance(&preview.amount, loan.decimals),
                    loan.symbol,
                    preview.usd.map(format_usd).unwrap_or_else(|| "unpriced".to_string())
                )),
            ]));
            let interest_label = match input.side {
                AmountSide::Supply => "Yearly interest earned: ",
                AmountSide::Borrow => "Yearly interest owed: ",
            };
            lines.push(Line::from(vec![
                Span::styled(interest_label, label_style),
                Span::raw(format!(
                    "{} {}",
                    format_magnitude(preview.yearly_interest),
                    loan.symbol
                )),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Utilization: ", label_style),
                Span::raw(format!(
                    "{} -> {}",
                    format_percent(market.utilization()),
                    format_percent(preview.utilization_after)
                )),
            ]));
        }
        Some(Err(e)) => {
            lines.push(Line::from(Span::styled(
                e.to_string(),
                Style::default().fg(palette.error),
            )));
        }
        None => {}
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "Price: {}",
            loan.price_usd
                .map(format_usd)
                .unwrap_or_else(|| "-".to_string())
        ),
        Style::default().fg(palette.muted),
    )));

    f.render_widget(Clear, popup_area);
    f.render_widget(block, popup_area);
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Left), inner);
}
