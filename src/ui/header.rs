use crate::app::App;
use crate::format::format_usd;
use crate::ui::colors::ColorPalette;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let palette = ColorPalette::for_mode(app.mode);

    let mut tabs = Vec::new();
    for view in app.available_views() {
        let style = if view == app.current_view() {
            Style::default()
                .fg(palette.primary)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        tabs.push(Span::styled(format!(" {} ", view.label()), style));
        tabs.push(Span::raw(" "));
    }

    let status = if app.loading {
        let frame = SPINNER[app.animation_frame as usize % SPINNER.len()];
        Span::styled(format!("{} loading", frame), Style::default().fg(palette.accent))
    } else if let Some(updated) = app.last_updated {
        Span::styled(
            format!("updated {}", updated.format("%H:%M:%S")),
            Style::default().fg(palette.muted),
        )
    } else {
        Span::raw("")
    };

    let mut options = vec![
        Span::raw("Sort: "),
        Span::styled(app.settings.sort.label(), Style::default().fg(palette.accent)),
        Span::raw("  Dust: "),
        Span::styled(
            if app.settings.hide_dust { "hidden" } else { "shown" },
            Style::default().fg(palette.accent),
        ),
    ];
    if !app.search_query.is_empty() {
        options.push(Span::raw("  Search: "));
        options.push(Span::styled(
            app.search_query.clone(),
            Style::default().fg(palette.primary),
        ));
        if app.search_pending() {
            options.push(Span::styled(" …", Style::default().fg(palette.muted)));
        }
    }

    f.render_widget(
        Paragraph::new(vec![Line::from(tabs), Line::from(options), Line::from(status)])
            .block(Block::default().borders(Borders::ALL).title("View")),
        area,
    );
}

pub fn render_summary(f: &mut Frame, app: &App, area: Rect) {
    let palette = ColorPalette::for_mode(app.mode);
    let label_style = Style::default().fg(Color::Gray);

    let lines = match (app.wallet.as_deref(), app.portfolio()) {
        (Some(wallet), Some(summary)) if app.positions_visible() => vec![
            Line::from(vec![
                Span::styled("Wallet: ", label_style),
                Span::raw(short_address(wallet)),
                Span::styled("  Positions: ", label_style),
                Span::raw(summary.positions.to_string()),
            ]),
            Line::from(vec![
                Span::styled("Supplied: ", label_style),
                Span::styled(
                    format_usd(summary.supplied_usd),
                    Style::default().fg(palette.positive),
                ),
                Span::styled("  Collateral: ", label_style),
                Span::raw(format_usd(summary.collateral_usd)),
                Span::styled("  Borrowed: ", label_style),
                Span::styled(
                    format_usd(summary.borrowed_usd),
                    Style::default().fg(palette.error),
                ),
            ]),
            Line::from(vec![
                Span::styled("Net: ", label_style),
                Span::styled(
                    format_usd(summary.net_usd()),
                    Style::default()
                        .fg(palette.primary)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        ],
        _ => vec![
            Line::from(vec![
                Span::styled("Markets: ", label_style),
                Span::raw(app.markets.len().to_string()),
                Span::styled("  Vaults: ", label_style),
                Span::raw(app.vaults.len().to_string()),
            ]),
            Line::from(Span::styled(
                "Set LENDTOP_WALLET to track positions",
                Style::default().fg(palette.muted),
            )),
        ],
    };

    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Portfolio")),
        area,
    );
}

fn short_address(address: &str) -> String {
    let len = address.chars().count();
    if len <= 12 {
        return address.to_string();
    }
    let head: String = address.chars().take(6).collect();
    let tail: String = address.chars().skip(len - 4).collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortens_long_addresses() {
        assert_eq!(
            short_address("0x1234567890abcdef1234567890abcdef12345678"),
            "0x1234…5678"
        );
        assert_eq!(short_address("vitalik.eth"), "vitalik.eth");
        assert_eq!(short_address("aaaaaéwallet.eth"), "aaaaaé….eth");
        assert_eq!(short_address("ééééééééééé"), "ééééééééééé");
    }
}
