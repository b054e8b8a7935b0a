use crate::app::{App, InputMode};
use crate::ui::colors::ColorPalette;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let palette = ColorPalette::for_mode(app.mode);
    let key = |label: &'static str| Span::styled(label, Style::default().fg(palette.accent));

    let spans = match app.input {
        InputMode::Search => vec![
            Span::raw("Search: "),
            Span::styled(
                format!("{}_", app.search_query),
                Style::default().fg(palette.primary),
            ),
            Span::raw(" | "),
            key("Enter"),
            Span::raw("=keep "),
            key("Esc"),
            Span::raw("=clear"),
        ],
        InputMode::Amount(_) => vec![
            key("0-9 ."),
            Span::raw("=amount | "),
            key("Tab"),
            Span::raw("=supply/borrow | "),
            key("Esc"),
            Span::raw("=close"),
        ],
        InputMode::Normal => {
            let mut spans = vec![
                Span::raw("Commands: "),
                key("←/→"),
                Span::raw("=view "),
                Span::raw("| "),
                key("↑/↓"),
                Span::raw(if app.modifiers.shift {
                    "=move x5 "
                } else {
                    "=move (shift x5) "
                }),
                Span::raw("| "),
                key("/"),
                Span::raw("=search "),
                Span::raw("| "),
                key("s"),
                Span::raw("=sort "),
                Span::raw("| "),
                key("h"),
                Span::raw("=dust "),
            ];
            if app.current_view() == crate::app::View::Markets {
                spans.push(Span::raw("| "));
                spans.push(key("Enter"));
                spans.push(Span::raw("=simulate "));
            }
            spans.push(Span::raw("| "));
            spans.push(Span::styled("r", Style::default().fg(palette.primary)));
            spans.push(Span::raw("=refresh "));
            spans.push(Span::raw("| "));
            spans.push(Span::styled("q", Style::default().fg(palette.error)));
            spans.push(Span::raw("=quit"));
            spans
        }
    };

    f.render_widget(
        Paragraph::new(vec![Line::from(spans)])
            .block(Block::default().borders(Borders::ALL))
            .alignment(ratatui::layout::Alignment::Center),
        area,
    );
}
