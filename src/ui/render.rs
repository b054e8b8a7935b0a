use crate::app::App;
use crate::ui::{footer, header, popup, table};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    let vertical_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    // Top panel: view tabs on the left, portfolio summary on the right
    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(vertical_chunks[0]);
    header::render_tabs(f, app, top_chunks[0]);
    header::render_summary(f, app, top_chunks[1]);

    table::render(f, app, vertical_chunks[1]);
    footer::render(f, app, vertical_chunks[2]);

    popup::render(f, app);
}
