//! TUI rendering for feedview using ratatui.

mod input;
mod theme;

pub use input::{InputPump, handle_events};
pub use theme::{Glyphs, Palette, glyphs, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Padding, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
};
use unicode_width::UnicodeWidthStr;

use feedview_engine::{App, Post, PostsState};
use feedview_types::sanitize_terminal_text;

/// Panel heading.
pub const HEADING: &str = "API Response";
/// Shown while the fetch is outstanding.
pub const LOADING_TEXT: &str = "Loading posts...";

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
    let options = app.ui_options();
    let palette = palette(options);
    let glyphs = glyphs(options);
    // Clear with background color
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(1),    // Response panel
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_response(frame, app, chunks[0], &palette, &glyphs);
    draw_status_bar(frame, app, chunks[1], &palette, &glyphs);
}

fn draw_response(frame: &mut Frame, app: &mut App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .style(Style::default().bg(palette.bg_panel))
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([
        Constraint::Length(1), // Heading
        Constraint::Length(1), // Spacer
        Constraint::Min(1),    // Body
    ])
    .split(inner);

    let heading = Paragraph::new(Line::from(Span::styled(HEADING, styles::heading(palette))))
        .alignment(Alignment::Center);
    frame.render_widget(heading, rows[0]);

    let body = rows[2];
    app.set_viewport_rows(usize::from(body.height));
    let app: &App = app;

    match app.state() {
        PostsState::Loading => {
            let spinner = spinner_frame(app.tick_count(), app.ui_options());
            let loading = Paragraph::new(vec![
                Line::from(""),
                Line::from(vec![
                    Span::styled(format!("{spinner} "), Style::default().fg(palette.primary)),
                    Span::styled(LOADING_TEXT, Style::default().fg(palette.badge)),
                ]),
            ])
            .alignment(Alignment::Center);
            frame.render_widget(loading, body);
        }
        PostsState::Failed(message) => {
            let message = sanitize_terminal_text(message);
            let error = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("{} Error: {message}", glyphs.error),
                    Style::default().fg(palette.error),
                )),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            frame.render_widget(error, body);
        }
        PostsState::Loaded(posts) => draw_posts(frame, posts, app.scroll(), body, palette, glyphs),
    }
}

fn draw_posts(
    frame: &mut Frame,
    posts: &[Post],
    scroll: usize,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    if posts.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No posts.",
            Style::default().fg(palette.text_muted),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(empty, area);
        return;
    }

    let visible = usize::from(area.height);
    let max_scroll = posts.len().saturating_sub(visible);
    // Leave a gutter for the scrollbar only when it is drawn.
    let list_area = if max_scroll > 0 {
        Rect {
            width: area.width.saturating_sub(2),
            ..area
        }
    } else {
        area
    };

    let id_width = posts
        .iter()
        .map(|post| post.id.to_string().len())
        .max()
        .unwrap_or(1);

    let lines: Vec<Line> = posts
        .iter()
        .skip(scroll)
        .take(visible)
        .map(|post| post_line(post, id_width, list_area.width, palette, glyphs))
        .collect();
    frame.render_widget(Paragraph::new(lines), list_area);

    if max_scroll > 0 {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some(glyphs.arrow_up))
            .end_symbol(Some(glyphs.arrow_down))
            .track_symbol(Some(glyphs.track))
            .thumb_symbol(glyphs.thumb)
            .style(Style::default().fg(palette.text_muted));

        // content_length = scrollable range, so the thumb reaches the bottom at max_scroll
        let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll.min(max_scroll));
        frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}

fn post_line(
    post: &Post,
    id_width: usize,
    width: u16,
    palette: &Palette,
    glyphs: &Glyphs,
) -> Line<'static> {
    let badge = format!(" {:>id_width$} ", post.id);
    let room = usize::from(width).saturating_sub(badge.width() + 1);
    let title = sanitize_terminal_text(&post.title).replace(['\n', '\r', '\t'], " ");
    let title = truncate_to_width(title.trim(), room, glyphs.ellipsis);

    Line::from(vec![
        Span::styled(badge, styles::post_badge(palette)),
        Span::raw(" "),
        Span::styled(title, Style::default().fg(palette.text_primary)),
    ])
}

/// Fit `raw` into `max` terminal columns, ending with `ellipsis` when cut.
fn truncate_to_width(raw: &str, max: usize, ellipsis: &str) -> String {
    if raw.width() <= max {
        return raw.to_string();
    }
    let budget = max.saturating_sub(ellipsis.width());
    let mut out = String::new();
    let mut used = 0;
    for ch in raw.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    if max >= ellipsis.width() {
        out.push_str(ellipsis);
    }
    out
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let summary = match app.state() {
        PostsState::Loading => app
            .endpoint()
            .map(|endpoint| format!("GET {}", sanitize_terminal_text(endpoint)))
            .unwrap_or_default(),
        PostsState::Failed(_) => "request failed".to_string(),
        PostsState::Loaded(posts) if posts.is_empty() => "0 posts".to_string(),
        PostsState::Loaded(posts) => {
            let first = app.scroll() + 1;
            let last = (app.scroll() + app.viewport_rows()).min(posts.len());
            format!("{first}-{last} of {} posts", posts.len())
        }
    };
    let summary_width = (summary.width() as u16 + 1).min(area.width);

    let [left, right] = Layout::horizontal([Constraint::Min(0), Constraint::Length(summary_width)])
        .areas(area);

    let hints = if let Some(notice) = app.notice() {
        Line::from(vec![Span::styled(
            format!(" {} {}", glyphs.warning, sanitize_terminal_text(notice)),
            Style::default().fg(palette.warning),
        )])
    } else {
        let sep = format!(" {} ", glyphs.separator);
        Line::from(vec![
            Span::raw(" "),
            Span::styled("q", styles::key_highlight(palette)),
            Span::styled(" quit", styles::key_hint(palette)),
            Span::styled(sep.clone(), styles::key_hint(palette)),
            Span::styled("j/k", styles::key_highlight(palette)),
            Span::styled(" scroll", styles::key_hint(palette)),
            Span::styled(sep, styles::key_hint(palette)),
            Span::styled("PgUp/PgDn", styles::key_highlight(palette)),
            Span::styled(" page", styles::key_hint(palette)),
        ])
    };
    frame.render_widget(Paragraph::new(hints), left);

    let summary = Paragraph::new(Span::styled(
        summary,
        Style::default().fg(palette.text_secondary),
    ))
    .alignment(Alignment::Right);
    frame.render_widget(summary, right);
}
