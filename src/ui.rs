//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::{App, FORM_LABELS, TrackForm};
use crate::audio::AudioBackend;
use crate::config::Settings;
use crate::library::{Catalog, display_from_fields, format_time, genre_label, reference_kind};

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("enter".to_string(), "play selected song".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("h/l".to_string(), "prev/next song".to_string());
    // H/L is filled dynamically from config.
    map.insert("-/+".to_string(), "volume".to_string());
    map.insert("/".to_string(), "search".to_string());
    map.insert("g".to_string(), "genre".to_string());
    map.insert("a/e/d".to_string(), "add/edit/delete".to_string());
    map.insert("x".to_string(), "dismiss error".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "-/+", "/", "g", "a/e/d", "x", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn left_pad() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

/// Long references (inline uploads) are summarised instead of printed.
fn reference_text(uri: &str) -> String {
    match reference_kind(uri) {
        "embedded" => "(embedded data)".to_string(),
        _ => uri.to_string(),
    }
}

/// The text of the search/genre status box.
fn status_text<C: Catalog, B: AudioBackend>(app: &App<C, B>) -> String {
    let mut parts: Vec<String> = Vec::new();

    let q = app.filter.search.trim();
    if app.search_mode || !q.is_empty() {
        let mut search = String::from("SEARCH:");
        if !q.is_empty() {
            search.push(' ');
            search.push_str(q);
        }
        if app.search_mode {
            search.push('_');
        }
        parts.push(search);
    }

    parts.push(format!("GENRE: {}", genre_label(&app.filter.genre)));
    parts.push(format!("{} of {} songs", app.view().len(), app.tracks.len()));

    parts.join(" • ")
}

/// The now-playing line: track text, time, state and volume.
fn player_text<C: Catalog, B: AudioBackend>(app: &App<C, B>, settings: &Settings) -> String {
    let state = app.playback();
    let volume = format!("Vol: {:.0}%", state.volume * 100.0);

    let Some(track) = &state.current else {
        return format!("Nothing playing • {volume}");
    };

    let song = display_from_fields(
        track,
        &settings.ui.now_playing_track_fields,
        &settings.ui.now_playing_track_separator,
    );
    let total = state.duration.map(format_time).unwrap_or_else(|| "-:--".to_string());
    let playing = if state.playing { "Playing" } else { "Paused" };

    format!(
        "Song: {} [{}/{}] • {} • {}",
        song,
        format_time(state.position),
        total,
        playing,
        volume
    )
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw<C: Catalog, B: AudioBackend>(frame: &mut Frame, app: &App<C, B>, settings: &Settings) {
    let error = app.playback().error.as_ref();
    let player_height = if error.is_some() { 5 } else { 4 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(player_height),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(settings.ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" sonicloud ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status = Paragraph::new(status_text(app))
        .block(Block::bordered().padding(left_pad()).title(" library "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    // Main list
    {
        let view = app.view();
        let current_id = app.playback().current_id();

        // Only build ListItems for the visible window.
        let total = view.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = view[start..end]
            .iter()
            .map(|track| {
                let marker = if current_id == Some(&track.id) { "♪ " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::raw(marker),
                    Span::raw(track.display()),
                    Span::styled(format!("  [{}]", track.genre), Style::default().dim()),
                ]))
            })
            .collect();

        let title = if total == 0 && !app.tracks.is_empty() {
            " songs (no matches) "
        } else {
            " songs "
        };
        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Player bar
    {
        let mut lines = vec![Line::from(player_text(app, settings))];
        if let Some(err) = error {
            lines.push(Line::from(Span::styled(
                format!(
                    "Error: {}. The Loading might have failed or file format is unsupported. [x] dismiss",
                    err.message
                ),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }
        let player = Paragraph::new(lines)
            .block(Block::bordered().padding(left_pad()).title(" player "))
            .wrap(Wrap { trim: true });
        frame.render_widget(player, chunks[3]);
    }

    let footer = Paragraph::new(controls_text(settings.controls.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(left_pad()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);

    // Popups stay inside the list area.
    let list_area = chunks[2];
    if let Some(form) = &app.form {
        draw_form(frame, form, list_area);
    }
    if let Some(id) = &app.confirm_delete {
        let name = app
            .tracks
            .iter()
            .find(|t| &t.id == id)
            .map(|t| t.display())
            .unwrap_or_else(|| id.to_string());
        draw_popup(
            frame,
            list_area,
            " delete ",
            format!("Delete \"{name}\"?\n\n[y] yes  [any other key] no"),
        );
    }
    if let Some(alert) = &app.alert {
        draw_popup(frame, list_area, " alert ", format!("{alert}\n\n[any key] close"));
    }
}

fn draw_popup(frame: &mut Frame, area: Rect, title: &str, text: String) {
    let popup_area = centered_rect_sized(60, 7, area);
    frame.render_widget(Clear, popup_area);
    let popup = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .padding(left_pad())
                .title(title),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(popup, popup_area);
}

fn draw_form(frame: &mut Frame, form: &TrackForm, area: Rect) {
    let popup_area = centered_rect_sized(72, 10, area);
    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = FORM_LABELS
        .iter()
        .zip(&form.values)
        .enumerate()
        .map(|(i, (label, value))| {
            let value = if i >= 3 {
                reference_text(value)
            } else {
                value.clone()
            };
            let focused = i == form.focus;
            let cursor = if focused { "_" } else { "" };
            let style = if focused {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(Span::styled(format!("{label:>7}: {value}{cursor}"), style))
        })
        .chain([
            Line::from(""),
            Line::from("[tab] next field | [enter] save | [esc] cancel"),
        ])
        .collect();

    let title = if form.editing.is_some() {
        " edit song "
    } else {
        " upload song "
    };
    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .padding(left_pad())
            .title(title),
    );
    frame.render_widget(popup, popup_area);
}
