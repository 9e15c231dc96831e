use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Tabs, Wrap},
    Frame,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::content::{
    Moment, COMPLIMENTS, COVER_MEDIA, FINAL_WISH, HONOREE, LETTERS, MOMENTS, WISHES_MEDIA,
};
use super::loading::{LoadingGate, RevealReason};
use crate::backend::cache::AssetHandle;
use crate::backend::catalog::MediaId;
use crate::backend::preloader::{PreloadCoordinator, PreloadSummary};
use crate::backend::progress::PreloadProgress;
use crate::config::TributeConfig;

const ROSE: Color = Color::Rgb(183, 110, 121);
const CARD_WIDTH: u16 = 44;
pub const LETTER_INTERVAL: Duration = Duration::from_millis(2200);

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum Tab {
    #[default]
    Cover,
    Name,
    Gallery,
    Wishes,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Cover, Tab::Name, Tab::Gallery, Tab::Wishes];

    fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaStatus {
    Ready(usize),
    Unverified(usize),
    FromSource,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameReveal {
    Letter(usize),
    Complete,
}

/// Which letter of the honoree's name is on screen after `elapsed`.
pub fn name_reveal_at(elapsed: Duration) -> NameReveal {
    let step = (elapsed.as_millis() / LETTER_INTERVAL.as_millis()) as usize;
    if step < LETTERS.len() {
        NameReveal::Letter(step)
    } else {
        NameReveal::Complete
    }
}

pub struct App {
    pub state: AppState,
    pub tab: Tab,
    pub progress: PreloadProgress,
    pub gate: LoadingGate,
    pub gallery_offset: usize,
    pub revealed_at: Option<Instant>,
    pub reveal_reason: Option<RevealReason>,
    pub status_message: Option<String>,
    pub degraded: HashSet<MediaId>,
    pub media: Arc<PreloadCoordinator>,
}

impl App {
    pub fn new(media: Arc<PreloadCoordinator>, config: &TributeConfig) -> Self {
        Self {
            state: AppState::Loading,
            tab: Tab::Cover,
            progress: PreloadProgress::default(),
            gate: LoadingGate::new(Instant::now(), config.min_loading(), config.loading_ceiling()),
            gallery_offset: 0,
            revealed_at: None,
            reveal_reason: None,
            status_message: None,
            degraded: HashSet::new(),
            media,
        }
    }

    pub fn set_progress(&mut self, progress: PreloadProgress) {
        // Reports can only arrive in order, but a stale one must not pull the gauge back.
        if progress.percent >= self.progress.percent {
            self.progress = progress;
        }
    }

    pub fn preload_finished(&mut self, summary: Option<PreloadSummary>) {
        if let Some(summary) = summary {
            self.degraded = summary.degraded.into_iter().collect();
            self.set_progress(summary.progress);
        }
        self.gate.mark_finished();
    }

    /// Advances the loading gate; returns true when the tribute was just revealed.
    pub fn tick(&mut self, now: Instant) -> bool {
        // Covers a session whose finish message never reached the UI.
        if self.state == AppState::Loading && self.media.is_complete() {
            self.gate.mark_finished();
        }

        match self.gate.poll(now) {
            Some(reason) => {
                if reason == RevealReason::Ceiling {
                    log::warn!("Loading ceiling reached at {}%, showing content anyway", self.progress.percent);
                }
                self.state = AppState::Ready;
                self.revealed_at = Some(now);
                self.reveal_reason = Some(reason);
                true
            }
            None => false,
        }
    }

    pub fn media_status(&self, id: &str) -> MediaStatus {
        let id = MediaId::new(id);
        match self.media.handle(&id) {
            Some(AssetHandle::Blob(blob)) if self.degraded.contains(&id) => {
                MediaStatus::Unverified(blob.len())
            }
            Some(AssetHandle::Blob(blob)) => MediaStatus::Ready(blob.len()),
            Some(AssetHandle::Remote(_)) => MediaStatus::FromSource,
            None => MediaStatus::Missing,
        }
    }

    /// The media id behind whatever is selected on the current tab.
    pub fn selected_media(&self) -> Option<&'static str> {
        match self.tab {
            Tab::Cover => Some(COVER_MEDIA),
            Tab::Name => None,
            Tab::Gallery => MOMENTS.get(self.gallery_offset).map(|m| m.media),
            Tab::Wishes => Some(WISHES_MEDIA),
        }
    }

    pub fn scroll_gallery(&mut self, forward: bool) {
        if forward {
            if self.gallery_offset + 1 < MOMENTS.len() {
                self.gallery_offset += 1;
            }
        } else {
            self.gallery_offset = self.gallery_offset.saturating_sub(1);
        }
    }

    /// Applies a navigation key. Returns false for keys it does not handle.
    pub fn navigate(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Tab | KeyCode::Right => self.tab = self.tab.next(),
            KeyCode::BackTab | KeyCode::Left => self.tab = self.tab.prev(),
            KeyCode::Char('1') => self.tab = Tab::Cover,
            KeyCode::Char('2') => self.tab = Tab::Name,
            KeyCode::Char('3') => self.tab = Tab::Gallery,
            KeyCode::Char('4') => self.tab = Tab::Wishes,
            KeyCode::Up if self.tab == Tab::Gallery => self.scroll_gallery(false),
            KeyCode::Down if self.tab == Tab::Gallery => self.scroll_gallery(true),
            _ => return false,
        }
        true
    }

    fn name_reveal(&self) -> NameReveal {
        let elapsed = self
            .revealed_at
            .map(|t| t.elapsed())
            .unwrap_or_default();
        name_reveal_at(elapsed)
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

pub fn ui(f: &mut Frame, app: &mut App) {
    match app.state {
        AppState::Loading => draw_loading_screen(f, app),
        AppState::Ready => draw_main_ui(f, app),
    }
}

fn draw_loading_screen(f: &mut Frame, app: &App) {
    let area = f.area();

    let block = Block::default()
        .borders(Borders::ALL)
        .title("A Birthday Tribute")
        .border_style(Style::default().fg(ROSE));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let center_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Percentage(35),
        ])
        .split(inner);

    let spinner_frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let frame_idx = (std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        / 100) as usize
        % spinner_frames.len();

    let title = Line::from(vec![
        Span::styled(
            format!("{} ", spinner_frames[frame_idx]),
            Style::default().fg(ROSE).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            HONOREE,
            Style::default()
                .fg(ROSE)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    f.render_widget(
        Paragraph::new(title).alignment(Alignment::Center),
        center_layout[1],
    );

    let gauge_area = centered_width(center_layout[2], 60);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)))
        .gauge_style(Style::default().fg(ROSE).bg(Color::Black))
        .percent(u16::from(app.progress.percent.min(100)))
        .label(format!("{}%", app.progress.percent));
    f.render_widget(gauge, gauge_area);

    let detail = if app.progress.has_sizes(app.media.assets().len()) {
        format!(
            "Loading your surprise... {} of {}",
            format_bytes(app.progress.loaded),
            format_bytes(app.progress.total)
        )
    } else {
        "Loading your surprise...".to_string()
    };
    let message = Paragraph::new(detail)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(message, center_layout[3]);
}

fn centered_width(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect::new(area.x + (area.width - width) / 2, area.y, width, area.height)
}

fn draw_main_ui(f: &mut Frame, app: &mut App) {
    let area = f.area();

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header/tabs
            Constraint::Min(10),   // content
            Constraint::Length(3), // footer
        ])
        .split(area);

    draw_header(f, root[0], app);

    match app.tab {
        Tab::Cover => draw_cover(f, root[1], app),
        Tab::Name => draw_name(f, root[1], app),
        Tab::Gallery => draw_gallery(f, root[1], app),
        Tab::Wishes => draw_wishes(f, root[1], app),
    }

    draw_footer(f, root[2], app);
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let titles = vec!["Cover", "Name", "Gallery", "Wishes"];

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("A Birthday Tribute")
                .border_style(Style::default().fg(ROSE)),
        )
        .select(app.tab.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    f.render_widget(tabs, area);
}

fn status_line(status: MediaStatus) -> Line<'static> {
    let (text, color) = match status {
        MediaStatus::Ready(size) => (format!("▶ ready · {}", format_bytes(size as u64)), Color::Green),
        MediaStatus::Unverified(size) => (
            format!("▶ unverified · {}", format_bytes(size as u64)),
            Color::Yellow,
        ),
        MediaStatus::FromSource => ("▶ from source".to_string(), Color::Cyan),
        MediaStatus::Missing => ("no video".to_string(), Color::DarkGray),
    };
    Line::from(Span::styled(text, Style::default().fg(color)))
}

fn draw_cover(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "THE BIRTHDAY ISSUE",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(Span::styled(
            HONOREE,
            Style::default().fg(ROSE).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Elegance, grace and a year worth celebrating"),
        Line::from(""),
        status_line(app.media_status(COVER_MEDIA)),
    ];

    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn draw_name(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("The Name")
        .border_style(Style::default().fg(Color::White));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = match app.name_reveal() {
        NameReveal::Letter(idx) => {
            let letter = &LETTERS[idx];
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    letter.letter.to_string(),
                    Style::default().fg(ROSE).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    letter.meaning,
                    Style::default().fg(Color::White).add_modifier(Modifier::ITALIC),
                )),
                Line::from(Span::styled(letter.compliment, Style::default().fg(Color::DarkGray))),
                Line::from(""),
                Line::from(Span::styled(
                    format!("{} / {}", idx + 1, LETTERS.len()),
                    Style::default().fg(Color::DarkGray),
                )),
            ]
        }
        NameReveal::Complete => {
            let mut lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    HONOREE,
                    Style::default().fg(ROSE).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ];
            lines.extend(LETTERS.iter().map(|l| {
                Line::from(vec![
                    Span::styled(format!("{} ", l.letter), Style::default().fg(ROSE)),
                    Span::raw(l.meaning),
                ])
            }));
            lines
        }
    };

    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn draw_gallery(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Moments")
        .border_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let max_offset = MOMENTS.len().saturating_sub(1);
    if app.gallery_offset > max_offset {
        app.gallery_offset = max_offset;
    }

    let cards_visible = (inner.width as usize / CARD_WIDTH as usize).max(1);
    let card_constraints: Vec<Constraint> = (0..cards_visible)
        .map(|_| Constraint::Length(CARD_WIDTH))
        .collect();

    let card_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(card_constraints)
        .split(inner);

    for (i, card_area) in card_areas.iter().enumerate() {
        let idx = app.gallery_offset + i;
        let Some(moment) = MOMENTS.get(idx) else {
            break;
        };
        draw_moment_card(f, *card_area, moment, i == 0, app.media_status(moment.media));
    }

    if app.gallery_offset > 0 {
        let left = Paragraph::new("◀").style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
        f.render_widget(left, Rect::new(inner.x, inner.y + inner.height / 2, 1, 1));
    }

    if app.gallery_offset + cards_visible < MOMENTS.len() {
        let right = Paragraph::new("▶").style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
        let right_area = Rect::new(
            inner.x + inner.width.saturating_sub(1),
            inner.y + inner.height / 2,
            1,
            1,
        );
        f.render_widget(right, right_area);
    }
}

fn draw_moment_card(f: &mut Frame, area: Rect, moment: &Moment, selected: bool, status: MediaStatus) {
    let border_style = if selected {
        Style::default().fg(ROSE).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(moment.title)
        .border_style(border_style);

    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height < 4 || inner.width < 5 {
        return;
    }

    let mut lines = vec![status_line(status), Line::from("")];
    lines.extend(moment.poem.iter().map(|verse| {
        Line::from(Span::styled(
            *verse,
            Style::default().fg(Color::White).add_modifier(Modifier::ITALIC),
        ))
    }));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn draw_wishes(f: &mut Frame, area: Rect, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(6)])
        .split(area);

    let mut lines = vec![Line::from("")];
    lines.extend(COMPLIMENTS.iter().map(|c| {
        Line::from(vec![
            Span::styled("✦ ", Style::default().fg(ROSE)),
            Span::raw(*c),
        ])
    }));
    let compliments = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Why we celebrate you")
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(compliments, layout[0]);

    let wish = Paragraph::new(vec![
        Line::from(Span::styled(
            FINAL_WISH,
            Style::default().fg(ROSE).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        status_line(app.media_status(WISHES_MEDIA)),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Final wish")
            .border_style(Style::default().fg(ROSE)),
    );
    f.render_widget(wish, layout[1]);
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let text = if let Some(message) = &app.status_message {
        Line::from(Span::styled(message.clone(), Style::default().fg(Color::Yellow)))
    } else {
        Line::from(vec![
            Span::styled("←/→", Style::default().fg(Color::Yellow)),
            Span::raw(": section  "),
            Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
            Span::raw(": select  "),
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::raw(": play  "),
            Span::styled("q", Style::default().fg(Color::Yellow)),
            Span::raw(": quit"),
        ])
    };

    let p = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ROSE)),
        )
        .alignment(Alignment::Center);
    f.render_widget(p, area);
}
