use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, HighlightSpacing, List, ListItem, Paragraph, Scrollbar,
        ScrollbarOrientation, Wrap,
    },
};

use crate::{
    core::{
        flag::SLOT_COUNT,
        manifest::{Challenge, Difficulty, challenge_file_path},
    },
    tui::{
        app::{App, AppMessageType, CurrentScreen, InputMode, ListViewWidget},
        utils::cursor,
    },
};

const RESPONSIBLE_USE: &str = "This challenge is for educational purposes only in a controlled environment. \
The techniques discussed may be illegal if applied to systems you do not have explicit permission to test. \
Always act ethically and within the law.";

pub fn difficulty_color(difficulty: Difficulty) -> Color {
    match difficulty {
        Difficulty::Beginner => Color::Green,
        Difficulty::Intro => Color::Blue,
        Difficulty::Intermediate => Color::Yellow,
        Difficulty::Advanced => Color::Red,
        Difficulty::Trivial => Color::Gray,
    }
}

fn get_active_widget_style(app: &App, widget: ListViewWidget) -> Style {
    if app.state.current_screen == CurrentScreen::ChallengeList && app.selected_widget() == widget
    {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn get_message_style(app: &App) -> Style {
    match app.app_message.msg_type {
        AppMessageType::Info => Style::default(),
        AppMessageType::Error => Style::default().bg(Color::Red),
    }
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(vec![
        Line::from("CRYPTO CTF".bold().fg(Color::Green)),
        Line::from("An Educational Cryptography Playground".fg(Color::Gray)),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::BOTTOM).fg(Color::Green));
    frame.render_widget(header, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App, help: Vec<Span<'static>>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let notice = Line::from(vec![
        Span::from("Notice: ").fg(Color::Red).bold(),
        Span::from("This is an educational tool. All challenges are fictional and self-contained.")
            .fg(Color::Gray),
    ]);
    frame.render_widget(
        Paragraph::new(notice).alignment(Alignment::Center),
        chunks[0],
    );

    frame.render_widget(
        Paragraph::new(app.app_message.msg.as_str())
            .style(get_message_style(app))
            .alignment(Alignment::Center),
        chunks[1],
    );

    let help_bar = Paragraph::new(Line::from(help))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::NONE));
    frame.render_widget(help_bar, chunks[2]);
}

/// Text columns inside a bordered input.
fn input_width(rect: Rect) -> usize {
    usize::from(rect.width.saturating_sub(2))
}

fn draw_assembler(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::bordered()
        .title(" Master Flag Assembler ")
        .title_alignment(Alignment::Center)
        .fg(Color::Green);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(inner);

    let intro = Line::from(vec![
        Span::from("Enter the four ").fg(Color::Gray),
        Span::from("REAL").fg(Color::LightGreen).bold(),
        Span::from(" flags you've discovered to compute the master flag.").fg(Color::Gray),
    ]);
    frame.render_widget(Paragraph::new(intro).alignment(Alignment::Center), rows[0]);

    let mut input_rects = Vec::with_capacity(SLOT_COUNT);
    for row in [rows[1], rows[2]] {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(row);
        input_rects.extend(cols.iter().copied());
    }

    let editing = |slot: usize| {
        app.ui.input_mode == InputMode::Insert && app.ui.selected_input == Some(slot)
    };

    for (slot, rect) in input_rects.iter().enumerate() {
        let value = app.session.slot(slot);
        let title = format!("Real Flag #{}", slot + 1);
        let text = if value.is_empty() {
            Line::from(Span::from(title.clone()).fg(Color::DarkGray))
        } else {
            Line::from(Span::from(value).fg(Color::White))
        };
        let mut style = get_active_widget_style(app, ListViewWidget::FlagInput(slot));
        let mut offset = 0;
        if editing(slot) {
            style = style.fg(Color::Yellow);
            offset = cursor::scroll_offset(app.ui.character_index, input_width(*rect));
        }
        let input = Paragraph::new(text)
            .scroll((0, u16::try_from(offset).unwrap_or(u16::MAX)))
            .block(Block::bordered().title(title).style(style));
        frame.render_widget(input, *rect);

        if editing(slot) {
            let width = input_width(*rect);
            let column = app.ui.character_index.saturating_sub(offset);
            let column = u16::try_from(column.min(width.saturating_sub(1))).unwrap_or(0);
            frame.set_cursor_position(Position::new(rect.x + 1 + column, rect.y + 1));
        }
    }

    let result_style = get_active_widget_style(app, ListViewWidget::MasterFlag);
    let result = match (app.session.master_flag(), app.session.message()) {
        (Some(flag), message) => {
            let mut spans = vec![
                Span::from("Master Flag: ").fg(Color::Gray),
                Span::from(flag.to_string())
                    .fg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
                Span::from("  "),
            ];
            if app.session.is_copied() {
                spans.push(Span::from("[Copied!]").fg(Color::Green));
            } else {
                spans.push(Span::from("[c: Copy]").fg(Color::Gray));
            }
            if let Some(message) = message {
                spans.push(Span::from("  "));
                spans.push(Span::from(message).fg(Color::White).bg(Color::Red));
            }
            Paragraph::new(Line::from(spans))
        }
        (None, Some(message)) => Paragraph::new(message).fg(Color::LightRed),
        (None, None) => Paragraph::new("Press a to assemble the master flag.").fg(Color::DarkGray),
    };
    frame.render_widget(
        result
            .alignment(Alignment::Center)
            .block(Block::bordered().style(result_style)),
        rows[3],
    );
}

fn challenge_item(challenge: &Challenge) -> ListItem<'static> {
    let color = difficulty_color(challenge.difficulty);
    ListItem::new(vec![
        Line::from(vec![
            Span::from(challenge.title.clone()).fg(Color::LightGreen).bold(),
            Span::from("  "),
            Span::from(format!("[{}]", challenge.difficulty.label())).fg(color),
            Span::from(format!("  {} Points", challenge.points)).fg(Color::Green),
        ]),
        Line::from(format!("    {}", challenge.description)).fg(Color::Gray),
    ])
}

pub fn draw_challenge_list(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(12),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0]);
    draw_assembler(frame, chunks[1], app);

    let list_block = Block::bordered()
        .title(" Challenges ")
        .style(get_active_widget_style(app, ListViewWidget::Challenges));

    match &app.load_error {
        Some(error) => {
            let error = Paragraph::new(error.as_str())
                .fg(Color::Red)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(list_block);
            frame.render_widget(error, chunks[2]);
        }
        None => {
            let items: Vec<ListItem> = app.challenges.iter().map(challenge_item).collect();
            let list_widget = List::new(items)
                .highlight_style(Style::new().bg(Color::Blue).add_modifier(Modifier::BOLD))
                .highlight_symbol(">> ")
                .highlight_spacing(HighlightSpacing::Always)
                .block(list_block);
            frame.render_stateful_widget(list_widget, chunks[2], &mut app.ui.challenge_list);

            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("↑"))
                    .end_symbol(Some("↓")),
                chunks[2],
                &mut app.ui.challenge_list_vertical,
            );
        }
    }

    let mut help = vec![Span::from("Tab/Shift+Tab: Change Pane  ").fg(Color::Green)];
    match (app.ui.input_mode.clone(), app.selected_widget()) {
        (InputMode::Insert, _) => help.extend([
            Span::from("Esc/Enter: Done  ").fg(Color::Green),
            Span::from("←/→: Move Cursor  ").fg(Color::Green),
        ]),
        (InputMode::Normal, ListViewWidget::Challenges) => help.extend([
            Span::from("↑/k: Up  ").fg(Color::Green),
            Span::from("↓/j: Down  ").fg(Color::Green),
            Span::from("Enter: Open  ").fg(Color::Green),
            Span::from("a: Assemble  ").fg(Color::Green),
        ]),
        (InputMode::Normal, _) => help.extend([
            Span::from("Enter/i: Edit  ").fg(Color::Green),
            Span::from("a: Assemble  ").fg(Color::Green),
            Span::from("c: Copy  ").fg(Color::Green),
            Span::from("o: Open Challenge  ").fg(Color::Green),
        ]),
    }
    if app.ui.input_mode == InputMode::Normal {
        help.push(Span::from("q: Quit").fg(Color::Green));
    }

    draw_footer(frame, chunks[3], app, help);
}

fn detail_text(app: &App, challenge: &Challenge) -> Text<'static> {
    let heading = |s: &'static str| Line::from(s.fg(Color::LightGreen).bold());

    let mut lines = vec![
        Line::from(vec![
            Span::from(format!("{} Points", challenge.points)).fg(Color::Green).bold(),
            Span::from("  "),
            Span::from(challenge.difficulty.label()).fg(difficulty_color(challenge.difficulty)),
        ]),
        Line::from(""),
        Line::from(challenge.description.clone()),
        Line::from(""),
        heading("Challenge Files"),
    ];

    if challenge.files.is_empty() {
        lines.push(Line::from("No files for this challenge.".fg(Color::Gray)));
    } else {
        for file in &challenge.files {
            let path = challenge_file_path(&app.challenges_dir, file);
            lines.push(Line::from(vec![
                Span::from(format!("  • {file}")).fg(Color::LightBlue),
                Span::from(format!("  ({})", path.display())).fg(Color::DarkGray),
            ]));
        }
    }

    if !challenge.hints.is_empty() {
        lines.push(Line::from(""));
        lines.push(heading("Hints"));
        for hint in &challenge.hints {
            lines.push(Line::from(format!("  - {hint}")));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from("Responsible Use Notice".fg(Color::Red).bold()));
    lines.push(Line::from(RESPONSIBLE_USE.fg(Color::LightRed)));

    Text::from(lines)
}

pub fn draw_challenge_detail(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0]);

    let body = match &app.selected_challenge {
        Some(challenge) => Paragraph::new(detail_text(app, challenge))
            .wrap(Wrap { trim: false })
            .scroll((app.ui.detail_scroll, 0))
            .block(
                Block::bordered()
                    .title(format!(" {} ", challenge.title))
                    .fg(Color::Green),
            ),
        None => Paragraph::new("Challenge not found.")
            .fg(Color::Red)
            .alignment(Alignment::Center)
            .block(Block::bordered()),
    };
    frame.render_widget(body, chunks[1]);

    let help = vec![
        Span::from("Esc/h: Back to Challenges  ").fg(Color::Green),
        Span::from("↑/k ↓/j: Scroll  ").fg(Color::Green),
        Span::from("q: Quit").fg(Color::Green),
    ];
    draw_footer(frame, chunks[2], app, help);
}

pub fn draw_exit_screen(frame: &mut Frame, _app: &mut App) {
    frame.render_widget(Clear, frame.area());

    let popup_block = Block::default()
        .title(" Exit ")
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let exit_text = Text::from(vec![
        Line::from(""),
        Line::from(""),
        Line::styled(
            "Would you like to exit? (Y/N)",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
    ]);

    let exit_paragraph = Paragraph::new(exit_text)
        .alignment(Alignment::Center)
        .block(popup_block)
        .wrap(Wrap { trim: false });

    let area = centered_rect(50, 30, frame.area());
    frame.render_widget(exit_paragraph, area);
}

pub fn draw_ui(frame: &mut Frame, app: &mut App) {
    match app.state.current_screen {
        CurrentScreen::ChallengeList => draw_challenge_list(frame, app),
        CurrentScreen::ChallengeDetail => draw_challenge_detail(frame, app),
        CurrentScreen::Exiting => draw_exit_screen(frame, app),
    }
}

/// helper function to create a centered rect using up certain percentage of the available rect `r`
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::{
        manifest::Manifest,
        session::{Clipboard, ClipboardError},
    };
    use ratatui::{Terminal, backend::TestBackend};
    use std::path::PathBuf;

    struct NoClipboard;

    impl Clipboard for NoClipboard {
        fn set_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
            Err(ClipboardError::Unavailable("test".to_owned()))
        }
    }

    const MANIFEST: &str = r#"{"challenges":[
        {"id":"caesar","title":"Caesar Salad","difficulty":"Beginner","points":100,
         "description":"A classic shift.","files":["caesar.txt"],"hints":["Try ROT13."]}
    ]}"#;

    fn test_app() -> App {
        App::new(
            Manifest::from_json(MANIFEST),
            PathBuf::from("challenges"),
            Box::new(NoClipboard),
        )
    }

    fn render(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw_ui(f, app)).unwrap();
        screen_text(&terminal)
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_list_screen_renders_assembler_and_challenges() {
        let mut app = test_app();
        let screen = render(&mut app);
        assert!(screen.contains("CRYPTO CTF"));
        assert!(screen.contains("Master Flag Assembler"));
        assert!(screen.contains("Real Flag #4"));
        assert!(screen.contains("Caesar Salad"));
        assert!(screen.contains("[Beginner]"));
        assert!(screen.contains("100 Points"));
    }

    #[test]
    fn test_long_flag_scrolls_inside_its_input() {
        let mut app = test_app();
        let flag = "Dark_Flag{0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKL}";
        app.session.set_slot(0, flag);
        app.insert_mode_for(0);

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| draw_ui(f, &mut app)).unwrap();
        let screen = screen_text(&terminal);
        assert!(screen.contains("GHIJKL}"));
        assert!(!screen.contains("Dark_Flag{0123"));

        // the second input starts at column 40
        let cursor = terminal.get_cursor_position().unwrap();
        assert!(cursor.x < 40, "cursor left the input: {cursor:?}");

        app.ui.character_index = 0;
        terminal.draw(|f| draw_ui(f, &mut app)).unwrap();
        assert!(screen_text(&terminal).contains("Dark_Flag{0123"));
        assert_eq!(terminal.get_cursor_position().unwrap().x, 2);
    }

    #[test]
    fn test_master_flag_and_error_render() {
        let mut app = test_app();
        for slot in 0..SLOT_COUNT {
            app.session.set_slot(slot, "Dark_Flag{ABCDEFGH}");
        }
        app.assemble();
        let screen = render(&mut app);
        assert!(screen.contains("Dark_Flag{CDEFCDEFCDEFCDEF}"));

        app.copy_master_flag();
        let screen = render(&mut app);
        assert!(screen.contains("Dark_Flag{CDEFCDEFCDEFCDEF}"));
        assert!(screen.contains("Could not copy flag to clipboard."));

        app.session.set_slot(0, "");
        app.assemble();
        let screen = render(&mut app);
        assert!(screen.contains("Please enter all four real flags."));
        assert!(!screen.contains("Dark_Flag{CDEF"));
    }

    #[test]
    fn test_detail_screen() {
        let mut app = test_app();
        app.open_challenge("caesar");
        let screen = render(&mut app);
        assert!(screen.contains("Caesar Salad"));
        assert!(screen.contains("Challenge Files"));
        assert!(screen.contains("caesar.txt"));
        assert!(screen.contains("Try ROT13."));
        assert!(screen.contains("Responsible Use Notice"));

        app.open_challenge("nope");
        assert!(render(&mut app).contains("Challenge not found."));
    }

    #[test]
    fn test_load_error_replaces_list() {
        let mut app = App::new(
            Manifest::from_json("[]"),
            PathBuf::from("challenges"),
            Box::new(NoClipboard),
        );
        let screen = render(&mut app);
        assert!(screen.contains("Failed to load challenges"));
        assert!(screen.contains("Master Flag Assembler"));
    }

    #[test]
    fn test_exit_popup() {
        let mut app = test_app();
        app.handle_command(crate::tui::app::Command::Quit);
        assert!(render(&mut app).contains("Would you like to exit?"));
    }
}
