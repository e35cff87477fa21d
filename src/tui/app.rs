use std::{
    collections::HashMap,
    error::Error,
    path::PathBuf,
    time::{Duration, Instant},
};

use ratatui::{
    DefaultTerminal,
    crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    widgets::{ListState, ScrollbarState},
};
use tracing::{debug, info};

use crate::core::{
    flag::SLOT_COUNT,
    manifest::{Challenge, Manifest, ManifestError},
    session::{AssemblerSession, Clipboard, CopyOutcome},
};
use crate::tui::utils::{self, cursor};

#[derive(Clone, Debug, PartialEq)]
pub enum CurrentScreen {
    ChallengeList,
    ChallengeDetail,
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListViewWidget {
    FlagInput(usize),
    MasterFlag,
    Challenges,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputMode {
    Normal,
    Insert,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum AppMessageType {
    #[default]
    Info,
    Error,
}

#[derive(Clone, Debug, Default)]
pub struct AppMessage {
    pub msg: String,
    pub msg_type: AppMessageType,
}

impl AppMessage {
    pub fn new(msg: &str, msg_type: AppMessageType) -> Self {
        AppMessage {
            msg: msg.to_owned(),
            msg_type,
        }
    }
}

// Command pattern for user actions
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    // Navigation commands
    NextWidget,
    PrevWidget,
    GoBack,

    // Input mode commands
    EditInput,
    ExitInsertMode,
    AcceptInput,

    // Character input commands
    InsertChar(char),
    DeleteChar,
    MoveCursorLeft,
    MoveCursorRight,

    // Assembler commands
    Assemble,
    CopyMasterFlag,

    // Challenge commands
    OpenChallenge,
    Select,

    // List commands
    MoveUp,
    MoveDown,
    MoveToTop,
    MoveToBottom,

    // App commands
    Quit,
    ConfirmQuit,
    CancelQuit,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Direction {
    Up,
    Down,
    Top,
    Bottom,
}

// Key event wrapper for HashMap keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyPress {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        KeyPress { code, modifiers }
    }

    pub fn from_key_event(event: KeyEvent) -> Self {
        KeyPress {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

#[derive(Clone)]
pub struct KeyBindings {
    list_normal: HashMap<KeyPress, Command>,
    detail_normal: HashMap<KeyPress, Command>,
    exiting_screen: HashMap<KeyPress, Command>,
    insert_mode: HashMap<KeyPress, Command>,
    // work across all screens and modes
    global: HashMap<KeyPress, Command>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = KeyBindings {
            list_normal: HashMap::new(),
            detail_normal: HashMap::new(),
            exiting_screen: HashMap::new(),
            insert_mode: HashMap::new(),
            global: HashMap::new(),
        };

        bindings.init_default_bindings();
        bindings
    }
}

impl KeyBindings {
    fn init_default_bindings(&mut self) {
        let none = KeyModifiers::NONE;

        self.global.insert(
            KeyPress::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Command::Quit,
        );

        // shared by both normal mode screens
        let navigation = [
            (KeyPress::new(KeyCode::Char('q'), none), Command::Quit),
            (KeyPress::new(KeyCode::Char('j'), none), Command::MoveDown),
            (KeyPress::new(KeyCode::Down, none), Command::MoveDown),
            (KeyPress::new(KeyCode::Char('k'), none), Command::MoveUp),
            (KeyPress::new(KeyCode::Up, none), Command::MoveUp),
            (KeyPress::new(KeyCode::Char('g'), none), Command::MoveToTop),
            (
                KeyPress::new(KeyCode::Char('G'), KeyModifiers::SHIFT),
                Command::MoveToBottom,
            ),
        ];
        for (key, cmd) in navigation {
            self.list_normal.insert(key, cmd.clone());
            self.detail_normal.insert(key, cmd);
        }

        // Challenge list (with the assembler panel) bindings
        let list = [
            (KeyCode::Char('a'), Command::Assemble),
            (KeyCode::Char('c'), Command::CopyMasterFlag),
            (KeyCode::Char('y'), Command::CopyMasterFlag),
            (KeyCode::Char('i'), Command::EditInput),
            (KeyCode::Char('o'), Command::OpenChallenge),
            (KeyCode::Enter, Command::Select),
            (KeyCode::Tab, Command::NextWidget),
        ];
        for (code, cmd) in list {
            self.list_normal.insert(KeyPress::new(code, none), cmd);
        }
        self.list_normal.insert(
            KeyPress::new(KeyCode::BackTab, KeyModifiers::SHIFT),
            Command::PrevWidget,
        );

        // Challenge detail bindings
        self.detail_normal
            .insert(KeyPress::new(KeyCode::Esc, none), Command::GoBack);
        self.detail_normal
            .insert(KeyPress::new(KeyCode::Backspace, none), Command::GoBack);
        self.detail_normal
            .insert(KeyPress::new(KeyCode::Char('h'), none), Command::GoBack);

        // Exiting screen bindings
        for code in [KeyCode::Char('y'), KeyCode::Char('q'), KeyCode::Enter] {
            self.exiting_screen
                .insert(KeyPress::new(code, none), Command::ConfirmQuit);
        }
        for code in [KeyCode::Char('n'), KeyCode::Esc] {
            self.exiting_screen
                .insert(KeyPress::new(code, none), Command::CancelQuit);
        }

        // Insert mode bindings
        let insert = [
            (KeyCode::Esc, Command::ExitInsertMode),
            (KeyCode::Enter, Command::AcceptInput),
            (KeyCode::Backspace, Command::DeleteChar),
            (KeyCode::Left, Command::MoveCursorLeft),
            (KeyCode::Right, Command::MoveCursorRight),
            (KeyCode::Tab, Command::NextWidget),
        ];
        for (code, cmd) in insert {
            self.insert_mode.insert(KeyPress::new(code, none), cmd);
        }
        self.insert_mode.insert(
            KeyPress::new(KeyCode::BackTab, KeyModifiers::SHIFT),
            Command::PrevWidget,
        );
    }

    pub fn get_command(
        &self,
        key_event: KeyEvent,
        screen: &CurrentScreen,
        input_mode: &InputMode,
    ) -> Option<Command> {
        let key_press = KeyPress::from_key_event(key_event);

        // handle exit commands separately as there are matching keys with global keys
        if *screen == CurrentScreen::Exiting {
            return self.exiting_screen.get(&key_press).cloned();
        }

        if let Some(cmd) = self.global.get(&key_press) {
            return Some(cmd.clone());
        }

        match input_mode {
            InputMode::Insert => {
                if let KeyCode::Char(c) = key_event.code
                    && (key_event.modifiers == KeyModifiers::NONE
                        || key_event.modifiers == KeyModifiers::SHIFT)
                {
                    return Some(Command::InsertChar(c));
                }
                self.insert_mode.get(&key_press).cloned()
            }
            InputMode::Normal => match screen {
                CurrentScreen::ChallengeList => self.list_normal.get(&key_press).cloned(),
                CurrentScreen::ChallengeDetail => self.detail_normal.get(&key_press).cloned(),
                CurrentScreen::Exiting => None,
            },
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub current_screen: CurrentScreen,
    pub screen_history: Vec<CurrentScreen>,
    pub should_exit: bool,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            current_screen: CurrentScreen::ChallengeList,
            screen_history: vec![],
            should_exit: false,
        }
    }
}

#[derive(Clone)]
pub struct WidgetSelection {
    pub list_view_widgets: Vec<ListViewWidget>,
    pub selected_index: usize,
}

impl WidgetSelection {
    pub fn new() -> Self {
        let mut list_view_widgets: Vec<ListViewWidget> =
            (0..SLOT_COUNT).map(ListViewWidget::FlagInput).collect();
        list_view_widgets.push(ListViewWidget::MasterFlag);
        list_view_widgets.push(ListViewWidget::Challenges);

        WidgetSelection {
            list_view_widgets,
            selected_index: 0,
        }
    }

    pub fn selected(&self) -> ListViewWidget {
        self.list_view_widgets[self.selected_index % self.list_view_widgets.len()]
    }
}

#[derive(Clone)]
pub struct UiState {
    pub selected_widgets: WidgetSelection,
    pub challenge_list: ListState,
    pub challenge_list_vertical: ScrollbarState,
    pub detail_scroll: u16,
    pub input_mode: InputMode,
    /// 0-based flag slot being typed into.
    pub selected_input: Option<usize>,
    pub character_index: usize,
    pub last_g_press_time: Option<Instant>,
}

impl UiState {
    pub fn new() -> Self {
        UiState {
            selected_widgets: WidgetSelection::new(),
            challenge_list: ListState::default(),
            challenge_list_vertical: ScrollbarState::default(),
            detail_scroll: 0,
            input_mode: InputMode::Insert,
            selected_input: Some(0),
            character_index: 0,
            last_g_press_time: None,
        }
    }
}

pub struct App {
    pub state: AppState,
    pub ui: UiState,
    pub challenges: Vec<Challenge>,
    /// Shown in place of the challenge list when the manifest failed to load.
    pub load_error: Option<String>,
    pub challenges_dir: PathBuf,
    pub selected_challenge: Option<Challenge>,
    pub session: AssemblerSession,
    pub clipboard: Box<dyn Clipboard>,
    pub app_message: AppMessage,
    pub key_bindings: KeyBindings,
}

impl App {
    pub fn new(
        manifest: Result<Manifest, ManifestError>,
        challenges_dir: PathBuf,
        clipboard: Box<dyn Clipboard>,
    ) -> App {
        let (challenges, load_error) = match manifest {
            Ok(manifest) => (manifest.challenges, None),
            Err(e) => (vec![], Some(format!("Failed to load challenges: {e}"))),
        };

        let mut ui = UiState::new();
        if !challenges.is_empty() {
            ui.challenge_list.select(Some(0));
            ui.challenge_list_vertical = ui.challenge_list_vertical.content_length(challenges.len());
        }

        App {
            state: AppState::new(),
            ui,
            challenges,
            load_error,
            challenges_dir,
            selected_challenge: None,
            session: AssemblerSession::new(),
            clipboard,
            app_message: AppMessage::default(),
            key_bindings: KeyBindings::default(),
        }
    }

    fn go_to(&mut self, screen: CurrentScreen) {
        self.state
            .screen_history
            .push(self.state.current_screen.clone());
        self.state.current_screen = screen;
    }

    fn go_back(&mut self) {
        self.ui.input_mode = InputMode::Normal;
        match self.state.screen_history.pop() {
            None => self.state.current_screen = CurrentScreen::ChallengeList,
            Some(screen) => {
                if screen == CurrentScreen::ChallengeList {
                    self.selected_challenge = None;
                }
                self.state.current_screen = screen;
            }
        }
    }

    pub fn select_widget(&mut self, widget: ListViewWidget) {
        if let Some(index) = self
            .ui
            .selected_widgets
            .list_view_widgets
            .iter()
            .position(|w| *w == widget)
        {
            self.ui.selected_widgets.selected_index = index;
        }
    }

    pub fn selected_widget(&self) -> ListViewWidget {
        self.ui.selected_widgets.selected()
    }

    pub fn insert_mode_for(&mut self, slot: usize) {
        self.ui.input_mode = InputMode::Insert;
        self.ui.selected_input = Some(slot);
        self.ui.character_index = cursor::end_of(self.session.slot(slot));
    }

    fn leave_insert_mode(&mut self) {
        self.ui.input_mode = InputMode::Normal;
        self.ui.selected_input = None;
    }

    fn cycle_widget(&mut self, forward: bool) {
        let was_inserting = self.ui.input_mode == InputMode::Insert;
        let len = self.ui.selected_widgets.list_view_widgets.len();
        let current = self.ui.selected_widgets.selected_index;
        self.ui.selected_widgets.selected_index = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };

        // keep typing when tabbing between flag inputs
        match self.selected_widget() {
            ListViewWidget::FlagInput(slot) if was_inserting => self.insert_mode_for(slot),
            _ => self.leave_insert_mode(),
        }
    }

    pub fn next_widget(&mut self) {
        self.cycle_widget(true);
    }

    pub fn prev_widget(&mut self) {
        self.cycle_widget(false);
    }

    pub fn assemble(&mut self) {
        self.leave_insert_mode();
        self.session.assemble();
        self.app_message = match self.session.master_flag() {
            Some(_) => AppMessage::new(
                "Master flag assembled. Press c to copy it.",
                AppMessageType::Info,
            ),
            None => AppMessage::default(),
        };
    }

    pub fn copy_master_flag(&mut self) {
        match self.session.copy(self.clipboard.as_mut(), Instant::now()) {
            CopyOutcome::Copied => {
                self.app_message =
                    AppMessage::new("Master flag copied to clipboard", AppMessageType::Info);
            }
            CopyOutcome::Failed => {
                // the session carries the clipboard error for the assembler panel
                self.app_message = AppMessage::default();
            }
            CopyOutcome::Ignored => {
                if self.session.master_flag().is_none() {
                    self.app_message =
                        AppMessage::new("Nothing to copy yet.", AppMessageType::Info);
                }
            }
        }
    }

    /// Advances timed state. The copied footer goes away with the "Copied!" label.
    pub fn tick(&mut self, now: Instant) {
        let was_copied = self.session.is_copied();
        self.session.tick(now);
        if was_copied && !self.session.is_copied() {
            self.app_message = AppMessage::default();
        }
    }

    /// Opens the detail view for a challenge id.
    pub fn open_challenge(&mut self, id: &str) {
        self.selected_challenge = self.challenges.iter().find(|c| c.id == id).cloned();
        match &self.selected_challenge {
            Some(challenge) => {
                info!(id = %challenge.id, "opening challenge");
                self.app_message = AppMessage::default();
            }
            None => {
                debug!(id, "challenge not in manifest");
                self.app_message = AppMessage::new("Challenge not found.", AppMessageType::Error);
            }
        }
        self.ui.detail_scroll = 0;
        self.leave_insert_mode();
        self.go_to(CurrentScreen::ChallengeDetail);
    }

    fn open_selected_challenge(&mut self) {
        let id = self
            .ui
            .challenge_list
            .selected()
            .and_then(|i| self.challenges.get(i))
            .map(|c| c.id.clone());

        match id {
            Some(id) => self.open_challenge(&id),
            None => {
                self.app_message = AppMessage::new("No challenge selected", AppMessageType::Info);
            }
        }
    }

    pub fn handle_command(&mut self, cmd: Command) {
        match cmd {
            // Navigation commands
            Command::NextWidget => {
                if self.state.current_screen == CurrentScreen::ChallengeList {
                    self.next_widget();
                }
            }
            Command::PrevWidget => {
                if self.state.current_screen == CurrentScreen::ChallengeList {
                    self.prev_widget();
                }
            }
            Command::GoBack => self.go_back(),

            Command::EditInput => {
                if let ListViewWidget::FlagInput(slot) = self.selected_widget() {
                    self.insert_mode_for(slot);
                }
            }
            Command::ExitInsertMode | Command::AcceptInput => self.leave_insert_mode(),

            // Character input commands
            Command::InsertChar(c) => {
                if let Some(slot) = self.ui.selected_input
                    && let Some(input) = self.session.edit(slot)
                {
                    cursor::insert(input, &mut self.ui.character_index, c);
                    self.app_message = AppMessage::default();
                }
            }
            Command::DeleteChar => {
                if let Some(slot) = self.ui.selected_input
                    && self.ui.character_index > 0
                    && let Some(input) = self.session.edit(slot)
                {
                    cursor::backspace(input, &mut self.ui.character_index);
                    self.app_message = AppMessage::default();
                }
            }
            Command::MoveCursorLeft => {
                if self.ui.selected_input.is_some() {
                    cursor::left(&mut self.ui.character_index);
                }
            }
            Command::MoveCursorRight => {
                if let Some(slot) = self.ui.selected_input {
                    cursor::right(self.session.slot(slot), &mut self.ui.character_index);
                }
            }

            // Assembler commands
            Command::Assemble => self.assemble(),
            Command::CopyMasterFlag => self.copy_master_flag(),

            // Challenge commands
            Command::OpenChallenge => self.open_selected_challenge(),
            Command::Select => match self.selected_widget() {
                ListViewWidget::FlagInput(slot) => self.insert_mode_for(slot),
                ListViewWidget::MasterFlag => self.copy_master_flag(),
                ListViewWidget::Challenges => self.open_selected_challenge(),
            },

            // List commands
            Command::MoveUp => self.handle_navigate(Direction::Up),
            Command::MoveDown => self.handle_navigate(Direction::Down),
            Command::MoveToTop => self.handle_navigate(Direction::Top),
            Command::MoveToBottom => self.handle_navigate(Direction::Bottom),

            // App commands
            Command::Quit => {
                if self.state.current_screen != CurrentScreen::Exiting {
                    self.leave_insert_mode();
                    self.go_to(CurrentScreen::Exiting);
                }
            }
            Command::ConfirmQuit => {
                self.state.should_exit = true;
            }
            Command::CancelQuit => {
                self.go_back();
            }
        }
    }

    fn handle_navigate(&mut self, dir: Direction) {
        match self.state.current_screen {
            CurrentScreen::ChallengeList => match self.selected_widget() {
                ListViewWidget::Challenges => utils::handle_list_navigation(
                    dir,
                    &mut self.ui.challenge_list,
                    self.challenges.len(),
                    Some(&mut self.ui.challenge_list_vertical),
                    &mut self.ui.last_g_press_time,
                ),
                // j/k walk between the flag inputs
                ListViewWidget::FlagInput(slot) => {
                    let target = match dir {
                        Direction::Up | Direction::Top => slot.saturating_sub(1),
                        Direction::Down | Direction::Bottom => (slot + 1).min(SLOT_COUNT - 1),
                    };
                    self.select_widget(ListViewWidget::FlagInput(target));
                }
                ListViewWidget::MasterFlag => {}
            },
            CurrentScreen::ChallengeDetail => {
                self.ui.detail_scroll = match dir {
                    Direction::Up => self.ui.detail_scroll.saturating_sub(1),
                    Direction::Down => self.ui.detail_scroll.saturating_add(1),
                    Direction::Top => 0,
                    Direction::Bottom => self.ui.detail_scroll,
                };
            }
            CurrentScreen::Exiting => {}
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if let Some(cmd) =
            self.key_bindings
                .get_command(key, &self.state.current_screen, &self.ui.input_mode)
        {
            self.handle_command(cmd);
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<(), Box<dyn Error>> {
        let tick_rate = Duration::from_millis(250);
        let mut last_tick = Instant::now();
        info!(challenges = self.challenges.len(), "starting ui");
        loop {
            if self.state.should_exit {
                return Ok(());
            }

            self.tick(Instant::now());
            terminal.draw(|f| super::ui::draw_ui(f, self))?;

            let timeout = tick_rate.saturating_sub(last_tick.elapsed());
            if event::poll(timeout)?
                && let Event::Key(key) = event::read()?
            {
                // Special case to handle Ctrl+C early
                if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
                    if self.state.current_screen == CurrentScreen::Exiting {
                        self.state.should_exit = true;
                    } else {
                        self.handle_command(Command::Quit);
                    }
                    continue;
                }

                self.handle_key_event(key);
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
            }
        }
    }
}
