//! ratatui review screen.
//!
//! Document list on the left, the open document on the right, a notice line
//! and a status bar underneath. Keys go through the [`keymap::KeyMap`]; the
//! navigation and marking keys dispatch [`Action`]s to the controller, which
//! runs catalog I/O on a worker thread. The loop polls input every 100 ms and
//! folds finished replies in between.

pub mod dialog;
pub mod keymap;
pub mod layout;
pub mod widgets;

use std::io::stdout;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseEvent,
};
use crossterm::execute;
use ratatui::layout::Rect;
use ratatui::widgets::ListState;

use crate::client::DocmarkClient;
use crate::error::{DocmarkError, DocmarkResult};
use crate::navigator::{Action, Controller, Executor, Notice, WorkerExecutor};
use crate::settings::{Settings, SettingsResult};

use dialog::{Dialog, DialogOutcome, ExportDialog, FilterDialog};
use keymap::{KeyMap, UiAction};
use layout::PaneLayout;
use widgets::{Palette, Screen};

/// Lines moved per PageUp/PageDown.
const SCROLL_PAGE: u16 = 10;

/// Review screen state around a [`Controller`].
pub struct ReviewTui<E: Executor> {
    controller: Controller<E>,
    keymap: KeyMap,
    palette: Palette,
    hints: String,
    source: String,
    layout: PaneLayout,
    list_state: ListState,
    scroll: u16,
    /// Document the viewer scroll offset belongs to.
    scrolled_file: Option<String>,
    dialog: Option<Dialog>,
    /// Terminal size at the last draw.
    area: Rect,
    should_quit: bool,
}

impl ReviewTui<WorkerExecutor> {
    /// Review screen backed by `client` on a worker thread.
    pub fn with_client(client: DocmarkClient, settings: &Settings) -> DocmarkResult<Self> {
        let source = client.describe();
        let executor = WorkerExecutor::spawn(client)?;
        Ok(Self::new(executor, settings, source)?)
    }
}

impl<E: Executor> ReviewTui<E> {
    pub fn new(executor: E, settings: &Settings, source: String) -> SettingsResult<Self> {
        let keymap = KeyMap::from_settings(&settings.key_bindings)?;
        let (palette, problems) = Palette::from_settings(&settings.colors);
        let mut controller = Controller::new(executor);
        for problem in problems {
            tracing::warn!(%problem, "mark colour ignored");
            controller.notify(Notice::info(format!("{problem}; using a default colour")));
        }
        Ok(Self {
            hints: keymap.hints(),
            controller,
            keymap,
            palette,
            source,
            layout: PaneLayout::default(),
            list_state: ListState::default(),
            scroll: 0,
            scrolled_file: None,
            dialog: None,
            area: Rect::new(0, 0, 80, 24),
            should_quit: false,
        })
    }

    pub fn controller(&self) -> &Controller<E> {
        &self.controller
    }

    /// Run the TUI event loop.
    pub fn run(&mut self) -> DocmarkResult<()> {
        let mut terminal = ratatui::init();
        if let Err(e) = execute!(stdout(), EnableMouseCapture) {
            tracing::warn!("mouse capture unavailable: {e}");
        }

        let result = self.event_loop(&mut terminal);

        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();
        result
    }

    fn event_loop(&mut self, terminal: &mut ratatui::DefaultTerminal) -> DocmarkResult<()> {
        self.controller.refresh();

        loop {
            self.tick();

            terminal
                .draw(|frame| {
                    self.area = frame.area();
                    let screen = Screen {
                        navigator: self.controller.navigator(),
                        palette: &self.palette,
                        source: &self.source,
                        layout: &self.layout,
                        scroll: self.scroll,
                        hints: &self.hints,
                        busy: !self.controller.is_idle(),
                        dialog: self.dialog.as_ref(),
                    };
                    widgets::render(frame, &screen, &mut self.list_state);
                })
                .map_err(terminal_error)?;

            if self.should_quit {
                break;
            }

            // Poll for events.
            if event::poll(Duration::from_millis(100)).map_err(terminal_error)? {
                match event::read().map_err(terminal_error)? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key.code, key.modifiers);
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Fold finished replies in and reset the scroll when the document changes.
    pub fn tick(&mut self) {
        self.controller.pump();
        let current = self
            .controller
            .navigator()
            .viewer()
            .filename()
            .map(str::to_string);
        if current != self.scrolled_file {
            self.scroll = 0;
            self.scrolled_file = current;
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if self.dialog.is_some() {
            if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                self.should_quit = true;
                return;
            }
            self.handle_dialog_key(code);
            return;
        }

        let Some(action) = self.keymap.lookup(code, modifiers) else {
            return;
        };
        tracing::trace!(?action, "key");
        match action {
            UiAction::Nav(action) => self.controller.dispatch_or_notify(action),
            UiAction::OpenFilter => {
                let dialog = self
                    .controller
                    .navigator()
                    .last_filter_request()
                    .map(FilterDialog::from_request)
                    .unwrap_or_default();
                self.dialog = Some(Dialog::Filter(dialog));
            }
            UiAction::OpenExport => self.dialog = Some(Dialog::Export(ExportDialog::default())),
            UiAction::DismissNotice => {
                self.controller.dismiss_notice();
            }
            UiAction::ScrollUp => self.scroll = self.scroll.saturating_sub(SCROLL_PAGE),
            UiAction::ScrollDown => {
                let max = self.controller.navigator().viewer().lines().len();
                let max = u16::try_from(max.saturating_sub(1)).unwrap_or(u16::MAX);
                self.scroll = self.scroll.saturating_add(SCROLL_PAGE).min(max);
            }
            UiAction::WidenSidebar => self.layout.widen(self.area.width),
            UiAction::NarrowSidebar => self.layout.narrow(self.area.width),
            UiAction::Quit => self.should_quit = true,
        }
    }

    fn handle_dialog_key(&mut self, code: KeyCode) {
        match self.dialog.as_mut() {
            Some(Dialog::Filter(d)) => match d.handle_key(code) {
                DialogOutcome::Open => {}
                DialogOutcome::Cancel => self.dialog = None,
                DialogOutcome::Submit(request) => {
                    self.dialog = None;
                    if let Err(e) = self.controller.filter(request) {
                        self.controller
                            .notify(Notice::from_diagnostic("Filter rejected", &e));
                    }
                }
            },
            Some(Dialog::Export(d)) => match d.handle_key(code) {
                DialogOutcome::Open => {}
                DialogOutcome::Cancel => self.dialog = None,
                DialogOutcome::Submit(marks) => {
                    self.dialog = None;
                    if let Err(e) = self.controller.export(marks) {
                        self.controller
                            .notify(Notice::from_diagnostic("Export rejected", &e));
                    }
                }
            },
            None => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let body = widgets::body_area(self.area);
        self.layout.on_mouse(mouse, body);
    }

    /// Whether a quit key has been pressed.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    /// Dispatch outside the key table.
    pub fn dispatch(&mut self, action: Action) {
        self.controller.dispatch_or_notify(action);
    }
}

fn terminal_error(e: std::io::Error) -> DocmarkError {
    DocmarkError::Terminal {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::mark::Mark;
    use crate::navigator::InlineExecutor;
    use crate::paths::DocmarkPaths;

    fn tui(files: &[(&str, &str)]) -> (tempfile::TempDir, ReviewTui<InlineExecutor<DocmarkClient>>) {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = DocmarkPaths::new(tmp.path());
        paths.ensure_dirs().unwrap();
        for (name, body) in files {
            std::fs::write(paths.documents_dir.join(name), body).unwrap();
        }
        let client = DocmarkClient::local(Catalog::open(&paths).unwrap());
        let mut tui =
            ReviewTui::new(InlineExecutor::new(client), &Settings::default(), "test".into())
                .unwrap();
        tui.dispatch(Action::Refresh);
        tui.tick();
        (tmp, tui)
    }

    fn press(tui: &mut ReviewTui<InlineExecutor<DocmarkClient>>, code: KeyCode) {
        tui.handle_key(code, KeyModifiers::NONE);
        tui.tick();
    }

    #[test]
    fn arrow_keys_mark_and_navigate() {
        let (_tmp, mut tui) = tui(&[("a.txt", "a"), ("b.txt", "b"), ("c.txt", "c")]);
        press(&mut tui, KeyCode::Left);
        let nav = tui.controller().navigator();
        assert_eq!(nav.cursor(), Some(1));
        assert_eq!(nav.session().mark_of("a.txt"), Some(Mark::A));

        press(&mut tui, KeyCode::Right);
        assert_eq!(tui.controller().navigator().session().mark_of("b.txt"), Some(Mark::B));

        press(&mut tui, KeyCode::Up);
        press(&mut tui, KeyCode::Up);
        assert_eq!(tui.controller().navigator().cursor(), Some(0));
    }

    #[test]
    fn filter_dialog_submits_and_reports() {
        let (_tmp, mut tui) = tui(&[("inv_1.txt", "a"), ("inv_2.txt", "b"), ("memo.txt", "c")]);
        press(&mut tui, KeyCode::Char('f'));
        assert!(matches!(tui.dialog(), Some(Dialog::Filter(_))));

        for c in "^inv".chars() {
            press(&mut tui, KeyCode::Char(c));
        }
        press(&mut tui, KeyCode::Enter);
        assert!(tui.dialog().is_none());

        let nav = tui.controller().navigator();
        assert_eq!(nav.last_filter().unwrap().updated_count, 2);
        assert_eq!(nav.session().mark_of("inv_2.txt"), Some(Mark::A));
        assert_eq!(nav.session().mark_of("memo.txt"), None);
    }

    #[test]
    fn invalid_filter_keeps_dialog_open() {
        let (_tmp, mut tui) = tui(&[("a.txt", "a")]);
        press(&mut tui, KeyCode::Char('f'));
        press(&mut tui, KeyCode::Char('['));
        press(&mut tui, KeyCode::Enter);
        let Some(Dialog::Filter(d)) = tui.dialog() else {
            panic!("dialog closed");
        };
        assert!(d.error.is_some());
        assert!(tui.controller().navigator().last_filter().is_none());
    }

    #[test]
    fn terminal_failures_keep_their_diagnostic_code() {
        use miette::Diagnostic;

        let err = terminal_error(std::io::Error::other("not a tty"));
        assert_eq!(err.to_string(), "terminal error: not a tty");
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("docmark::terminal")
        );
    }

    #[test]
    fn escape_dismisses_notice_then_quit() {
        let (_tmp, mut tui) = tui(&[("a.txt", "a")]);
        press(&mut tui, KeyCode::Left);
        assert!(tui.controller().navigator().notice().is_some());
        press(&mut tui, KeyCode::Esc);
        assert!(tui.controller().navigator().notice().is_none());

        press(&mut tui, KeyCode::Char('q'));
        assert!(tui.should_quit());
    }
}
