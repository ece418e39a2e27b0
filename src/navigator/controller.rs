//! Controller: one navigator plus the executor that runs its commands.

use crate::catalog::FilterRequest;
use crate::mark::Mark;
use crate::navigator::executor::Executor;
use crate::navigator::notice::Notice;
use crate::navigator::{Command, NavResult, Navigator};

/// Input-independent operations a front end can bind keys to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Previous,
    Next,
    Mark(Mark),
    SaveMark,
    Refresh,
    Open(usize),
}

/// Drives a [`Navigator`] with an [`Executor`].
///
/// Front ends call the operations, then [`Controller::pump`] each tick to
/// fold finished replies back in.
pub struct Controller<E: Executor> {
    navigator: Navigator,
    executor: E,
}

impl<E: Executor> Controller<E> {
    pub fn new(executor: E) -> Self {
        Self {
            navigator: Navigator::new(),
            executor,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn submit_all(&mut self, commands: Vec<Command>) {
        for command in commands {
            self.executor.submit(command);
        }
    }

    pub fn refresh(&mut self) {
        let commands = self.navigator.refresh();
        self.submit_all(commands);
    }

    pub fn open(&mut self, index: usize) -> NavResult<()> {
        let commands = self.navigator.open(index)?;
        self.submit_all(commands);
        Ok(())
    }

    pub fn step(&mut self, delta: isize) {
        let commands = self.navigator.step(delta);
        self.submit_all(commands);
    }

    pub fn mark_current_and_advance(&mut self, mark: Mark) -> NavResult<()> {
        let commands = self.navigator.mark_current_and_advance(mark)?;
        self.submit_all(commands);
        Ok(())
    }

    pub fn save_current_mark(&mut self) -> NavResult<()> {
        let commands = self.navigator.save_current_mark()?;
        self.submit_all(commands);
        Ok(())
    }

    pub fn filter(&mut self, request: FilterRequest) -> NavResult<()> {
        let commands = self.navigator.filter(request)?;
        self.submit_all(commands);
        Ok(())
    }

    pub fn export(&mut self, marks: impl IntoIterator<Item = Mark>) -> NavResult<()> {
        let commands = self.navigator.export(marks)?;
        self.submit_all(commands);
        Ok(())
    }

    /// Run the operation bound to `action`.
    pub fn dispatch(&mut self, action: Action) -> NavResult<()> {
        tracing::trace!(?action, "dispatch");
        match action {
            Action::Previous => self.step(-1),
            Action::Next => self.step(1),
            Action::Mark(mark) => self.mark_current_and_advance(mark)?,
            Action::SaveMark => self.save_current_mark()?,
            Action::Refresh => self.refresh(),
            Action::Open(index) => self.open(index)?,
        }
        Ok(())
    }

    /// Like [`Controller::dispatch`], but failures become notices.
    pub fn dispatch_or_notify(&mut self, action: Action) {
        if let Err(e) = self.dispatch(action) {
            self.navigator
                .push_notice(Notice::from_diagnostic("Cannot do that", &e));
        }
    }

    pub fn notify(&mut self, notice: Notice) {
        self.navigator.push_notice(notice);
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.navigator.dismiss_notice()
    }

    /// Apply every ready reply, submitting follow-ups. Returns how many
    /// replies were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(reply) = self.executor.try_next() {
            let follow = self.navigator.apply(reply);
            self.submit_all(follow);
            applied += 1;
        }
        applied
    }

    /// No commands outstanding.
    pub fn is_idle(&self) -> bool {
        self.executor.in_flight() == 0
    }
}
