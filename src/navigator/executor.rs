//! Executors run navigator commands against a review service.
//!
//! [`InlineExecutor`] runs each command as it is submitted, for tests and
//! scripted use. [`WorkerExecutor`] hands commands to a background thread so the
//! terminal loop never blocks on HTTP or disk, and polls for replies.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::thread;

use crate::client::{ClientError, ReviewService};
use crate::navigator::command::{Command, Reply, execute};
use crate::navigator::{NavResult, NavigationError};

/// Something that accepts commands and hands back their replies.
pub trait Executor {
    /// Queue a command. Never blocks on the command's I/O unless the
    /// executor is inline.
    fn submit(&mut self, command: Command);

    /// Next finished reply, if one is ready.
    fn try_next(&mut self) -> Option<Reply>;

    /// Commands submitted whose replies have not been taken yet.
    fn in_flight(&self) -> usize;
}

// ── InlineExecutor ──────────────────────────────────────────────────────

/// Executes synchronously inside `submit`.
pub struct InlineExecutor<S> {
    service: S,
    ready: VecDeque<Reply>,
}

impl<S: ReviewService> InlineExecutor<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            ready: VecDeque::new(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

impl<S: ReviewService> Executor for InlineExecutor<S> {
    fn submit(&mut self, command: Command) {
        let reply = execute(&self.service, command);
        self.ready.push_back(reply);
    }

    fn try_next(&mut self) -> Option<Reply> {
        self.ready.pop_front()
    }

    fn in_flight(&self) -> usize {
        self.ready.len()
    }
}

// ── WorkerExecutor ──────────────────────────────────────────────────────

/// Handle to a background thread that owns the service.
///
/// Commands run in submission order, so a refresh queued after a mark
/// always observes that mark.
pub struct WorkerExecutor {
    tx: Option<mpsc::Sender<Command>>,
    rx: mpsc::Receiver<Reply>,
    /// Replies synthesised locally after the worker went away.
    failed: VecDeque<Reply>,
    in_flight: usize,
    /// Set once the worker thread has exited.
    disconnected: bool,
    handle: Option<thread::JoinHandle<()>>,
}

impl WorkerExecutor {
    /// Spawn the worker thread. The service moves onto it.
    pub fn spawn<S>(service: S) -> NavResult<Self>
    where
        S: ReviewService + Send + 'static,
    {
        // Channels: UI → worker (commands), worker → UI (replies).
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (reply_tx, reply_rx) = mpsc::channel::<Reply>();

        let handle = thread::Builder::new()
            .name("docmark-worker".into())
            .spawn(move || {
                tracing::debug!("review worker started");
                for command in cmd_rx {
                    let reply = execute(&service, command);
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
                tracing::debug!("review worker stopped");
            })
            .map_err(|e| NavigationError::Worker {
                message: format!("failed to spawn worker thread: {e}"),
            })?;

        Ok(Self {
            tx: Some(cmd_tx),
            rx: reply_rx,
            failed: VecDeque::new(),
            in_flight: 0,
            disconnected: false,
            handle: Some(handle),
        })
    }

    /// Whether the worker thread has gone away.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

fn worker_gone() -> ClientError {
    ClientError::Request {
        message: "review worker stopped".into(),
    }
}

impl Executor for WorkerExecutor {
    fn submit(&mut self, command: Command) {
        let Some(tx) = &self.tx else {
            self.failed.push_back(command.failed(worker_gone()));
            return;
        };
        match tx.send(command) {
            Ok(()) => self.in_flight += 1,
            Err(mpsc::SendError(command)) => {
                self.disconnected = true;
                self.failed.push_back(command.failed(worker_gone()));
            }
        }
    }

    fn try_next(&mut self) -> Option<Reply> {
        if let Some(reply) = self.failed.pop_front() {
            return Some(reply);
        }
        match self.rx.try_recv() {
            Ok(reply) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(reply)
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                if !self.disconnected || self.in_flight > 0 {
                    // Whatever was in flight is lost; report it once.
                    self.disconnected = true;
                    self.in_flight = 0;
                    Some(Reply::Catalog(Err(worker_gone())))
                } else {
                    None
                }
            }
            Err(mpsc::TryRecvError::Empty) => None,
        }
    }

    fn in_flight(&self) -> usize {
        self.in_flight + self.failed.len()
    }
}

impl Drop for WorkerExecutor {
    fn drop(&mut self) {
        // Closing the command channel ends the worker loop.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::client::DocmarkClient;
    use crate::paths::DocmarkPaths;
    use std::time::{Duration, Instant};

    fn client(files: &[(&str, &str)]) -> (tempfile::TempDir, DocmarkClient) {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = DocmarkPaths::new(tmp.path());
        paths.ensure_dirs().unwrap();
        for (name, body) in files {
            std::fs::write(paths.documents_dir.join(name), body).unwrap();
        }
        (tmp, DocmarkClient::local(Catalog::open(&paths).unwrap()))
    }

    fn wait_for(exec: &mut WorkerExecutor) -> Reply {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(reply) = exec.try_next() {
                return reply;
            }
            assert!(Instant::now() < deadline, "worker reply timed out");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn inline_executes_on_submit() {
        let (_tmp, client) = client(&[("a.txt", "alpha")]);
        let mut exec = InlineExecutor::new(client);
        exec.submit(Command::Refresh);
        assert_eq!(exec.in_flight(), 1);

        let Some(Reply::Catalog(Ok(listing))) = exec.try_next() else {
            panic!("expected catalog reply");
        };
        assert_eq!(listing.files, vec!["a.txt"]);
        assert_eq!(exec.in_flight(), 0);
        assert!(exec.try_next().is_none());
    }

    #[test]
    fn worker_replies_in_submission_order() {
        let (_tmp, client) = client(&[("a.txt", "alpha")]);
        let mut exec = WorkerExecutor::spawn(client).unwrap();

        exec.submit(Command::SetMark {
            ticket: 1,
            filename: "a.txt".into(),
            mark: crate::mark::Mark::B,
        });
        exec.submit(Command::Refresh);
        assert_eq!(exec.in_flight(), 2);

        assert!(matches!(wait_for(&mut exec), Reply::MarkSaved { result: Ok(()), .. }));
        let Reply::Catalog(Ok(listing)) = wait_for(&mut exec) else {
            panic!("expected catalog reply");
        };
        assert_eq!(listing.marks.get("a.txt"), Some(&crate::mark::Mark::B));
        assert_eq!(exec.in_flight(), 0);
        assert!(!exec.is_disconnected());
    }
}
