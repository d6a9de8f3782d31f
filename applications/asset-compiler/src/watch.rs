//! Debounced rebuilds driven by filesystem events.

use std::{
    fs,
    path::{Component, Path, PathBuf},
    sync::mpsc::{Receiver, RecvTimeoutError, Sender},
    time::{Duration, Instant},
};

use anyhow::Context;
use log::{debug, error, info, warn};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WatchMessage {
    /// Something below the assets directory changed.
    Changed,
    /// Ctrl-C was pressed.
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WatchState {
    Idle,
    /// Waiting for the filesystem to settle down.
    Pending { deadline: Instant },
    Writing,
}

/// Coalesces bursts of change notifications into a single rebuild.
#[derive(Debug)]
pub(crate) struct Debouncer {
    delay: Duration,
    state: WatchState,
}

impl Debouncer {
    /// Starts in [`WatchState::Writing`], as the first build runs unconditionally.
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: WatchState::Writing,
        }
    }

    pub(crate) fn state(&self) -> WatchState {
        self.state
    }

    /// Starts or restarts the quiet period.
    pub(crate) fn changed(&mut self, now: Instant) {
        self.state = WatchState::Pending {
            deadline: now + self.delay,
        };
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        match self.state {
            WatchState::Pending { deadline } => Some(deadline),
            WatchState::Idle | WatchState::Writing => None,
        }
    }

    /// Returns `true` and enters [`WatchState::Writing`] once the quiet period is over.
    pub(crate) fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            WatchState::Pending { deadline } if now >= deadline => {
                self.state = WatchState::Writing;
                true
            }
            WatchState::Idle | WatchState::Pending { .. } | WatchState::Writing => false,
        }
    }

    /// Like [`Self::poll`] but ignores the deadline; used when shutting down.
    pub(crate) fn flush(&mut self) -> bool {
        match self.state {
            WatchState::Pending { .. } => {
                self.state = WatchState::Writing;
                true
            }
            WatchState::Idle | WatchState::Writing => false,
        }
    }

    pub(crate) fn finished(&mut self) {
        if self.state() == WatchState::Writing {
            self.state = WatchState::Idle;
        }
    }
}

/// Processes `receiver` until shutdown and returns the number of rebuilds.
///
/// Failing rebuilds are logged; the loop keeps going as the next change may fix them.
pub(crate) fn run(
    receiver: &Receiver<WatchMessage>,
    debouncer: &mut Debouncer,
    mut rebuild: impl FnMut() -> anyhow::Result<()>,
) -> usize {
    let mut rebuilds = 0;
    let mut run_rebuild = |debouncer: &mut Debouncer| {
        if let Err(error) = rebuild() {
            error!("{error:#}");
        }
        debouncer.finished();
        rebuilds += 1;
    };

    loop {
        let message = match debouncer.deadline() {
            None => receiver.recv().ok(),
            Some(deadline) => {
                match receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(message) => Some(message),
                    Err(RecvTimeoutError::Timeout) => {
                        if debouncer.poll(Instant::now()) {
                            run_rebuild(debouncer);
                        }
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => None,
                }
            }
        };

        match message {
            Some(WatchMessage::Changed) => debouncer.changed(Instant::now()),
            Some(WatchMessage::Shutdown) | None => {
                if debouncer.flush() {
                    run_rebuild(debouncer);
                }
                break;
            }
        }
    }

    rebuilds
}

/// Decides which filesystem events are worth a rebuild.
#[derive(Debug)]
pub(crate) struct EventFilter {
    assets_dir: PathBuf,
    output_file: PathBuf,
}

impl EventFilter {
    pub(crate) fn new(assets_dir: &Path, output_file: &Path) -> Self {
        // the backend reports canonical paths on some platforms
        let canonical = |path: &Path| fs::canonicalize(path).unwrap_or_else(|_| path.to_owned());
        Self {
            assets_dir: canonical(assets_dir),
            output_file: canonical(output_file),
        }
    }

    pub(crate) fn is_relevant(&self, event: &notify::Event) -> bool {
        if event.need_rescan() {
            return true;
        }
        if !(event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove()) {
            return false;
        }
        event.paths.iter().any(|path| self.is_relevant_path(path))
    }

    fn is_relevant_path(&self, path: &Path) -> bool {
        if path == self.output_file {
            return false;
        }

        let relative = path.strip_prefix(&self.assets_dir).unwrap_or(path);
        !relative.components().any(|component| match component {
            Component::Normal(name) => name.to_string_lossy().starts_with('.'),
            Component::Prefix(_) | Component::RootDir | Component::CurDir | Component::ParentDir => false,
        })
    }
}

/// Watches the assets directory recursively and forwards relevant changes to `sender`.
///
/// Watching stops when the returned watcher is dropped.
pub(crate) fn start(
    assets_dir: &Path,
    output_file: &Path,
    sender: Sender<WatchMessage>,
) -> anyhow::Result<RecommendedWatcher> {
    let filter = EventFilter::new(assets_dir, output_file);
    let watched_dir = filter.assets_dir.clone();

    let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
        match result {
            Ok(event) if filter.is_relevant(&event) => {
                debug!("change detected: {:?} {:?}", event.kind, event.paths);
                if sender.send(WatchMessage::Changed).is_err() {
                    debug!("watch loop has already exited");
                }
            }
            Ok(_) => {}
            Err(error) => warn!("filesystem watcher reported an error: {error}"),
        }
    })
    .context("failed to create filesystem watcher")?;

    watcher
        .watch(&watched_dir, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", watched_dir.display()))?;
    info!("watching {} for changes", watched_dir.display());

    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::{
        event::{AccessKind, CreateKind, ModifyKind},
        Event, EventKind,
    };
    use std::{sync::mpsc, thread};

    #[test]
    fn debouncer_transitions() {
        let delay = Duration::from_millis(100);
        let start = Instant::now();
        let mut debouncer = Debouncer::new(delay);
        assert_eq!(debouncer.state(), WatchState::Writing);

        debouncer.finished();
        assert_eq!(debouncer.state(), WatchState::Idle);
        assert!(!debouncer.poll(start + delay * 10), "idle never fires");

        debouncer.changed(start);
        debouncer.changed(start + Duration::from_millis(60));
        assert_eq!(
            debouncer.deadline(),
            Some(start + Duration::from_millis(160)),
            "every change restarts the quiet period"
        );
        assert!(!debouncer.poll(start + Duration::from_millis(120)));
        assert!(debouncer.poll(start + Duration::from_millis(160)));
        assert_eq!(debouncer.state(), WatchState::Writing);
        assert!(!debouncer.poll(start + Duration::from_millis(500)), "fires once");

        debouncer.finished();
        assert_eq!(debouncer.state(), WatchState::Idle);
        assert!(!debouncer.flush(), "nothing to flush while idle");
    }

    #[test]
    fn burst_of_changes_rebuilds_once() {
        let (sender, receiver) = mpsc::channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(200));
        debouncer.finished();

        let sender_thread = thread::spawn(move || {
            for _ in 0..3 {
                sender.send(WatchMessage::Changed).unwrap();
                thread::sleep(Duration::from_millis(10));
            }
            thread::sleep(Duration::from_millis(800));
            sender.send(WatchMessage::Shutdown).unwrap();
        });

        let mut calls = 0;
        let rebuilds = run(&receiver, &mut debouncer, || {
            calls += 1;
            Ok(())
        });
        sender_thread.join().unwrap();

        assert_eq!(rebuilds, 1);
        assert_eq!(calls, 1);
        assert_eq!(debouncer.state(), WatchState::Idle);
    }

    #[test]
    fn separate_bursts_rebuild_separately() {
        let (sender, receiver) = mpsc::channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        debouncer.finished();

        let sender_thread = thread::spawn(move || {
            sender.send(WatchMessage::Changed).unwrap();
            thread::sleep(Duration::from_millis(500));
            sender.send(WatchMessage::Changed).unwrap();
            thread::sleep(Duration::from_millis(500));
        });

        let rebuilds = run(&receiver, &mut debouncer, || Ok(()));
        sender_thread.join().unwrap();

        assert_eq!(rebuilds, 2);
    }

    #[test]
    fn pending_rebuild_is_flushed_on_shutdown() {
        let (sender, receiver) = mpsc::channel();
        let mut debouncer = Debouncer::new(Duration::from_secs(60));
        debouncer.finished();

        sender.send(WatchMessage::Changed).unwrap();
        sender.send(WatchMessage::Changed).unwrap();
        sender.send(WatchMessage::Shutdown).unwrap();

        let rebuilds = run(&receiver, &mut debouncer, || Ok(()));

        assert_eq!(rebuilds, 1);
    }

    #[test]
    fn failing_rebuild_keeps_watching() {
        let (sender, receiver) = mpsc::channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.finished();

        let sender_thread = thread::spawn(move || {
            sender.send(WatchMessage::Changed).unwrap();
            thread::sleep(Duration::from_millis(300));
            sender.send(WatchMessage::Changed).unwrap();
        });

        let rebuilds = run(&receiver, &mut debouncer, || anyhow::bail!("assets are gone"));
        sender_thread.join().unwrap();

        assert_eq!(rebuilds, 2);
    }

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn filters_hidden_paths_and_output() {
        let filter = EventFilter {
            assets_dir: PathBuf::from("/game/assets"),
            output_file: PathBuf::from("/game/assets/assets.ts"),
        };
        let modify = EventKind::Modify(ModifyKind::Any);

        assert!(filter.is_relevant(&event(modify, "/game/assets/hero.png")));
        assert!(filter.is_relevant(&event(
            EventKind::Create(CreateKind::File),
            "/game/assets/sub/walk_1.png"
        )));
        assert!(!filter.is_relevant(&event(modify, "/game/assets/.hero.png.swp")));
        assert!(!filter.is_relevant(&event(modify, "/game/assets/.git/index")));
        assert!(!filter.is_relevant(&event(modify, "/game/assets/assets.ts")));
        assert!(!filter.is_relevant(&event(
            EventKind::Access(AccessKind::Any),
            "/game/assets/hero.png"
        )));
    }
}
