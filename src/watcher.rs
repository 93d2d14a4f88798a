//! File system watcher for watch mode

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

const DEBOUNCE_MS: u64 = 300;

/// Watches one answers file and reports when it is written
pub struct AnswersWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<notify::Event>>,
    target: PathBuf,
}

fn is_create_or_modify(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

impl AnswersWatcher {
    /// Start watching the given answers file. The parent directory is
    /// watched so editors that replace the file are still seen.
    pub fn watch(path: &Path) -> notify::Result<Self> {
        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_millis(DEBOUNCE_MS)),
        )?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            target: path.to_path_buf(),
        })
    }

    /// Whether an event path refers to the watched file
    pub fn is_target(target: &Path, candidate: &Path) -> bool {
        match (target.file_name(), candidate.file_name()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn event_touches_target(&self, event: &notify::Event) -> bool {
        is_create_or_modify(&event.kind)
            && event
                .paths
                .iter()
                .any(|p| Self::is_target(&self.target, p))
    }

    /// Block until the watched file changes, then drain events for
    /// DEBOUNCE_MS. Returns false when the watcher has shut down.
    pub fn wait_for_change(&self) -> bool {
        loop {
            match self.receiver.recv() {
                Ok(Ok(event)) if self.event_touches_target(&event) => break,
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => {
                    log::debug!("watch error: {}", e);
                    continue;
                }
                Err(_) => return false,
            }
        }

        std::thread::sleep(Duration::from_millis(DEBOUNCE_MS));
        while self.receiver.try_recv().is_ok() {}
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_target_matches_file_name() {
        assert!(AnswersWatcher::is_target(
            Path::new("answers.json"),
            Path::new("/home/me/answers.json")
        ));
        assert!(!AnswersWatcher::is_target(
            Path::new("answers.json"),
            Path::new("/home/me/other.json")
        ));
    }

    #[test]
    fn test_create_or_modify() {
        assert!(is_create_or_modify(&EventKind::Create(
            notify::event::CreateKind::File
        )));
        assert!(is_create_or_modify(&EventKind::Modify(
            notify::event::ModifyKind::Any
        )));
        assert!(!is_create_or_modify(&EventKind::Remove(
            notify::event::RemoveKind::File
        )));
    }
}
