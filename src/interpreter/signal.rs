use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use super::error::{Result, RuntimeError};
use super::value::Value;

/// An external value source that takes part in the dependency graph under
/// its identity, the way a variable does under its name.
pub trait Signal: std::fmt::Debug {
    /// Stable key used as a graph vertex.
    fn identity(&self) -> String;
    fn value(&self) -> Result<Value>;
}

/// `$file(path)`: the file's text contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSignal {
    path: PathBuf,
}

impl FileSignal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSignal { path: path.into() }
    }
}

impl Signal for FileSignal {
    fn identity(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn value(&self) -> Result<Value> {
        std::fs::read_to_string(&self.path)
            .map(Value::String)
            .map_err(|e| RuntimeError::SignalError {
                identity: self.identity(),
                message: e.to_string(),
            })
    }
}

/// Build a signal from its kind (the name after `$`) and evaluated arguments.
pub fn construct(kind: &str, args: &[Value]) -> Result<Box<dyn Signal>> {
    match kind {
        "file" => match args {
            [Value::String(path)] => Ok(Box::new(FileSignal::new(path))),
            [other] => Err(RuntimeError::type_error(format!(
                "$file expects a String path, got {}",
                other.kind()
            ))),
            _ => Err(RuntimeError::ArityMismatch {
                name: "$file".to_string(),
                expected: 1,
                found: args.len(),
            }),
        },
        _ => Err(RuntimeError::UndefinedSignalType { kind: kind.to_string() }),
    }
}

/// Cloneable handle that lets other threads report a changed signal.
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: Sender<String>,
}

impl SignalSender {
    /// Queue a change notification. Returns `false` once the interpreter is gone.
    pub fn notify(&self, identity: impl Into<String>) -> bool {
        self.tx.send(identity.into()).is_ok()
    }
}

/// Signals seen so far plus the queue of pushed change notifications.
///
/// Notifications are only ever applied by the interpreter between
/// statements, so a push can never interleave with an assignment.
#[derive(Debug)]
pub struct SignalBridge {
    sources: BTreeMap<String, Box<dyn Signal>>,
    tx: Sender<String>,
    rx: Receiver<String>,
}

impl Default for SignalBridge {
    fn default() -> Self {
        let (tx, rx) = mpsc::channel();
        SignalBridge { sources: BTreeMap::new(), tx, rx }
    }
}

impl SignalBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a signal read by an expression and return its identity.
    pub fn register(&mut self, signal: Box<dyn Signal>) -> String {
        let identity = signal.identity();
        self.sources.entry(identity.clone()).or_insert(signal);
        identity
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn get(&self, identity: &str) -> Option<&dyn Signal> {
        self.sources.get(identity).map(|s| s.as_ref())
    }

    pub fn sender(&self) -> SignalSender {
        SignalSender { tx: self.tx.clone() }
    }

    /// Drain queued notifications without blocking.
    pub fn pending(&self) -> Vec<String> {
        self.rx.try_iter().collect()
    }

    /// Wait up to `timeout` for the next notification.
    pub fn next(&self, timeout: Duration) -> Option<String> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_signal_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.txt");
        std::fs::write(&path, "hello").unwrap();
        let signal = FileSignal::new(&path);
        assert_eq!(signal.value().unwrap(), Value::String("hello".into()));
        assert_eq!(signal.identity(), format!("file:{}", path.display()));
    }

    #[test]
    fn missing_file_is_a_signal_error() {
        let signal = FileSignal::new("/definitely/not/here.txt");
        assert!(matches!(signal.value(), Err(RuntimeError::SignalError { .. })));
    }

    #[test]
    fn construct_rejects_unknown_kinds_and_bad_args() {
        assert_eq!(
            construct("http", &[]).unwrap_err(),
            RuntimeError::UndefinedSignalType { kind: "http".into() }
        );
        assert!(matches!(
            construct("file", &[Value::Integer(1)]),
            Err(RuntimeError::TypeError { .. })
        ));
        assert!(matches!(
            construct("file", &[]),
            Err(RuntimeError::ArityMismatch { expected: 1, found: 0, .. })
        ));
    }

    #[test]
    fn register_is_keyed_by_identity() {
        let mut bridge = SignalBridge::new();
        let a = bridge.register(Box::new(FileSignal::new("a.txt")));
        let again = bridge.register(Box::new(FileSignal::new("a.txt")));
        bridge.register(Box::new(FileSignal::new("b.txt")));
        assert_eq!(a, again);
        assert_eq!(bridge.identities().collect::<Vec<_>>(), vec!["file:a.txt", "file:b.txt"]);
        assert!(bridge.get("file:a.txt").is_some());
    }

    #[test]
    fn notifications_cross_threads() {
        let bridge = SignalBridge::new();
        let sender = bridge.sender();
        std::thread::spawn(move || {
            sender.notify("file:a.txt");
            sender.notify("file:b.txt");
        })
        .join()
        .unwrap();
        assert_eq!(bridge.pending(), vec!["file:a.txt", "file:b.txt"]);
        assert!(bridge.pending().is_empty());
    }

    #[test]
    fn next_waits_for_a_late_notification() {
        let bridge = SignalBridge::new();
        let sender = bridge.sender();
        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            sender.notify("file:late.txt");
        });
        assert_eq!(bridge.next(Duration::from_secs(5)).as_deref(), Some("file:late.txt"));
        worker.join().unwrap();
        assert_eq!(bridge.next(Duration::from_millis(10)), None);
    }
}
