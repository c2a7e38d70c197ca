//! Terminal output.
//!
//! Every line the library prints goes through [`print`]. Callers may use it
//! too, so their progress lines interleave correctly with library output.
//!
//! Lines are offered to each registered [`TerminalListener`]. A line reaches
//! stdout if no listener is registered, or if at least one listener asks for
//! it. [`set_output`] switches terminal output off entirely.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Receives terminal output.
pub trait TerminalListener {
    /// Called for each printed line (without the trailing newline).
    ///
    /// Return `true` to have the line written to stdout as well. Listeners
    /// must not print from inside this call.
    fn output(&mut self, line: &str) -> bool;
}

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Terminal {
    enabled: bool,
    listeners: Vec<(ListenerId, Box<dyn TerminalListener>)>,
    next_id: u64,
}

thread_local! {
    static TERMINAL: RefCell<Terminal> = const {
        RefCell::new(Terminal {
            enabled: true,
            listeners: Vec::new(),
            next_id: 0,
        })
    };
}

/// Print one line of terminal output.
pub fn print(line: &str) {
    let listeners = TERMINAL.with(|t| {
        let mut t = t.borrow_mut();
        if t.enabled {
            Some(std::mem::take(&mut t.listeners))
        } else {
            None
        }
    });
    let Some(mut listeners) = listeners else {
        return;
    };

    let mut to_console = listeners.is_empty();
    for (_, listener) in listeners.iter_mut() {
        to_console |= listener.output(line);
    }

    TERMINAL.with(|t| {
        let mut t = t.borrow_mut();
        // keep listeners registered while we were dispatching
        listeners.append(&mut t.listeners);
        t.listeners = listeners;
    });

    if to_console {
        let _ = writeln!(std::io::stdout().lock(), "{line}");
    }
}

/// Enable or disable terminal output. Returns the previous setting.
pub fn set_output(enabled: bool) -> bool {
    TERMINAL.with(|t| std::mem::replace(&mut t.borrow_mut().enabled, enabled))
}

/// Register a listener.
pub fn add_listener(listener: Box<dyn TerminalListener>) -> ListenerId {
    TERMINAL.with(|t| {
        let mut t = t.borrow_mut();
        let id = ListenerId(t.next_id);
        t.next_id += 1;
        t.listeners.push((id, listener));
        id
    })
}

/// Remove a listener. Returns `true` if it was registered.
pub fn remove_listener(id: ListenerId) -> bool {
    TERMINAL.with(|t| {
        let mut t = t.borrow_mut();
        let before = t.listeners.len();
        t.listeners.retain(|(lid, _)| *lid != id);
        t.listeners.len() != before
    })
}

/// Listener that records everything printed.
///
/// Clones share the same buffer, so one clone can be registered while
/// another is kept for reading.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    buffer: Rc<RefCell<String>>,
    echo: bool,
}

impl Capture {
    /// Capture output without echoing it to stdout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture output and still let it reach stdout.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// Everything captured so far, one line per `\n`.
    pub fn contents(&self) -> String {
        self.buffer.borrow().clone()
    }

    /// Register a clone of this capture with the terminal.
    pub fn attach(&self) -> ListenerId {
        add_listener(Box::new(self.clone()))
    }
}

impl TerminalListener for Capture {
    fn output(&mut self, line: &str) -> bool {
        let mut buffer = self.buffer.borrow_mut();
        buffer.push_str(line);
        buffer.push('\n');
        self.echo
    }
}
