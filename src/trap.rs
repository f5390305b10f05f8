//! Trap table: `trap` built-in state plus the async-signal-safe pending-flag
//! mechanism described in spec.md §5/§9 ("Signals as concurrency events").
//!
//! Grounded on `examples/magicant-yash-rs/yash-env/src/system/real.rs`'s
//! `CAUGHT_SIGNALS: [AtomicIsize; N]` + `extern "C" fn catch_signal`
//! pattern: the actual OS handler only flips a flag; the trap action
//! string is tokenized and executed later at a safe point, never from
//! inside the handler itself.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::Signal;

/// Pseudo-signals `trap` accepts that are not real OS signals (spec.md
/// §5/§9): fired by the executor itself at the matching lifecycle point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoSignal {
    Err,
    Exit,
    Debug,
}

impl PseudoSignal {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "ERR" => Some(Self::Err),
            "EXIT" => Some(Self::Exit),
            "DEBUG" => Some(Self::Debug),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Err => "ERR",
            Self::Exit => "EXIT",
            Self::Debug => "DEBUG",
        }
    }
}

/// What to do when a trap fires.
#[derive(Debug, Clone)]
pub enum TrapAction {
    /// Default disposition (`trap - SIG` or never set).
    Default,
    /// Ignore the signal entirely (`trap '' SIG`).
    Ignore,
    /// Execute this shell source when the trap fires.
    Action(String),
}

/// One flag per catchable signal, set from the real OS handler. 64 covers
/// every POSIX signal number on Linux with room to spare; indices beyond
/// what `nix::sys::signal::Signal` enumerates are simply unused.
const SIGNAL_SLOTS: usize = 64;

struct SignalFlags([AtomicBool; SIGNAL_SLOTS]);

impl SignalFlags {
    const fn new() -> Self {
        #[allow(clippy::declare_interior_mutable_const)]
        const FALSE: AtomicBool = AtomicBool::new(false);
        Self([FALSE; SIGNAL_SLOTS])
    }
}

static CAUGHT_SIGNALS: SignalFlags = SignalFlags::new();

extern "C" fn catch_signal(signum: libc::c_int) {
    if (0..SIGNAL_SLOTS as i32).contains(&signum) {
        CAUGHT_SIGNALS.0[signum as usize].store(true, Ordering::Relaxed);
    }
}

/// Installs the self-pipe-free flag-setting handler for `signal`. Does not
/// itself register a shell trap action — callers update `TrapTable`
/// separately.
pub fn install_os_handler(signal: Signal) -> nix::Result<()> {
    use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet};
    unsafe {
        sigaction(
            signal,
            &SigAction::new(
                SigHandler::Handler(catch_signal),
                SaFlags::SA_RESTART,
                SigSet::empty(),
            ),
        )?;
    }
    Ok(())
}

/// Restores `signal`'s OS disposition to `SIG_DFL` (`trap - SIG`): a
/// previously-trapped signal must stop being swallowed by the flag-setting
/// handler once the trap is reset, or the process never actually
/// terminates/reacts to it again.
pub fn install_os_default(signal: Signal) -> nix::Result<()> {
    use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet};
    unsafe {
        sigaction(signal, &SigAction::new(SigHandler::SigDfl, SaFlags::SA_RESTART, SigSet::empty()))?;
    }
    Ok(())
}

/// Installs `SIG_IGN` for `signal` (`trap '' SIG`): ignored outright, not
/// routed through the pending-flag handler since no trap body will ever
/// run for it.
pub fn install_os_ignore(signal: Signal) -> nix::Result<()> {
    use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet};
    unsafe {
        sigaction(signal, &SigAction::new(SigHandler::SigIgn, SaFlags::SA_RESTART, SigSet::empty()))?;
    }
    Ok(())
}

/// Checks and clears the pending flag for `signal`. Call only from a safe
/// point (spec.md §5: between commands, after `wait`, before each chain).
pub fn take_pending(signal: Signal) -> bool {
    let idx = signal as i32;
    if (0..SIGNAL_SLOTS as i32).contains(&idx) {
        CAUGHT_SIGNALS.0[idx as usize].swap(false, Ordering::Relaxed)
    } else {
        false
    }
}

#[derive(Debug, Default)]
pub struct TrapTable {
    signals: HashMap<Signal, TrapAction>,
    pseudo: HashMap<PseudoSignal, TrapAction>,
}

impl TrapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_signal(&mut self, signal: Signal, action: TrapAction) {
        match action {
            TrapAction::Default => {
                self.signals.remove(&signal);
            }
            _ => {
                self.signals.insert(signal, action);
            }
        }
    }

    pub fn set_pseudo(&mut self, pseudo: PseudoSignal, action: TrapAction) {
        match action {
            TrapAction::Default => {
                self.pseudo.remove(&pseudo);
            }
            _ => {
                self.pseudo.insert(pseudo, action);
            }
        }
    }

    pub fn signal_action(&self, signal: Signal) -> Option<&TrapAction> {
        self.signals.get(&signal)
    }

    pub fn pseudo_action(&self, pseudo: PseudoSignal) -> Option<&TrapAction> {
        self.pseudo.get(&pseudo)
    }

    pub fn iter_signals(&self) -> impl Iterator<Item = (&Signal, &TrapAction)> {
        self.signals.iter()
    }

    pub fn iter_pseudo(&self) -> impl Iterator<Item = (&PseudoSignal, &TrapAction)> {
        self.pseudo.iter()
    }
}
