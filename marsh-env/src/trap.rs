// This file is part of marsh, a modest POSIX shell.
// Copyright (C) 2024 the marsh authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Signal and trap handling
//!
//! The signal handler installed by the shell does nothing but set a
//! per-signal pending flag and a master pending flag, all process-global
//! atomics. The executor polls the master flag at safe points (before
//! executing an AST node, before reading input interactively, and when a
//! blocking call returns `EINTR`) and then runs the recorded trap actions
//! as ordinary commands. Traps never execute inside the handler.
//!
//! The [`TrapSet`] stores the per-condition [`Action`]s. Slot 0 is the
//! EXIT pseudo-signal; the remaining conditions are real signals. Signals
//! ignored when the shell started are remembered and can never be trapped.
//!
//! Signal dispositions are changed through the [`SignalSystem`] trait so
//! the trap logic is testable without touching process state.

use nix::errno::Errno;
use nix::sys::signal::Signal;
use std::collections::BTreeMap;
use std::ffi::c_int;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Number of per-signal pending flag slots
const SIGNAL_SLOTS: usize = 65;

#[allow(clippy::declare_interior_mutable_const)]
const FLAG_INIT: AtomicBool = AtomicBool::new(false);
/// Per-signal pending flags, indexed by signal number
static CAUGHT: [AtomicBool; SIGNAL_SLOTS] = [FLAG_INIT; SIGNAL_SLOTS];
/// Master pending flag
static ANY_CAUGHT: AtomicBool = AtomicBool::new(false);

/// Signal handler: records the signal and returns.
///
/// Only atomic stores happen here; everything else is deferred to the
/// executor's poll points.
extern "C" fn catch_signal(signal_number: c_int) {
    if let Ok(index) = usize::try_from(signal_number) {
        if index < SIGNAL_SLOTS {
            CAUGHT[index].store(true, Ordering::Relaxed);
            ANY_CAUGHT.store(true, Ordering::Relaxed);
        }
    }
}

/// Consumes the master pending flag.
///
/// The executor calls this at each poll point; a `true` result means some
/// signal arrived since the last poll and the per-signal flags should be
/// examined.
#[must_use]
pub fn take_pending() -> bool {
    ANY_CAUGHT.swap(false, Ordering::Relaxed)
}

/// Consumes the pending flag of `SIGCHLD`.
#[must_use]
pub fn take_sigchld() -> bool {
    CAUGHT[Signal::SIGCHLD as usize].swap(false, Ordering::Relaxed)
}

/// Returns the pending flag of `SIGINT` without consuming it.
///
/// A foreground wait aborted by `EINTR` peeks at this to decide whether to
/// stop waiting; the flag itself is consumed either by [`take_sigint`] or
/// by the trap action poll.
#[must_use]
pub fn sigint_pending() -> bool {
    CAUGHT[Signal::SIGINT as usize].load(Ordering::Relaxed)
}

/// Consumes the pending flag of `SIGINT`.
#[must_use]
pub fn take_sigint() -> bool {
    CAUGHT[Signal::SIGINT as usize].swap(false, Ordering::Relaxed)
}

/// What the shell does with a signal
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Disposition {
    /// Restore the default action.
    Default,
    /// Ignore the signal.
    Ignore,
    /// Catch the signal with the shell's flag-setting handler.
    Catch,
}

/// Interface for changing signal dispositions
///
/// The real implementation calls `sigaction`; tests substitute a map.
pub trait SignalSystem {
    /// Sets the disposition of a signal.
    fn set_disposition(&mut self, signal: Signal, disposition: Disposition)
        -> Result<(), Errno>;
}

/// Returns the handler function the real system installs for
/// [`Disposition::Catch`].
#[must_use]
pub fn catching_handler() -> extern "C" fn(c_int) {
    catch_signal
}

/// Condition a trap action is attached to
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Condition {
    /// The shell is exiting (slot 0).
    Exit,
    /// The signal was delivered.
    Signal(Signal),
}

impl Condition {
    /// Returns the slot number: 0 for EXIT, the signal number otherwise.
    #[must_use]
    pub fn number(self) -> c_int {
        match self {
            Condition::Exit => 0,
            Condition::Signal(signal) => signal as c_int,
        }
    }

    /// Finds the condition for a slot number.
    #[must_use]
    pub fn from_number(number: c_int) -> Option<Self> {
        match number {
            0 => Some(Condition::Exit),
            _ => Signal::try_from(number).ok().map(Condition::Signal),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Exit => f.write_str("EXIT"),
            Condition::Signal(signal) => {
                let name = signal.as_str();
                f.write_str(name.strip_prefix("SIG").unwrap_or(name))
            }
        }
    }
}

/// Error parsing a condition name or number
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{name}: invalid condition")]
pub struct ParseConditionError {
    pub name: String,
}

impl FromStr for Condition {
    type Err = ParseConditionError;

    /// Parses a condition: `EXIT`, a signal name with or without the `SIG`
    /// prefix, or a decimal signal number (`0` means EXIT).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseConditionError { name: s.to_owned() };
        if let Ok(number) = s.parse::<c_int>() {
            return Condition::from_number(number).ok_or_else(error);
        }
        let upper = s.to_uppercase();
        if upper == "EXIT" {
            return Ok(Condition::Exit);
        }
        let with_prefix;
        let name = if upper.starts_with("SIG") {
            &upper
        } else {
            with_prefix = format!("SIG{upper}");
            &with_prefix
        };
        Signal::from_str(name)
            .map(Condition::Signal)
            .map_err(|_| error())
    }
}

/// Action performed when a [`Condition`] is met
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Action {
    /// Perform the default action.
    #[default]
    Default,
    /// Pretend the condition was not met.
    Ignore,
    /// Execute a command string.
    Command(Rc<str>),
}

impl Action {
    fn disposition(&self) -> Disposition {
        match self {
            Action::Default => Disposition::Default,
            Action::Ignore => Disposition::Ignore,
            Action::Command(_) => Disposition::Catch,
        }
    }
}

/// Error that may happen in [`TrapSet::set_action`]
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum SetActionError {
    /// The signal has been ignored since the shell started.
    #[error("the signal has been ignored since startup")]
    InitiallyIgnored,
    /// `SIGKILL` cannot be trapped.
    #[error("cannot set a trap for SIGKILL")]
    SigKill,
    /// `SIGSTOP` cannot be trapped.
    #[error("cannot set a trap for SIGSTOP")]
    SigStop,
    /// Error from the underlying system interface.
    #[error(transparent)]
    SystemError(#[from] Errno),
}

/// Collection of trap actions, indexed by condition
#[derive(Clone, Debug, Default)]
pub struct TrapSet {
    /// Actions other than [`Action::Default`], keyed by slot number
    actions: BTreeMap<c_int, Action>,
    /// Signals that were ignored when the shell started
    initially_ignored: Vec<Signal>,
}

impl TrapSet {
    /// Creates a trap set with every condition at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a signal was ignored at shell startup.
    ///
    /// Such a signal stays ignored and can never be trapped.
    pub fn set_initially_ignored(&mut self, signal: Signal) {
        if !self.initially_ignored.contains(&signal) {
            self.initially_ignored.push(signal);
            self.actions.insert(signal as c_int, Action::Ignore);
        }
    }

    /// Returns the action for a condition.
    #[must_use]
    pub fn get_action(&self, condition: Condition) -> &Action {
        self.actions
            .get(&condition.number())
            .unwrap_or(&Action::Default)
    }

    /// Sets the action for a condition, updating the signal disposition.
    pub fn set_action<S: SignalSystem>(
        &mut self,
        system: &mut S,
        condition: Condition,
        action: Action,
    ) -> Result<(), SetActionError> {
        if let Condition::Signal(signal) = condition {
            match signal {
                Signal::SIGKILL => return Err(SetActionError::SigKill),
                Signal::SIGSTOP => return Err(SetActionError::SigStop),
                _ => {}
            }
            if self.initially_ignored.contains(&signal) {
                return Err(SetActionError::InitiallyIgnored);
            }
            system.set_disposition(signal, action.disposition())?;
        }
        match action {
            Action::Default => {
                self.actions.remove(&condition.number());
            }
            action => {
                self.actions.insert(condition.number(), action);
            }
        }
        Ok(())
    }

    /// Iterates over the non-default actions in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Condition, &Action)> {
        self.actions
            .iter()
            .filter_map(|(&number, action)| Some((Condition::from_number(number)?, action)))
    }

    /// Takes one caught signal that has a command action, clearing its
    /// pending flag.
    ///
    /// Call repeatedly until `None` to process all pending trap actions.
    /// Pending signals without a command action are left for their
    /// dedicated consumers ([`take_sigchld`], [`take_sigint`]).
    #[must_use]
    pub fn take_caught_command(&self) -> Option<(Condition, Rc<str>)> {
        for (&number, action) in &self.actions {
            let Action::Command(command) = action else {
                continue;
            };
            let Ok(index) = usize::try_from(number) else {
                continue;
            };
            if index == 0 || index >= SIGNAL_SLOTS {
                continue;
            }
            if CAUGHT[index].swap(false, Ordering::Relaxed) {
                let condition = Condition::from_number(number)?;
                return Some((condition, Rc::clone(command)));
            }
        }
        None
    }

    /// Resets traps for a subshell.
    ///
    /// Command actions revert to the default disposition; ignored signals
    /// stay ignored, as POSIX requires.
    pub fn enter_subshell<S: SignalSystem>(&mut self, system: &mut S) -> Result<(), Errno> {
        let commands: Vec<c_int> = self
            .actions
            .iter()
            .filter(|(_, action)| matches!(action, Action::Command(_)))
            .map(|(&number, _)| number)
            .collect();
        for number in commands {
            if let Some(Condition::Signal(signal)) = Condition::from_number(number) {
                system.set_disposition(signal, Disposition::Default)?;
            }
            self.actions.remove(&number);
        }
        Ok(())
    }

    /// Installs the flag-setting handler for `SIGCHLD` so exited children
    /// can be reaped at poll points.
    pub fn enable_sigchld_handler<S: SignalSystem>(
        &mut self,
        system: &mut S,
    ) -> Result<(), Errno> {
        system.set_disposition(Signal::SIGCHLD, Disposition::Catch)
    }

    /// Installs the flag-setting handler for `SIGINT` so an interactive
    /// shell survives interrupts.
    pub fn enable_interactive_sigint<S: SignalSystem>(
        &mut self,
        system: &mut S,
    ) -> Result<(), Errno> {
        if let Some(Action::Command(_) | Action::Ignore) =
            self.actions.get(&(Signal::SIGINT as c_int))
        {
            // A user-defined trap takes precedence
            return Ok(());
        }
        system.set_disposition(Signal::SIGINT, Disposition::Catch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Signal system that records dispositions in a map
    #[derive(Debug, Default)]
    struct DummySystem(HashMap<Signal, Disposition>);

    impl SignalSystem for DummySystem {
        fn set_disposition(
            &mut self,
            signal: Signal,
            disposition: Disposition,
        ) -> Result<(), Errno> {
            self.0.insert(signal, disposition);
            Ok(())
        }
    }

    #[test]
    fn condition_parsing() {
        assert_eq!("EXIT".parse(), Ok(Condition::Exit));
        assert_eq!("0".parse(), Ok(Condition::Exit));
        assert_eq!("INT".parse(), Ok(Condition::Signal(Signal::SIGINT)));
        assert_eq!("SIGINT".parse(), Ok(Condition::Signal(Signal::SIGINT)));
        assert_eq!("int".parse(), Ok(Condition::Signal(Signal::SIGINT)));
        assert_eq!("2".parse(), Ok(Condition::Signal(Signal::SIGINT)));
        assert!("NOSUCH".parse::<Condition>().is_err());
        assert!("99999".parse::<Condition>().is_err());
    }

    #[test]
    fn condition_display() {
        assert_eq!(Condition::Exit.to_string(), "EXIT");
        assert_eq!(Condition::Signal(Signal::SIGTERM).to_string(), "TERM");
    }

    #[test]
    fn set_action_updates_disposition() {
        let mut system = DummySystem::default();
        let mut traps = TrapSet::new();
        let condition = Condition::Signal(Signal::SIGUSR1);

        traps
            .set_action(&mut system, condition, Action::Command("echo hi".into()))
            .unwrap();
        assert_eq!(system.0[&Signal::SIGUSR1], Disposition::Catch);
        assert_eq!(
            traps.get_action(condition),
            &Action::Command("echo hi".into())
        );

        traps
            .set_action(&mut system, condition, Action::Ignore)
            .unwrap();
        assert_eq!(system.0[&Signal::SIGUSR1], Disposition::Ignore);

        traps
            .set_action(&mut system, condition, Action::Default)
            .unwrap();
        assert_eq!(system.0[&Signal::SIGUSR1], Disposition::Default);
        assert_eq!(traps.get_action(condition), &Action::Default);
    }

    #[test]
    fn exit_trap_needs_no_disposition_change() {
        let mut system = DummySystem::default();
        let mut traps = TrapSet::new();
        traps
            .set_action(&mut system, Condition::Exit, Action::Command("bye".into()))
            .unwrap();
        assert!(system.0.is_empty());
        assert_eq!(
            traps.get_action(Condition::Exit),
            &Action::Command("bye".into())
        );
    }

    #[test]
    fn kill_and_stop_cannot_be_trapped() {
        let mut system = DummySystem::default();
        let mut traps = TrapSet::new();
        assert_eq!(
            traps.set_action(
                &mut system,
                Condition::Signal(Signal::SIGKILL),
                Action::Ignore
            ),
            Err(SetActionError::SigKill)
        );
        assert_eq!(
            traps.set_action(
                &mut system,
                Condition::Signal(Signal::SIGSTOP),
                Action::Ignore
            ),
            Err(SetActionError::SigStop)
        );
    }

    #[test]
    fn initially_ignored_signals_stay_untrappable() {
        let mut system = DummySystem::default();
        let mut traps = TrapSet::new();
        traps.set_initially_ignored(Signal::SIGQUIT);
        assert_eq!(
            traps.set_action(
                &mut system,
                Condition::Signal(Signal::SIGQUIT),
                Action::Command("echo".into())
            ),
            Err(SetActionError::InitiallyIgnored)
        );
        assert_eq!(
            traps.get_action(Condition::Signal(Signal::SIGQUIT)),
            &Action::Ignore
        );
    }

    #[test]
    fn subshell_resets_command_traps_but_keeps_ignores() {
        let mut system = DummySystem::default();
        let mut traps = TrapSet::new();
        traps
            .set_action(
                &mut system,
                Condition::Signal(Signal::SIGUSR1),
                Action::Command("echo".into()),
            )
            .unwrap();
        traps
            .set_action(
                &mut system,
                Condition::Signal(Signal::SIGUSR2),
                Action::Ignore,
            )
            .unwrap();
        traps
            .set_action(&mut system, Condition::Exit, Action::Command("bye".into()))
            .unwrap();

        traps.enter_subshell(&mut system).unwrap();

        assert_eq!(
            traps.get_action(Condition::Signal(Signal::SIGUSR1)),
            &Action::Default
        );
        assert_eq!(system.0[&Signal::SIGUSR1], Disposition::Default);
        assert_eq!(
            traps.get_action(Condition::Signal(Signal::SIGUSR2)),
            &Action::Ignore
        );
        assert_eq!(traps.get_action(Condition::Exit), &Action::Default);
    }

    #[test]
    fn caught_command_consumes_pending_flag() {
        let mut system = DummySystem::default();
        let mut traps = TrapSet::new();
        let condition = Condition::Signal(Signal::SIGUSR1);
        traps
            .set_action(&mut system, condition, Action::Command("echo hi".into()))
            .unwrap();

        assert_eq!(traps.take_caught_command(), None);

        // Simulate signal delivery
        catching_handler()(Signal::SIGUSR1 as c_int);
        assert!(take_pending());

        let (caught, command) = traps.take_caught_command().unwrap();
        assert_eq!(caught, condition);
        assert_eq!(&*command, "echo hi");
        assert_eq!(traps.take_caught_command(), None);
    }
}
