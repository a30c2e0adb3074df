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

//! Trap built-in
//!
//! `trap action condition...` registers `action` for each condition: a
//! command string, `-` to reset the default, or an empty string to
//! ignore. When the first operand is an unsigned integer, every operand
//! is taken as a condition to reset. Without operands, the current traps
//! are printed in re-input form.

use crate::common::{failure, quote, special_error};
use marsh_env::builtin::Result;
use marsh_env::semantics::{ExitStatus, Field};
use marsh_env::trap::{Action, Condition};
use marsh_env::Env;

/// Entry point of the `trap` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let operands = &args[1..];
    let Some(first) = operands.first() else {
        print_traps(env);
        return Result::new(ExitStatus::SUCCESS);
    };

    // A leading integer makes every operand a condition to reset
    let (action, conditions) = if first.value.parse::<u32>().is_ok() {
        (Action::Default, operands)
    } else {
        let action = match first.value.as_str() {
            "-" => Action::Default,
            "" => Action::Ignore,
            command => Action::Command(command.into()),
        };
        (action, &operands[1..])
    };

    if conditions.is_empty() {
        return special_error(env, "trap", "condition operand required");
    }

    let mut system = env.system;
    for operand in conditions {
        let condition: Condition = match operand.value.parse() {
            Ok(condition) => condition,
            Err(error) => return failure(env, "trap", error),
        };
        if let Err(error) = env.traps.set_action(&mut system, condition, action.clone()) {
            return failure(env, "trap", format!("{}: {error}", operand.value));
        }
    }
    Result::new(ExitStatus::SUCCESS)
}

/// Prints the non-default traps in a form suitable for re-input.
fn print_traps(env: &mut Env) {
    let mut output = String::new();
    for (condition, action) in env.traps.iter() {
        match action {
            Action::Default => {}
            Action::Ignore => {
                output.push_str(&format!("trap -- '' {condition}\n"));
            }
            Action::Command(command) => {
                output.push_str(&format!("trap -- {} {condition}\n", quote(command)));
            }
        }
    }
    env.stdout.push_str(&output);
}

#[cfg(test)]
mod tests {
    use crate::test_helper::{env, run, run_capturing};
    use marsh_env::semantics::ExitStatus;
    use marsh_env::trap::{Action, Condition};
    use nix::sys::signal::Signal;

    #[test]
    fn registers_command_action() {
        let mut env = env();
        run(&mut env, "trap 'echo caught' USR1");
        assert_eq!(
            env.traps.get_action(Condition::Signal(Signal::SIGUSR1)),
            &Action::Command("echo caught".into())
        );
    }

    #[test]
    fn empty_action_ignores_and_dash_resets() {
        let mut env = env();
        run(&mut env, "trap '' USR1");
        assert_eq!(
            env.traps.get_action(Condition::Signal(Signal::SIGUSR1)),
            &Action::Ignore
        );
        run(&mut env, "trap - USR1");
        assert_eq!(
            env.traps.get_action(Condition::Signal(Signal::SIGUSR1)),
            &Action::Default
        );
    }

    #[test]
    fn integer_first_operand_resets_each_condition() {
        let mut env = env();
        run(&mut env, "trap 'echo x' USR1 USR2");
        run(&mut env, "trap 10 12");
        assert_eq!(
            env.traps.get_action(Condition::Signal(Signal::SIGUSR1)),
            &Action::Default
        );
        assert_eq!(
            env.traps.get_action(Condition::Signal(Signal::SIGUSR2)),
            &Action::Default
        );
    }

    #[test]
    fn exit_trap_runs_at_shutdown() {
        let mut env = env();
        let output = run_capturing(&mut env, "trap 'echo bye' EXIT; echo hi");
        assert_eq!(output, "hi\n");
        let (_, output) =
            crate::test_helper::capture(&mut env, marsh_semantics::trap::run_exit_trap);
        assert_eq!(output, "bye\n");
    }

    #[test]
    fn printing_traps() {
        let mut env = env();
        run(&mut env, "trap 'echo x y' USR1; trap '' USR2; trap 'plain' EXIT");
        let output = run_capturing(&mut env, "trap");
        assert!(output.contains("trap -- plain EXIT\n"));
        assert!(output.contains("trap -- 'echo x y' USR1\n"));
        assert!(output.contains("trap -- '' USR2\n"));
    }

    #[test]
    fn sigkill_cannot_be_trapped() {
        let mut env = env();
        run(&mut env, "trap 'echo x' KILL");
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
    }

    #[test]
    fn unknown_condition_fails() {
        let mut env = env();
        run(&mut env, "trap 'echo x' NOSUCH");
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
    }

    #[test]
    fn pending_signal_runs_trap_at_poll_point() {
        let mut env = env();
        run(&mut env, "trap 'caught=yes' USR1");
        // Simulate delivery of the signal
        marsh_env::trap::catching_handler()(Signal::SIGUSR1 as std::ffi::c_int);
        run(&mut env, ":");
        assert_eq!(env.variables.value("caught"), Some("yes"));
    }

    #[test]
    fn trap_preserves_exit_status() {
        let mut env = env();
        run(&mut env, "trap 'true' USR1; false");
        marsh_env::trap::catching_handler()(Signal::SIGUSR1 as std::ffi::c_int);
        run(&mut env, "caught=$?");
        // The trap ran before this command, but $? still reports `false`
        assert_eq!(env.variables.value("caught"), Some("1"));
    }
}
