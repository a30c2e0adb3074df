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

//! Shell options
//!
//! Options are set at invocation (`marsh -ex script`) or at runtime
//! (`set -e`, `set +o errexit`). The special parameter `$-` expands to the
//! short letters of the currently enabled options.

use enumset::{EnumSet, EnumSetType};

/// Option that modifies shell behavior
#[derive(Debug, EnumSetType, Hash, Ord, PartialOrd)]
pub enum ShellOption {
    /// `-a`: export every variable on assignment
    AllExport,
    /// `-e`: exit on a command failure
    ErrExit,
    /// `-f`: disable pathname expansion
    NoGlob,
    /// `-h`: remember utility locations (accepted; no cache is kept)
    HashAll,
    /// `-m`: enable job control
    Monitor,
    /// `-b`: report background job completion
    Notify,
    /// `-C`: do not truncate existing files with `>`
    NoClobber,
    /// `-n`: read commands but do not execute them
    NoExec,
    /// `-u`: expanding an unset parameter is an error
    NoUnset,
    /// `-v`: write input lines to standard error as they are read
    Verbose,
    /// `-x`: trace commands after expansion
    Xtrace,
    /// `-i`: the shell is interactive
    Interactive,
}

impl ShellOption {
    /// Returns the option's short letter.
    #[must_use]
    pub const fn short_name(self) -> char {
        use ShellOption::*;
        match self {
            AllExport => 'a',
            ErrExit => 'e',
            NoGlob => 'f',
            HashAll => 'h',
            Monitor => 'm',
            Notify => 'b',
            NoClobber => 'C',
            NoExec => 'n',
            NoUnset => 'u',
            Verbose => 'v',
            Xtrace => 'x',
            Interactive => 'i',
        }
    }

    /// Returns the option's long name, used with `set -o`.
    #[must_use]
    pub const fn long_name(self) -> &'static str {
        use ShellOption::*;
        match self {
            AllExport => "allexport",
            ErrExit => "errexit",
            NoGlob => "noglob",
            HashAll => "hashall",
            Monitor => "monitor",
            Notify => "notify",
            NoClobber => "noclobber",
            NoExec => "noexec",
            NoUnset => "nounset",
            Verbose => "verbose",
            Xtrace => "xtrace",
            Interactive => "interactive",
        }
    }

    /// Returns true if the option can be changed with `set` after startup.
    #[must_use]
    pub const fn is_modifiable(self) -> bool {
        !matches!(self, ShellOption::Interactive)
    }

    /// Iterates over every option, in declaration order.
    pub fn all() -> impl Iterator<Item = ShellOption> {
        EnumSet::<ShellOption>::all().into_iter()
    }

    /// Finds the option with the given short letter.
    #[must_use]
    pub fn from_short_name(name: char) -> Option<Self> {
        EnumSet::all()
            .iter()
            .find(|option: &ShellOption| option.short_name() == name)
    }

    /// Finds the option with the given long name.
    #[must_use]
    pub fn from_long_name(name: &str) -> Option<Self> {
        EnumSet::all()
            .iter()
            .find(|option: &ShellOption| option.long_name() == name)
    }
}

/// Set of enabled shell options
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OptionSet {
    enabled: EnumSet<ShellOption>,
}

impl OptionSet {
    /// Creates a set with no options enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the option is enabled.
    #[must_use]
    pub fn get(&self, option: ShellOption) -> bool {
        self.enabled.contains(option)
    }

    /// Enables or disables an option.
    pub fn set(&mut self, option: ShellOption, enable: bool) {
        if enable {
            self.enabled.insert(option);
        } else {
            self.enabled.remove(option);
        }
    }

    /// Iterates over the enabled options.
    pub fn iter(&self) -> impl Iterator<Item = ShellOption> + '_ {
        self.enabled.iter()
    }

    /// Returns the value of the special parameter `$-`: the short letters
    /// of the enabled options, in unspecified order.
    #[must_use]
    pub fn to_flag_string(&self) -> String {
        self.enabled.iter().map(ShellOption::short_name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_names_resolve() {
        assert_eq!(
            ShellOption::from_short_name('e'),
            Some(ShellOption::ErrExit)
        );
        assert_eq!(ShellOption::from_short_name('C'), Some(ShellOption::NoClobber));
        assert_eq!(ShellOption::from_short_name('z'), None);
        assert_eq!(
            ShellOption::from_long_name("nounset"),
            Some(ShellOption::NoUnset)
        );
        assert_eq!(ShellOption::from_long_name("bogus"), None);
    }

    #[test]
    fn set_and_get() {
        let mut options = OptionSet::new();
        assert!(!options.get(ShellOption::Xtrace));
        options.set(ShellOption::Xtrace, true);
        assert!(options.get(ShellOption::Xtrace));
        options.set(ShellOption::Xtrace, false);
        assert!(!options.get(ShellOption::Xtrace));
    }

    #[test]
    fn flag_string_contains_enabled_letters() {
        let mut options = OptionSet::new();
        options.set(ShellOption::ErrExit, true);
        options.set(ShellOption::Xtrace, true);
        let flags = options.to_flag_string();
        assert!(flags.contains('e'));
        assert!(flags.contains('x'));
        assert!(!flags.contains('u'));
    }

    #[test]
    fn interactive_is_not_modifiable() {
        assert!(!ShellOption::Interactive.is_modifiable());
        assert!(ShellOption::ErrExit.is_modifiable());
    }
}
