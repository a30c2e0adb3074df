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

//! Buffered shell output
//!
//! Built-in utilities write their standard output through an
//! [`OutputBuffer`] so a builtin's output is produced in one `write` burst
//! rather than byte by byte. The buffer must be flushed before anything
//! else writes to the same descriptor (the executor flushes it before
//! forking and after each builtin).

use crate::system::{Errno, RealSystem};
use std::os::unix::io::RawFd;

/// Standard input file descriptor
pub const STDIN: RawFd = 0;
/// Standard output file descriptor
pub const STDOUT: RawFd = 1;
/// Standard error file descriptor
pub const STDERR: RawFd = 2;

/// Write buffer for one file descriptor
#[derive(Clone, Debug)]
pub struct OutputBuffer {
    fd: RawFd,
    buffer: Vec<u8>,
}

impl OutputBuffer {
    /// Creates an empty buffer for the given descriptor.
    #[must_use]
    pub fn new(fd: RawFd) -> Self {
        OutputBuffer {
            fd,
            buffer: Vec::new(),
        }
    }

    /// Returns the descriptor the buffer flushes to.
    #[must_use]
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Appends a string to the buffer.
    pub fn push_str(&mut self, s: &str) {
        self.buffer.extend_from_slice(s.as_bytes());
    }

    /// Appends raw bytes to the buffer.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Returns true if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Takes the buffered bytes without writing them anywhere.
    ///
    /// The in-process command substitution path runs a builtin with a
    /// substitute buffer and collects its output this way.
    #[must_use]
    pub fn take_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Writes the buffered bytes to the descriptor and empties the buffer.
    ///
    /// On error the buffer is dropped anyway; retrying a failed descriptor
    /// with the same bytes is never useful for the shell.
    pub fn flush(&mut self, system: &RealSystem) -> Result<(), Errno> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let result = system.write_all(self.fd, &self.buffer);
        self.buffer.clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_accumulates_and_flushes_once() {
        let system = RealSystem::new();
        let (reader, writer) = system.pipe().unwrap();

        let mut output = OutputBuffer::new(writer);
        output.push_str("hello ");
        output.push_bytes(b"world");
        assert!(!output.is_empty());
        output.flush(&system).unwrap();
        assert!(output.is_empty());
        system.close(writer).unwrap();

        let mut buffer = [0; 32];
        let count = system.read(reader, &mut buffer).unwrap();
        assert_eq!(&buffer[..count], b"hello world");
        system.close(reader).unwrap();
    }

    #[test]
    fn flushing_empty_buffer_is_a_no_op() {
        let system = RealSystem::new();
        let mut output = OutputBuffer::new(STDOUT);
        output.flush(&system).unwrap();
    }
}
