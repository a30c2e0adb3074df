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

//! Transient allocation scratch space
//!
//! Word expansion builds intermediate buffers with stack-like lifetimes:
//! everything allocated while expanding one command is dead once the
//! command's fields have been produced. [`with_scratch`] hands out a bump
//! region for such work and reclaims it wholesale when the closure
//! returns.
//!
//! Acquisition is scoped, so a mark cannot leak: the borrow checker keeps
//! any region-allocated value from escaping the closure, and nesting
//! acquisitions is fine (each level gets its own region from a
//! thread-local pool). Regions are reset and pooled for reuse, so steady
//! state allocates nothing from the global allocator.

use bumpalo::Bump;
use std::cell::RefCell;

thread_local! {
    static POOL: RefCell<Vec<Bump>> = const { RefCell::new(Vec::new()) };
}

/// Guard returning a region to the pool even if the closure panics
struct Reclaim(Option<Bump>);

impl Drop for Reclaim {
    fn drop(&mut self) {
        if let Some(mut region) = self.0.take() {
            region.reset();
            POOL.with(|pool| pool.borrow_mut().push(region));
        }
    }
}

/// Runs a closure with a scratch allocation region.
///
/// The region starts empty and everything allocated in it is freed when
/// the closure returns. Data that must outlive the call has to be copied
/// out into owned storage before returning.
pub fn with_scratch<R>(f: impl FnOnce(&Bump) -> R) -> R {
    let region = POOL
        .with(|pool| pool.borrow_mut().pop())
        .unwrap_or_default();
    let guard = Reclaim(Some(region));
    f(guard.0.as_ref().expect("region is present until drop"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_starts_empty() {
        with_scratch(|scratch| {
            assert_eq!(scratch.allocated_bytes(), 0);
            scratch.alloc_str("something");
            assert!(scratch.allocated_bytes() > 0);
        });
        // The next acquisition is indistinguishable from a fresh region
        with_scratch(|scratch| {
            assert_eq!(scratch.allocated_bytes(), 0);
        });
    }

    #[test]
    fn nested_scratches_are_independent() {
        with_scratch(|outer| {
            let outer_value = outer.alloc_str("outer");
            with_scratch(|inner| {
                let inner_value = inner.alloc_str("inner");
                assert_eq!(inner_value, "inner");
                assert_eq!(outer_value, "outer");
            });
            // Inner reclamation does not touch the outer region
            assert_eq!(outer_value, "outer");
        });
    }

    #[test]
    fn collections_allocate_in_the_region() {
        let lengths: Vec<usize> = with_scratch(|scratch| {
            let mut fields = bumpalo::collections::Vec::new_in(scratch);
            for part in ["a", "bb", "ccc"] {
                fields.push(bumpalo::collections::String::from_str_in(part, scratch));
            }
            fields.iter().map(|s| s.len()).collect()
        });
        assert_eq!(lengths, [1, 2, 3]);
    }
}
