// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Symbolic branch targets for the emitter.

use crate::Error;

/// A branch target that may not have a position yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub usize);

/// Every label defined during one compilation, with its marked position.
#[derive(Debug, Default)]
pub struct Labels {
    marks: Vec<Option<usize>>,
}

impl Labels {
    /// Creates an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a fresh, unmarked label.
    pub fn define(&mut self) -> Label {
        self.marks.push(None);
        Label(self.marks.len() - 1)
    }

    /// Bind `label` to instruction index `at`.
    pub fn mark(&mut self, label: Label, at: usize) {
        self.marks[label.0] = Some(at);
    }

    /// The instruction index `label` was bound to.
    pub fn resolve(&self, label: Label) -> Result<usize, Error> {
        self.marks
            .get(label.0)
            .copied()
            .flatten()
            .ok_or(Error::UnresolvedLabel(label.0))
    }

    /// Number of labels defined.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Returns true if no label was defined.
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_mark_resolve() {
        let mut labels = Labels::new();
        let a = labels.define();
        let b = labels.define();
        assert_ne!(a, b);
        labels.mark(b, 7);
        assert_eq!(labels.resolve(b).unwrap(), 7);
        assert!(matches!(labels.resolve(a), Err(Error::UnresolvedLabel(0))));
        assert_eq!(labels.len(), 2);
    }
}
