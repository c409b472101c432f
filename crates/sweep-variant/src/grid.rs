//! Grid enumeration
//!
//! [`GridSearch`] walks the Cartesian product of a spec's grid axes in
//! odometer order: the first axis (smallest path) changes fastest, the last
//! slowest. Every combination is an independent copy of the template.

use std::iter::FusedIterator;

use sweep_spec::{Spec, SpecError, SpecPath};

use crate::partition::GridVar;

/// Lazy Cartesian product over grid axes
#[derive(Debug, Clone)]
pub struct GridSearch {
    template: Spec,
    axes: Vec<GridVar>,
    indices: Vec<usize>,
    remaining: usize,
    total: usize,
    exhausted: bool,
}

impl GridSearch {
    /// Enumerate `axes` over `template`
    ///
    /// Axes are enumerated in the order given; callers pass them sorted by
    /// path. Zero axes yield the template exactly once.
    ///
    /// # Errors
    /// Returns [`SpecError::PathNotFound`] if an axis path is absent from the
    /// template
    pub fn new(template: Spec, axes: Vec<GridVar>) -> Result<Self, SpecError> {
        if let Some(missing) = axes.iter().find(|a| template.get_path(&a.path).is_none()) {
            return Err(SpecError::PathNotFound(missing.path.clone()));
        }
        let total = axes
            .iter()
            .try_fold(1usize, |acc, a| acc.checked_mul(a.axis.len()))
            .unwrap_or(usize::MAX);
        Ok(Self {
            indices: vec![0; axes.len()],
            exhausted: total == 0,
            remaining: total,
            total,
            template,
            axes,
        })
    }

    /// Number of combinations, saturating at `usize::MAX`
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.total
    }

    /// Check if there are no combinations at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Axis paths in enumeration order
    pub fn paths(&self) -> impl Iterator<Item = &SpecPath> {
        self.axes.iter().map(|a| &a.path)
    }

    fn current(&self) -> Spec {
        let mut spec = self.template.clone();
        for (grid, &idx) in self.axes.iter().zip(&self.indices) {
            if let Some(slot) = spec.get_path_mut(&grid.path) {
                *slot = grid.axis.values()[idx].clone();
            }
        }
        spec
    }

    // Carry from axis 0; wrapping past the last axis ends the walk.
    fn advance(&mut self) {
        for (grid, idx) in self.axes.iter().zip(self.indices.iter_mut()) {
            *idx += 1;
            if *idx < grid.axis.len() {
                return;
            }
            *idx = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for GridSearch {
    type Item = Spec;

    fn next(&mut self) -> Option<Spec> {
        if self.exhausted {
            return None;
        }
        let spec = self.current();
        self.advance();
        self.remaining = self.remaining.saturating_sub(1);
        Some(spec)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.exhausted {
            (0, Some(0))
        } else if self.total == usize::MAX {
            (self.remaining, None)
        } else {
            (self.remaining, Some(self.remaining))
        }
    }
}

impl FusedIterator for GridSearch {}
