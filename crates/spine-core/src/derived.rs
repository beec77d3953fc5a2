//! Derived attributes: computed on read, overridable on write.
//!
//! Every derived field follows one contract. A [`Derived`] slot holds an
//! optional explicit value; a [`DerivedRule`] names the source field and
//! the pure function that computes the default. Reading resolves the
//! override first, then the rule, and fails with
//! [`ObjectError::InvalidState`] when neither is available.

use crate::array::RowArray;
use crate::error::ObjectError;
use crate::id::ModuleIds;

/// How a derived field is computed from its source.
///
/// `S` is the borrowed source representation (e.g. `[i64]` for an index
/// array), `T` the derived value.
pub struct DerivedRule<S: ?Sized, T> {
    /// Derived field name.
    pub field: &'static str,
    /// Source field name.
    pub source: &'static str,
    /// Default value as a function of the source.
    pub compute: fn(&S) -> T,
}

impl<S: ?Sized, T> DerivedRule<S, T> {
    /// Compute the default from a present source, or fail naming the
    /// missing source.
    pub fn apply(&self, source: Option<&S>) -> Result<T, ObjectError> {
        match source {
            Some(s) => Ok((self.compute)(s)),
            None => Err(ObjectError::invalid_state(
                self.field,
                format!(
                    "derived from '{}', which is unset and no explicit value was given",
                    self.source
                ),
            )),
        }
    }
}

/// Override slot for one derived field.
///
/// An explicit value wins until [`clear`](Self::clear) is called; it is
/// never recomputed behind the caller's back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Derived<T> {
    value: Option<T>,
}

impl<T: Clone> Derived<T> {
    /// An empty slot.
    pub const fn unset() -> Self {
        Self { value: None }
    }

    /// Store an explicit value.
    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    /// Drop the explicit value, returning it.
    pub fn clear(&mut self) -> Option<T> {
        self.value.take()
    }

    /// The explicit value, if any.
    pub fn explicit(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Whether an explicit value is stored.
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// The explicit value if set, otherwise `rule` applied to `source`.
    pub fn resolve<S: ?Sized>(
        &self,
        rule: &DerivedRule<S, T>,
        source: Option<&S>,
    ) -> Result<T, ObjectError> {
        match &self.value {
            Some(v) => Ok(v.clone()),
            None => rule.apply(source),
        }
    }
}

/// Number of entries.
pub fn count<T>(values: &[T]) -> usize {
    values.len()
}

/// Sum of float entries, accumulated in `f64`.
pub fn total(values: &[f32]) -> f64 {
    values.iter().map(|&v| f64::from(v)).sum()
}

/// Sorted unique values of column 0 of a `(module, tpc)` source array.
pub fn unique_modules(sources: &RowArray<i64>) -> ModuleIds {
    let mut modules: ModuleIds = sources.column(0).collect();
    modules.sort_unstable();
    modules.dedup();
    modules
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SIZE: DerivedRule<[i64], usize> = DerivedRule {
        field: "size",
        source: "index",
        compute: count::<i64>,
    };

    const SUM: DerivedRule<[f32], f64> = DerivedRule {
        field: "depositions_sum",
        source: "depositions",
        compute: total,
    };

    #[test]
    fn computes_from_source_when_unset() {
        let slot = Derived::<usize>::unset();
        let index = vec![4i64, 8, 15];
        assert_eq!(slot.resolve(&SIZE, Some(index.as_slice())).unwrap(), 3);
    }

    #[test]
    fn override_wins_regardless_of_source() {
        let mut slot = Derived::unset();
        slot.set(10usize);
        let index = vec![1i64, 2];
        assert_eq!(slot.resolve(&SIZE, Some(index.as_slice())).unwrap(), 10);
        assert_eq!(slot.resolve(&SIZE, None).unwrap(), 10);
        assert_eq!(slot.clear(), Some(10));
        assert_eq!(slot.resolve(&SIZE, Some(index.as_slice())).unwrap(), 2);
    }

    #[test]
    fn missing_source_is_invalid_state() {
        let slot = Derived::<usize>::unset();
        match slot.resolve(&SIZE, None) {
            Err(ObjectError::InvalidState { field, reason }) => {
                assert_eq!(field, "size");
                assert!(reason.contains("'index'"));
            }
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn sum_of_depositions() {
        let slot = Derived::<f64>::unset();
        let deps = [1.0f32, 2.5, 0.5];
        assert_eq!(slot.resolve(&SUM, Some(&deps[..])).unwrap(), 4.0);
    }

    #[test]
    fn modules_are_unique_and_sorted() {
        let sources = RowArray::from_rows(&[[1i64, 0], [0, 1], [0, 2], [1, 1]]);
        assert_eq!(unique_modules(&sources).as_slice(), &[0, 1]);
        assert!(unique_modules(&RowArray::new(2)).is_empty());
    }

    proptest! {
        #[test]
        fn modules_subset_of_sources(rows in prop::collection::vec((0i64..8, 0i64..4), 0..64)) {
            let flat: Vec<i64> = rows.iter().flat_map(|&(m, t)| [m, t]).collect();
            let sources = RowArray::from_flat(2, flat).unwrap();
            let modules = unique_modules(&sources);
            for m in &modules {
                prop_assert!(rows.iter().any(|&(src, _)| src == *m));
            }
            for &(src, _) in &rows {
                prop_assert!(modules.contains(&src));
            }
            prop_assert!(modules.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn size_tracks_index_length(index in prop::collection::vec(any::<i64>(), 0..128)) {
            let slot = Derived::<usize>::unset();
            prop_assert_eq!(slot.resolve(&SIZE, Some(index.as_slice())).unwrap(), index.len());
        }
    }
}
