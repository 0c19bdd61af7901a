//! Per-call render state.

use std::collections::{HashMap, hash_map::Entry};

use crate::value::Value;

/// Outcome of visiting a composite instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Visit {
    /// First visit; the instance was assigned this ordinal.
    First(usize),
    /// Already visited in this call under this ordinal.
    Seen(usize),
}

/// State owned by exactly one top-level render call.
///
/// Never shared across calls or threads, so it needs no synchronization.
#[derive(Debug, Default)]
pub(crate) struct InvocationContext {
    ordinals: HashMap<usize, usize>,
    /// Keeps visited instances alive so their addresses cannot be reused by a
    /// new allocation mid-render, which would alias two distinct instances.
    retained: Vec<Value>,
    pub(crate) out: String,
}

impl InvocationContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Looks `value` up by identity, assigning the next 1-based ordinal on
    /// first visit. Returns `None` for values without identity.
    pub(crate) fn visit(&mut self, value: &Value) -> Option<Visit> {
        let identity = value.identity()?;
        let next = self.ordinals.len() + 1;
        match self.ordinals.entry(identity) {
            Entry::Occupied(entry) => Some(Visit::Seen(*entry.get())),
            Entry::Vacant(entry) => {
                entry.insert(next);
                self.retained.push(value.clone());
                Some(Visit::First(next))
            }
        }
    }

    pub(crate) fn into_output(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_follow_first_visit_order() {
        let a = Value::seq(Vec::<Value>::new());
        let b = Value::map(Vec::<(String, Value)>::new());
        let mut ctx = InvocationContext::new();

        assert_eq!(ctx.visit(&a), Some(Visit::First(1)));
        assert_eq!(ctx.visit(&b), Some(Visit::First(2)));
        assert_eq!(ctx.visit(&a.clone()), Some(Visit::Seen(1)));
        assert_eq!(ctx.visit(&b), Some(Visit::Seen(2)));
    }

    #[test]
    fn equal_values_get_independent_ordinals() {
        let a = Value::seq([Value::from(1)]);
        let b = Value::seq([Value::from(1)]);
        assert!(!a.same_instance(&b));

        let mut ctx = InvocationContext::new();
        assert_eq!(ctx.visit(&a), Some(Visit::First(1)));
        assert_eq!(ctx.visit(&b), Some(Visit::First(2)));
    }

    #[test]
    fn scalars_have_no_identity() {
        let mut ctx = InvocationContext::new();
        assert_eq!(ctx.visit(&Value::from("x")), None);
        assert_eq!(ctx.visit(&Value::Nil), None);
    }
}
