//! Conditional routing: a predicate over state that picks an outcome label.

use std::marker::PhantomData;

/// Routing function of a conditional edge.
///
/// `outcomes` declares every label `route` can return; `StateGraph::compile` checks that each
/// declared label has a destination, so an unmapped label is caught before any run starts.
pub trait Router<S>: Send + Sync {
    fn outcomes(&self) -> &[&'static str];

    /// Picks the outcome for the post-merge state. Must be pure.
    fn route(&self, state: &S) -> &'static str;
}

/// Router built from a closure and its declared outcome labels.
pub struct FnRouter<S, F> {
    outcomes: Vec<&'static str>,
    f: F,
    _state: PhantomData<fn(&S)>,
}

impl<S, F> FnRouter<S, F>
where
    F: Fn(&S) -> &'static str + Send + Sync,
{
    pub fn new(outcomes: &[&'static str], f: F) -> Self {
        Self {
            outcomes: outcomes.to_vec(),
            f,
            _state: PhantomData,
        }
    }
}

impl<S, F> Router<S> for FnRouter<S, F>
where
    F: Fn(&S) -> &'static str + Send + Sync,
{
    fn outcomes(&self) -> &[&'static str] {
        &self.outcomes
    }

    fn route(&self, state: &S) -> &'static str {
        (self.f)(state)
    }
}
