//! Table-driven state machines with guarded transitions.
//!
//! A [`StateTable`] is built once from [`StateSpec`]s and shared between any
//! number of [`StateMachine`] instances. Each state lists its guarded
//! transitions in priority order and must name a fallback target, which is
//! taken when no guard holds. A fallback pointing at the state itself is the
//! usual "stay put" case.

use std::fmt;
use std::sync::Arc;

use crate::error::{SimError, SimResult};
use crate::types::MAX_TRANSITIONS;

pub type StateId = usize;

/// Transition predicate. Receives the machine (for its current state) and
/// the context it drives.
pub type Guard<C> = fn(&StateMachine<C>, &C) -> bool;

/// Entry or exit action.
pub type Action<C> = fn(&mut C);

pub struct Transition<C> {
    pub guard: Guard<C>,
    pub target: StateId,
}

impl<C> Clone for Transition<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Transition<C> {}

/// Builder-side description of one state.
pub struct StateSpec<C> {
    name: &'static str,
    on_entry: Option<Action<C>>,
    on_exit: Option<Action<C>>,
    transitions: Vec<Transition<C>>,
    fallback: Option<StateId>,
}

impl<C> StateSpec<C> {
    pub fn new(name: &'static str) -> Self {
        Self { name, on_entry: None, on_exit: None, transitions: Vec::new(), fallback: None }
    }

    pub fn on_entry(mut self, action: Action<C>) -> Self {
        self.on_entry = Some(action);
        self
    }

    pub fn on_exit(mut self, action: Action<C>) -> Self {
        self.on_exit = Some(action);
        self
    }

    /// Guarded transition, checked after the ones added before it.
    pub fn when(mut self, guard: Guard<C>, target: StateId) -> Self {
        self.transitions.push(Transition { guard, target });
        self
    }

    /// Unconditional transition taken when no guard holds.
    pub fn otherwise(mut self, target: StateId) -> Self {
        self.fallback = Some(target);
        self
    }
}

struct State<C> {
    name: &'static str,
    on_entry: Option<Action<C>>,
    on_exit: Option<Action<C>>,
    transitions: Vec<Transition<C>>,
    fallback: StateId,
}

/// Validated set of states indexed by [`StateId`].
pub struct StateTable<C> {
    states: Vec<State<C>>,
}

impl<C> StateTable<C> {
    /// Build a table, rejecting states without a fallback, states with more
    /// transitions than fit, and targets outside the table.
    pub fn new(specs: Vec<StateSpec<C>>) -> SimResult<Self> {
        if specs.is_empty() {
            return Err(SimError::EmptyStateTable);
        }
        let n = specs.len();
        let mut states = Vec::with_capacity(n);
        for spec in specs {
            let fallback = spec.fallback.ok_or(SimError::MissingFallback { state: spec.name })?;
            let count = spec.transitions.len() + 1;
            if count > MAX_TRANSITIONS {
                return Err(SimError::TooManyTransitions {
                    state: spec.name,
                    count,
                    max: MAX_TRANSITIONS,
                });
            }
            let targets = spec.transitions.iter().map(|t| t.target).chain(Some(fallback));
            for target in targets {
                if target >= n {
                    return Err(SimError::UnknownTarget { state: spec.name, target });
                }
            }
            states.push(State {
                name: spec.name,
                on_entry: spec.on_entry,
                on_exit: spec.on_exit,
                transitions: spec.transitions,
                fallback,
            });
        }
        Ok(Self { states })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn name(&self, id: StateId) -> Option<&'static str> {
        self.states.get(id).map(|s| s.name)
    }
}

/// Result of one [`StateMachine::run`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Stayed,
    Changed { from: StateId, to: StateId },
}

/// One running instance of a shared [`StateTable`].
pub struct StateMachine<C> {
    current: StateId,
    table: Arc<StateTable<C>>,
}

impl<C> Clone for StateMachine<C> {
    fn clone(&self) -> Self {
        Self { current: self.current, table: Arc::clone(&self.table) }
    }
}

impl<C> fmt::Debug for StateMachine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("state", &self.state_name())
            .finish()
    }
}

impl<C> StateMachine<C> {
    pub fn new(table: Arc<StateTable<C>>, initial: StateId) -> SimResult<Self> {
        if initial >= table.len() {
            return Err(SimError::UnknownTarget { state: "<initial>", target: initial });
        }
        Ok(Self { current: initial, table })
    }

    pub fn current(&self) -> StateId {
        self.current
    }

    pub fn state_name(&self) -> &'static str {
        self.table.states[self.current].name
    }

    /// Take at most one transition out of the current state.
    ///
    /// The first guard that holds wins, then the fallback. Moving to a new
    /// state runs the old state's exit action and the new state's entry
    /// action; looping back to the current state runs neither.
    pub fn run(&mut self, ctx: &mut C) -> Step {
        let table = Arc::clone(&self.table);
        let state = &table.states[self.current];
        let this: &Self = self;
        let target = state
            .transitions
            .iter()
            .find(|t| (t.guard)(this, &*ctx))
            .map_or(state.fallback, |t| t.target);

        if target == self.current {
            return Step::Stayed;
        }
        if let Some(exit) = state.on_exit {
            exit(ctx);
        }
        let from = self.current;
        self.current = target;
        if let Some(entry) = table.states[target].on_entry {
            entry(ctx);
        }
        log::debug!("state {} -> {}", state.name, table.states[target].name);
        Step::Changed { from, to: target }
    }
}
