//! Presented child features.
//!
//! A parent feature embeds an optional child as a [`PresentationState`] field and the
//! child's actions as a [`PresentationAction`] case. [`if_let`] composes the two
//! reducers so that:
//!
//! - the child reducer runs only while the child is present, and a child action
//!   arriving while nothing is presented reaches neither child nor parent
//! - every effect the child launches is registered under the presentation's identity
//! - dismissing (or replacing) the child cancels all of those effects
//!
//! Presenting is done by the parent reducer with [`PresentationState::present`];
//! dismissing happens through [`PresentationAction::Dismiss`], a child action that
//! matches [`IfLetReducer::dismiss_when`], or the parent clearing the field itself.

use crate::cancel::CancelId;
use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;
use std::fmt;
use uuid::Uuid;

/// Cancellation key for everything a single presentation launched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresentationId(pub Uuid);

/// Optional child state with a fresh identity per presentation
///
/// Equality compares only the child state, so test expectations don't need to know
/// the generated identity.
#[derive(Clone)]
pub struct PresentationState<S> {
    presented: Option<(Uuid, S)>,
}

impl<S> PresentationState<S> {
    /// Nothing presented
    #[must_use]
    pub const fn none() -> Self {
        Self { presented: None }
    }

    /// Present `state` under a new identity, replacing anything already presented
    pub fn present(&mut self, state: S) -> Uuid {
        let id = Uuid::new_v4();
        self.presented = Some((id, state));
        id
    }

    /// Clear the field, returning the child state that was presented
    pub fn dismiss(&mut self) -> Option<S> {
        self.presented.take().map(|(_, state)| state)
    }

    /// Whether a child is presented
    #[must_use]
    pub const fn is_presented(&self) -> bool {
        self.presented.is_some()
    }

    /// Identity of the current presentation
    #[must_use]
    pub fn id(&self) -> Option<Uuid> {
        self.presented.as_ref().map(|(id, _)| *id)
    }

    /// Borrow the presented child state
    #[must_use]
    pub fn as_ref(&self) -> Option<&S> {
        self.presented.as_ref().map(|(_, state)| state)
    }

    /// Mutably borrow the presented child state
    pub fn as_mut(&mut self) -> Option<&mut S> {
        self.presented.as_mut().map(|(_, state)| state)
    }
}

impl<S> Default for PresentationState<S> {
    fn default() -> Self {
        Self::none()
    }
}

impl<S: PartialEq> PartialEq for PresentationState<S> {
    fn eq(&self, other: &Self) -> bool {
        self.as_ref() == other.as_ref()
    }
}

impl<S: fmt::Debug> fmt::Debug for PresentationState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.presented {
            Some((id, state)) => f
                .debug_struct("Presented")
                .field("id", id)
                .field("state", state)
                .finish(),
            None => write!(f, "NotPresented"),
        }
    }
}

impl<S> From<Option<S>> for PresentationState<S> {
    fn from(state: Option<S>) -> Self {
        let mut presentation = Self::none();
        if let Some(state) = state {
            presentation.present(state);
        }
        presentation
    }
}

/// Actions addressed to a presented child
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationAction<A> {
    /// An action for the presented child
    Presented(A),
    /// Dismiss the child, cancelling its effects
    Dismiss,
}

/// Compose a parent reducer with an optionally-presented child
///
/// - `state`: lens to the parent's [`PresentationState`] field
/// - `to_child`: extracts the [`PresentationAction`] case from a parent action
/// - `from_child`: embeds a [`PresentationAction`] into the parent action type
///
/// On every action the child runs first (only if present), then the parent, then
/// dismissal is applied. Child actions while nothing is presented are dropped
/// before the parent sees them. Any change of presentation identity across the reduce
/// cancels the previous presentation's effects.
pub fn if_let<P, C>(
    parent: P,
    child: C,
    state: fn(&mut P::State) -> &mut PresentationState<C::State>,
    to_child: fn(P::Action) -> Option<PresentationAction<C::Action>>,
    from_child: fn(PresentationAction<C::Action>) -> P::Action,
) -> IfLetReducer<P, C>
where
    P: Reducer,
    C: Reducer<Environment = P::Environment>,
{
    IfLetReducer {
        parent,
        child,
        state,
        to_child,
        from_child,
        dismiss_when: None,
    }
}

/// Parent reducer driving an optional child
///
/// Created by [`if_let`].
pub struct IfLetReducer<P, C>
where
    P: Reducer,
    C: Reducer,
{
    parent: P,
    child: C,
    state: fn(&mut P::State) -> &mut PresentationState<C::State>,
    to_child: fn(P::Action) -> Option<PresentationAction<C::Action>>,
    from_child: fn(PresentationAction<C::Action>) -> P::Action,
    dismiss_when: Option<fn(&C::Action) -> bool>,
}

impl<P, C> IfLetReducer<P, C>
where
    P: Reducer,
    C: Reducer,
{
    /// Dismiss the child after any child action matching `predicate` has been
    /// handled by both child and parent (typically its delegate actions)
    #[must_use]
    pub fn dismiss_when(mut self, predicate: fn(&C::Action) -> bool) -> Self {
        self.dismiss_when = Some(predicate);
        self
    }
}

impl<P, C> Reducer for IfLetReducer<P, C>
where
    P: Reducer,
    P::Action: Clone + Send + 'static,
    C: Reducer<Environment = P::Environment>,
    C::Action: Send + 'static,
{
    type State = P::State;
    type Action = P::Action;
    type Environment = P::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let before = (self.state)(state).id();
        let mut effects: SmallVec<[Effect<Self::Action>; 4]> = SmallVec::new();
        let mut dismiss = false;

        match (self.to_child)(action.clone()) {
            Some(PresentationAction::Presented(child_action)) => {
                match (self.state)(state).presented.as_mut() {
                    Some((id, child_state)) => {
                        let id = *id;
                        dismiss = self.dismiss_when.is_some_and(|predicate| predicate(&child_action));
                        let from_child = self.from_child;
                        effects.extend(
                            self.child
                                .reduce(child_state, child_action, env)
                                .into_iter()
                                .filter(|effect| !effect.is_none())
                                .map(|effect| {
                                    effect
                                        .map(move |a| from_child(PresentationAction::Presented(a)))
                                        .cancellable(PresentationId(id), false)
                                }),
                        );
                    },
                    None => {
                        tracing::trace!("Child action received while not presented, ignoring");
                        return SmallVec::new();
                    },
                }
            },
            Some(PresentationAction::Dismiss) => dismiss = true,
            None => {},
        }

        effects.extend(
            self.parent
                .reduce(state, action, env)
                .into_iter()
                .filter(|effect| !effect.is_none()),
        );

        let presentation = (self.state)(state);
        if dismiss {
            presentation.dismiss();
        }

        if let Some(before) = before {
            if presentation.id() != Some(before) {
                tracing::debug!(presentation = %before, "Presentation ended, cancelling its effects");
                effects.push(Effect::Cancel(CancelId::new(PresentationId(before))));
            }
        }

        effects
    }
}
