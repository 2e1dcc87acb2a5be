//! The "add contact" sheet.
//!
//! The sheet edits a draft [`Contact`] and never touches the list itself: saving
//! and cancelling are reported to the parent as [`Delegate`] actions.

use crate::Contact;
use composable_core::{effect::Effect, reducer::Reducer, smallvec, Dependencies, SmallVec};
use composable_macros::Action;

/// Sheet state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddContactState {
    /// The contact being drafted
    pub contact: Contact,
}

/// Notifications for the presenting feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delegate {
    /// The user saved this contact
    Save(Contact),
    /// The user backed out
    Cancel,
}

/// Sheet actions
#[derive(Action, Debug, Clone, PartialEq, Eq)]
pub enum AddContactAction {
    /// "Save" tapped
    SaveButtonTapped,
    /// "Cancel" tapped
    CancelButtonTapped,
    /// Name field edited
    SetName(String),
    /// Sent to the parent
    #[delegate]
    Delegate(Delegate),
}

/// Sheet reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct AddContactReducer;

impl Reducer for AddContactReducer {
    type State = AddContactState;
    type Action = AddContactAction;
    type Environment = Dependencies;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AddContactAction::SaveButtonTapped => smallvec![Effect::send(AddContactAction::Delegate(
                Delegate::Save(state.contact.clone())
            ))],
            AddContactAction::CancelButtonTapped => {
                smallvec![Effect::send(AddContactAction::Delegate(Delegate::Cancel))]
            },
            AddContactAction::SetName(name) => {
                state.contact.name = name;
                smallvec![Effect::None]
            },
            // Handled by the parent
            AddContactAction::Delegate(_) => smallvec![Effect::None],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use composable_testing::{assertions, ReducerTest};
    use uuid::Uuid;

    fn draft(name: &str) -> AddContactState {
        AddContactState {
            contact: Contact {
                id: Uuid::nil(),
                name: name.to_string(),
            },
        }
    }

    #[test]
    fn test_set_name_edits_draft() {
        ReducerTest::new(AddContactReducer)
            .with_env(Dependencies::test())
            .given_state(draft(""))
            .when_action(AddContactAction::SetName("Blob".to_string()))
            .then_state(|state| assert_eq!(state.contact.name, "Blob"))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_save_and_cancel_only_emit_delegates() {
        ReducerTest::new(AddContactReducer)
            .with_env(Dependencies::test())
            .given_state(draft("Blob Jr."))
            .when_action(AddContactAction::SaveButtonTapped)
            .then_state(|state| assert_eq!(*state, draft("Blob Jr.")))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();

        ReducerTest::new(AddContactReducer)
            .with_env(Dependencies::test())
            .given_state(draft(""))
            .when_action(AddContactAction::CancelButtonTapped)
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }

    #[test]
    fn test_delegate_marker() {
        assert!(AddContactAction::Delegate(Delegate::Cancel).is_delegate());
        assert!(!AddContactAction::SaveButtonTapped.is_delegate());
    }
}
