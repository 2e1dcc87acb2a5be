//! # Contacts Demo
//!
//! A contact list that presents an "add contact" sheet.
//!
//! ## Architecture
//!
//! The sheet lives in [`ContactsState::add_contact`] as a [`PresentationState`];
//! [`contacts_reducer`] binds it to the list with [`if_let`]. The list reducer
//! presents the sheet and reacts to its delegate actions; the binding dismisses it
//! after any delegate action and cancels whatever the sheet still had running.
//!
//! ## Example
//!
//! ```no_run
//! use composable_core::{Dependencies, PresentationAction};
//! use composable_runtime::Store;
//! use contacts::{contacts_reducer, AddContactAction, ContactsAction, ContactsState};
//!
//! # async fn example() {
//! let store = Store::new(ContactsState::default(), contacts_reducer(), Dependencies::live());
//!
//! let _ = store.send(ContactsAction::AddButtonTapped).await;
//! let _ = store
//!     .send(ContactsAction::AddContact(PresentationAction::Presented(
//!         AddContactAction::SetName("Blob".to_string()),
//!     )))
//!     .await;
//! # }
//! ```

use composable_core::dependencies::UuidKey;
use composable_core::presentation::{if_let, IfLetReducer};
use composable_core::{
    effect::Effect, reducer::Reducer, smallvec, Dependencies, PresentationAction, PresentationState,
    SmallVec,
};
use composable_macros::Action;
use uuid::Uuid;

pub mod add_contact;

pub use add_contact::{AddContactAction, AddContactReducer, AddContactState, Delegate};

/// A saved contact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Stable identifier, drawn from [`UuidKey`]
    pub id: Uuid,
    /// Display name
    pub name: String,
}

/// Contact list state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactsState {
    /// Saved contacts, in the order they were added
    pub contacts: Vec<Contact>,
    /// The "add contact" sheet, when shown
    pub add_contact: PresentationState<AddContactState>,
}

/// Contact list actions
#[derive(Action, Debug, Clone, PartialEq, Eq)]
pub enum ContactsAction {
    /// "+" tapped
    AddButtonTapped,
    /// Action from or for the sheet
    AddContact(PresentationAction<AddContactAction>),
}

/// The list's own logic, without the sheet
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactsReducer;

impl Reducer for ContactsReducer {
    type State = ContactsState;
    type Action = ContactsAction;
    type Environment = Dependencies;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ContactsAction::AddButtonTapped => {
                let contact = Contact {
                    id: env.resolve::<UuidKey>().generate(),
                    name: String::new(),
                };
                let presentation = state.add_contact.present(AddContactState { contact });
                tracing::debug!(%presentation, "Presenting add contact sheet");
                smallvec![Effect::None]
            },
            ContactsAction::AddContact(PresentationAction::Presented(AddContactAction::Delegate(
                Delegate::Save(contact),
            ))) => {
                tracing::info!(id = %contact.id, name = %contact.name, "Contact saved");
                state.contacts.push(contact);
                smallvec![Effect::None]
            },
            ContactsAction::AddContact(_) => smallvec![Effect::None],
        }
    }
}

/// The composed contacts reducer
pub type ContactsFeature = IfLetReducer<ContactsReducer, AddContactReducer>;

/// Build the list reducer with the sheet bound to it
#[must_use]
pub fn contacts_reducer() -> ContactsFeature {
    if_let(
        ContactsReducer,
        AddContactReducer,
        |state: &mut ContactsState| &mut state.add_contact,
        ContactsAction::try_into_add_contact,
        ContactsAction::AddContact,
    )
    .dismiss_when(AddContactAction::is_delegate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presented(action: AddContactAction) -> ContactsAction {
        ContactsAction::AddContact(PresentationAction::Presented(action))
    }

    #[test]
    fn test_add_button_presents_blank_draft() {
        let reducer = contacts_reducer();
        let deps = Dependencies::test();
        let mut state = ContactsState::default();

        let _ = reducer.reduce(&mut state, ContactsAction::AddButtonTapped, &deps);

        let draft = state.add_contact.as_ref().map(|s| s.contact.clone());
        assert_eq!(
            draft,
            Some(Contact {
                id: Uuid::nil(),
                name: String::new(),
            })
        );
    }

    #[test]
    fn test_save_delegate_appends_and_dismisses() {
        let reducer = contacts_reducer();
        let deps = Dependencies::test();
        let mut state = ContactsState::default();
        let _ = reducer.reduce(&mut state, ContactsAction::AddButtonTapped, &deps);
        let _ = reducer.reduce(&mut state, presented(AddContactAction::SetName("Blob".into())), &deps);

        let contact = Contact {
            id: Uuid::nil(),
            name: "Blob".to_string(),
        };
        let effects = reducer.reduce(
            &mut state,
            presented(AddContactAction::Delegate(Delegate::Save(contact.clone()))),
            &deps,
        );

        assert_eq!(state.contacts, vec![contact]);
        assert!(!state.add_contact.is_presented());
        assert!(effects.iter().any(|e| matches!(e, Effect::Cancel(_))));
    }

    #[test]
    fn test_cancel_delegate_only_dismisses() {
        let reducer = contacts_reducer();
        let deps = Dependencies::test();
        let mut state = ContactsState::default();
        let _ = reducer.reduce(&mut state, ContactsAction::AddButtonTapped, &deps);

        let _ = reducer.reduce(&mut state, presented(AddContactAction::Delegate(Delegate::Cancel)), &deps);

        assert!(state.contacts.is_empty());
        assert!(!state.add_contact.is_presented());
    }
}
