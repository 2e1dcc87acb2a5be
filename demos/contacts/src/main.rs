//! Contacts demo binary
//!
//! Adds one contact, abandons a second draft, and prints the list.

use composable_core::{Dependencies, PresentationAction};
use composable_runtime::{Store, StoreConfig};
use contacts::{contacts_reducer, AddContactAction, ContactsAction, ContactsState};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const fn sheet(action: AddContactAction) -> ContactsAction {
    ContactsAction::AddContact(PresentationAction::Presented(action))
}

fn is_sheet_delegate(action: &ContactsAction) -> bool {
    matches!(action, ContactsAction::AddContact(PresentationAction::Presented(a)) if a.is_delegate())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contacts=debug,composable_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Contacts Demo ===\n");

    let store = Store::with_config(
        ContactsState::default(),
        contacts_reducer(),
        Dependencies::live(),
        StoreConfig::default().with_name("contacts"),
    );

    println!(">>> Adding Blob");
    store.send(ContactsAction::AddButtonTapped).await?;
    store.send(sheet(AddContactAction::SetName("Blob".to_string()))).await?;
    store
        .send_and_wait_for(
            sheet(AddContactAction::SaveButtonTapped),
            is_sheet_delegate,
            Duration::from_secs(1),
        )
        .await?;

    println!(">>> Starting a draft and cancelling it");
    store.send(ContactsAction::AddButtonTapped).await?;
    store.send(sheet(AddContactAction::SetName("Blob Jr.".to_string()))).await?;
    store
        .send_and_wait_for(
            sheet(AddContactAction::CancelButtonTapped),
            is_sheet_delegate,
            Duration::from_secs(1),
        )
        .await?;

    let (contacts, sheet_open) = store
        .state(|s| (s.contacts.clone(), s.add_contact.is_presented()))
        .await;
    println!("\nContacts:");
    for contact in &contacts {
        println!("  {} ({})", contact.name, contact.id);
    }
    println!("Sheet open: {sheet_open}");

    store.shutdown(Duration::from_secs(5)).await?;
    println!("\n=== Contacts Demo Complete ===");
    Ok(())
}
