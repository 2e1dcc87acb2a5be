//! Tests for #[derive(Action)] macro

use composable_core::PresentationAction;
use composable_macros::Action;

#[derive(Clone, Debug, PartialEq)]
enum Delegate {
    Save(String),
    Cancel,
}

#[derive(Action, Clone, Debug, PartialEq)]
enum EditorAction {
    SaveButtonTapped,

    SetName(String),

    Resize { width: u32, height: u32 },

    #[response]
    LoadResponse(Result<String, String>),

    #[delegate]
    Delegate(Delegate),
}

#[derive(Action, Clone, Debug, PartialEq)]
enum ScreenAction {
    Editor(PresentationAction<EditorAction>),
    Tab1(u8),
    Pair(u8, u8),
}

#[derive(Action, Clone, Debug, PartialEq)]
enum Wrapped<T> {
    #[response]
    Loaded(T),
    Reset,
}

#[test]
fn test_is_delegate() {
    assert!(EditorAction::Delegate(Delegate::Cancel).is_delegate());
    assert!(EditorAction::Delegate(Delegate::Save("Blob".to_string())).is_delegate());
    assert!(!EditorAction::SaveButtonTapped.is_delegate());
    assert!(!EditorAction::LoadResponse(Ok(String::new())).is_delegate());
}

#[test]
fn test_is_response() {
    assert!(EditorAction::LoadResponse(Err("offline".to_string())).is_response());
    assert!(!EditorAction::SetName("x".to_string()).is_response());
    assert!(!EditorAction::Delegate(Delegate::Cancel).is_response());
}

#[test]
fn test_unmarked_enum_has_no_delegates_or_responses() {
    let action = ScreenAction::Tab1(3);
    assert!(!action.is_delegate());
    assert!(!action.is_response());
}

#[test]
fn test_case_name() {
    assert_eq!(EditorAction::SaveButtonTapped.case_name(), "SaveButtonTapped");
    assert_eq!(
        EditorAction::Resize { width: 1, height: 2 }.case_name(),
        "Resize"
    );
    assert_eq!(ScreenAction::Pair(1, 2).case_name(), "Pair");
}

#[test]
fn test_try_into_single_field_case() {
    assert_eq!(
        EditorAction::SetName("Blob".to_string()).try_into_set_name(),
        Some("Blob".to_string())
    );
    assert_eq!(EditorAction::SaveButtonTapped.try_into_set_name(), None);
    assert_eq!(
        EditorAction::Delegate(Delegate::Cancel).try_into_delegate(),
        Some(Delegate::Cancel)
    );
}

#[test]
fn test_as_single_field_case() {
    let action = ScreenAction::Editor(PresentationAction::Dismiss);
    assert_eq!(action.as_editor(), Some(&PresentationAction::Dismiss));
    assert_eq!(action.as_tab1(), None);
    assert_eq!(ScreenAction::Tab1(7).as_tab1(), Some(&7));
}

#[test]
fn test_delegate_check_as_fn_pointer() {
    let predicate: fn(&EditorAction) -> bool = EditorAction::is_delegate;
    assert!(predicate(&EditorAction::Delegate(Delegate::Cancel)));
}

#[test]
fn test_generic_enum() {
    let loaded: Wrapped<Vec<u8>> = Wrapped::Loaded(vec![1, 2]);
    assert!(loaded.is_response());
    assert_eq!(loaded.clone().try_into_loaded(), Some(vec![1, 2]));
    assert!(!Wrapped::<Vec<u8>>::Reset.is_response());
}
