//! Number fact client.
//!
//! The counter asks a [`NumberFactClient`] for a sentence about its current count.
//! Live runs use [`OfflineNumberFacts`], which derives the sentence from the number
//! itself; tests get [`EchoNumberFacts`], which answers with the number.

use composable_core::DependencyKey;
use futures::future::BoxFuture;
use std::sync::Arc;
use thiserror::Error;

/// Why a fact could not be produced
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactError {
    /// The client could not be reached
    #[error("number fact service unavailable: {0}")]
    Unavailable(String),

    /// The client answered with nothing usable
    #[error("no fact known for {0}")]
    Unknown(i64),
}

/// Fetches a fact about a number
pub trait NumberFactClient: Send + Sync {
    /// A sentence about `number`
    fn fetch(&self, number: i64) -> BoxFuture<'static, Result<String, FactError>>;
}

/// Facts computed locally from the number's arithmetic properties
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNumberFacts;

impl OfflineNumberFacts {
    /// Describe `number`
    #[must_use]
    pub fn describe(number: i64) -> String {
        if number == 0 {
            return "0 is the additive identity.".to_string();
        }

        let mut traits = Vec::new();
        if number < 0 {
            traits.push("negative".to_string());
        }
        traits.push(if number % 2 == 0 { "even" } else { "odd" }.to_string());
        if is_prime(number) {
            traits.push("prime".to_string());
        }
        if is_perfect_square(number) {
            traits.push("a perfect square".to_string());
        }

        format!("{number} is {}.", traits.join(", "))
    }
}

impl NumberFactClient for OfflineNumberFacts {
    fn fetch(&self, number: i64) -> BoxFuture<'static, Result<String, FactError>> {
        Box::pin(async move { Ok(Self::describe(number)) })
    }
}

/// Answers every request with the number itself
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoNumberFacts;

impl NumberFactClient for EchoNumberFacts {
    fn fetch(&self, number: i64) -> BoxFuture<'static, Result<String, FactError>> {
        Box::pin(async move { Ok(number.to_string()) })
    }
}

/// Dependency key for the number fact client
#[derive(Debug)]
pub struct NumberFactKey;

impl DependencyKey for NumberFactKey {
    type Value = Arc<dyn NumberFactClient>;

    fn live_value() -> Self::Value {
        Arc::new(OfflineNumberFacts)
    }

    fn test_value() -> Self::Value {
        Arc::new(EchoNumberFacts)
    }
}

fn is_prime(number: i64) -> bool {
    if number < 2 {
        return false;
    }
    (2..)
        .take_while(|d: &i64| d.saturating_mul(*d) <= number)
        .all(|d| number % d != 0)
}

fn is_perfect_square(number: i64) -> bool {
    if number < 1 {
        return false;
    }
    (1..)
        .take_while(|r: &i64| r.saturating_mul(*r) <= number)
        .any(|r| r * r == number)
}
