//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants in reducers.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use composable_core::async_effect;
///
/// let client = env.resolve::<NumberFactKey>();
/// async_effect! {
///     Some(CounterAction::FactResponse(client.fetch(count).await))
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Run` from an async block that emits through `$send`
///
/// # Example
///
/// ```rust,ignore
/// use composable_core::run_effect;
///
/// run_effect!(send => {
///     loop {
///         clock.sleep(Duration::from_secs(1)).await;
///         send.send(CounterAction::TimerTick).await;
///     }
/// })
/// ```
#[macro_export]
macro_rules! run_effect {
    ($send:ident => { $($body:tt)* }) => {
        $crate::effect::Effect::run(move |$send| async move { $($body)* })
    };
}
