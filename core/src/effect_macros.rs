//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```
/// use bazaar_core::{delay, effect::Effect};
/// use std::time::Duration;
///
/// let effect = delay! {
///     duration: Duration::from_secs(3),
///     action: "hide"
/// };
/// assert!(matches!(effect, Effect::Delay { .. }));
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Create an `Effect::Cancellable` registered under a static id
///
/// # Example
///
/// ```
/// use bazaar_core::{cancellable, delay, effect::Effect};
/// use std::time::Duration;
///
/// let effect = cancellable! {
///     id: "toast.auto_hide",
///     effect: delay! { duration: Duration::from_secs(3), action: "hide" }
/// };
/// assert!(matches!(effect, Effect::Cancellable { .. }));
/// ```
#[macro_export]
macro_rules! cancellable {
    (
        id: $id:expr,
        effect: $effect:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $crate::effect::EffectId::new($id),
            effect: ::std::boxed::Box::new($effect),
        }
    };
}
