//! Exhaustive dispatch over union instances.
//!
//! Positional dispatch ([`UnionValue::switch`], [`UnionValue::match_with`])
//! takes one handler per case, in declaration order, and runs the one at the
//! discriminant's position. [`Matcher`] binds handlers by case index or name
//! with an optional catch-all, and payload handlers that receive the active
//! case's payload directly. Positional dispatch fails with [`MatchFailure`]
//! when the active case has no handler; a matcher reports the same failure,
//! or a payload read as the wrong type, as a [`DispatchError`].

use sumty_ir::CaseIndex;

use crate::error::{AccessError, DispatchError, MatchFailure};
use crate::payload::Payload;
use crate::value::UnionValue;

impl UnionValue {
    fn match_failure(&self) -> MatchFailure {
        MatchFailure {
            union_name: self.layout().name().to_string(),
            case_name: self.case_name().to_string(),
        }
    }

    /// Run the handler at the discriminant's position.
    pub fn switch(&self, handlers: &mut [&mut dyn FnMut(&UnionValue)]) -> Result<(), MatchFailure> {
        match handlers.get_mut(self.discriminant().index()) {
            Some(handler) => {
                (*handler)(self);
                Ok(())
            }
            None => Err(self.match_failure()),
        }
    }

    /// Run the handler at the discriminant's position and return its value.
    pub fn match_with<R>(&self, handlers: &[&dyn Fn(&UnionValue) -> R]) -> Result<R, MatchFailure> {
        handlers
            .get(self.discriminant().index())
            .map(|handler| handler(self))
            .ok_or_else(|| self.match_failure())
    }

    /// Start a [`Matcher`] on this instance.
    pub fn matcher<R>(&self) -> Matcher<'_, R> {
        Matcher {
            value: self,
            outcome: None,
        }
    }
}

/// Handler binding by case index or name.
///
/// Only the first handler bound to the active case runs; it runs as soon as
/// it is bound.
///
/// ```ignore
/// let area = shape
///     .matcher()
///     .on_payload_named("Circle", |r: f64| PI * r * r)
///     .on_payload_named("Square", |side: f64| side * side)
///     .otherwise(|_| 0.0)
///     .run()?;
/// ```
#[must_use]
pub struct Matcher<'v, R> {
    value: &'v UnionValue,
    outcome: Option<Result<R, AccessError>>,
}

impl<'v, R> Matcher<'v, R> {
    pub fn on(mut self, case: CaseIndex, handler: impl FnOnce(&UnionValue) -> R) -> Self {
        if self.outcome.is_none() && self.value.is_case(case) {
            self.outcome = Some(Ok(handler(self.value)));
        }
        self
    }

    /// Bind a handler that receives the payload of `case` as `T`.
    pub fn on_payload<T: Payload>(mut self, case: CaseIndex, handler: impl FnOnce(T) -> R) -> Self {
        if self.outcome.is_none() && self.value.is_case(case) {
            self.outcome = Some(self.value.as_case::<T>(case).map(handler));
        }
        self
    }

    pub fn on_payload_named<T: Payload>(self, name: &str, handler: impl FnOnce(T) -> R) -> Self {
        match self.value.layout().case_index(name) {
            Some(case) => self.on_payload(case, handler),
            None => {
                tracing::debug!(union = self.value.layout().name(), name, "unknown case in matcher");
                self
            }
        }
    }

    /// Bind by case name. A name the union does not declare never matches.
    pub fn on_named(self, name: &str, handler: impl FnOnce(&UnionValue) -> R) -> Self {
        match self.value.layout().case_index(name) {
            Some(case) => self.on(case, handler),
            None => {
                tracing::debug!(union = self.value.layout().name(), name, "unknown case in matcher");
                self
            }
        }
    }

    /// Catch-all for every case without a handler.
    pub fn otherwise(mut self, handler: impl FnOnce(&UnionValue) -> R) -> Self {
        if self.outcome.is_none() {
            self.outcome = Some(Ok(handler(self.value)));
        }
        self
    }

    pub fn run(self) -> Result<R, DispatchError> {
        match self.outcome {
            Some(outcome) => outcome.map_err(DispatchError::from),
            None => Err(self.value.match_failure().into()),
        }
    }
}
