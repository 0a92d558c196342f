//! Observer handler triple and handler errors.

use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

/// Error produced by an observer's `next` handler.
///
/// Handler errors never escape a notification loop. They are routed to the
/// failing observer's own error handler, or swallowed when it has none.
#[derive(Debug, Error)]
pub enum HandlerError {
	/// The handler failed with a plain message.
	#[error("{0}")]
	Message(String),
	/// The handler failed with an underlying error.
	#[error("{0}")]
	Source(Box<dyn StdError + 'static>),
}

impl HandlerError {
	/// Creates a handler error from a message.
	pub fn msg(message: impl Into<String>) -> Self {
		Self::Message(message.into())
	}

	/// Wraps an underlying error.
	pub fn new<E>(error: E) -> Self
	where
		E: StdError + 'static,
	{
		Self::Source(Box::new(error))
	}

	/// Returns the wrapped error if it is of type `E`.
	pub fn downcast_ref<E>(&self) -> Option<&E>
	where
		E: StdError + 'static,
	{
		match self {
			Self::Message(_) => None,
			Self::Source(source) => source.downcast_ref::<E>(),
		}
	}
}

type NextFn<T> = Rc<dyn Fn(&T) -> Result<(), HandlerError>>;
type ErrorFn = Rc<dyn Fn(&HandlerError)>;
type CompleteFn = Rc<dyn Fn()>;

/// A `(next, error, complete)` handler triple.
///
/// Every handler is optional. Handlers are `Fn` rather than `FnMut` because
/// delivery can re-enter the same observer (a handler that updates the
/// container it listens to); use `Cell`/`RefCell` for handler-local state.
///
/// Cloning an `Observer` is cheap and shares the handlers.
///
/// # Example
///
/// ```
/// use magnetic_core::reactive::{HandlerError, Observer, State};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let failures = Rc::new(Cell::new(0));
/// let counter = failures.clone();
///
/// let observer = Observer::fallible(|value: &i32| {
///     if *value < 0 {
///         return Err(HandlerError::msg("negative"));
///     }
///     Ok(())
/// })
/// .on_error(move |_| counter.set(counter.get() + 1));
///
/// let state = State::new(1);
/// let _subscription = state.subscribe(observer);
/// state.update(-1);
/// assert_eq!(failures.get(), 1);
/// ```
pub struct Observer<T> {
	next: Option<NextFn<T>>,
	error: Option<ErrorFn>,
	complete: Option<CompleteFn>,
}

impl<T> Observer<T> {
	/// Creates an observer from an infallible `next` handler.
	pub fn new<F>(next: F) -> Self
	where
		F: Fn(&T) + 'static,
	{
		Self::fallible(move |value| {
			next(value);
			Ok(())
		})
	}

	/// Creates an observer from a fallible `next` handler.
	pub fn fallible<F>(next: F) -> Self
	where
		F: Fn(&T) -> Result<(), HandlerError> + 'static,
	{
		Self {
			next: Some(Rc::new(next)),
			error: None,
			complete: None,
		}
	}

	/// Creates an observer without any handler.
	pub fn empty() -> Self {
		Self {
			next: None,
			error: None,
			complete: None,
		}
	}

	/// Sets the error handler.
	pub fn on_error<F>(mut self, handler: F) -> Self
	where
		F: Fn(&HandlerError) + 'static,
	{
		self.error = Some(Rc::new(handler));
		self
	}

	/// Sets the completion handler.
	pub fn on_complete<F>(mut self, handler: F) -> Self
	where
		F: Fn() + 'static,
	{
		self.complete = Some(Rc::new(handler));
		self
	}

	/// Returns true if an error handler is set.
	pub fn has_error_handler(&self) -> bool {
		self.error.is_some()
	}

	/// Delivers a value, routing a handler failure to [`Observer::error`].
	pub fn next(&self, value: &T) {
		if let Some(next) = &self.next {
			if let Err(err) = next(value) {
				self.error(&err);
			}
		}
	}

	/// Delivers an error to the error handler, or swallows it.
	pub fn error(&self, err: &HandlerError) {
		match &self.error {
			Some(handler) => handler(err),
			None => {
				tracing::debug!(target: "magnetic", error = %err, "observer error swallowed");
			}
		}
	}

	/// Invokes the completion handler, if any.
	pub fn complete(&self) {
		if let Some(complete) = &self.complete {
			complete();
		}
	}
}

impl<T> Clone for Observer<T> {
	fn clone(&self) -> Self {
		Self {
			next: self.next.clone(),
			error: self.error.clone(),
			complete: self.complete.clone(),
		}
	}
}

impl<T> Default for Observer<T> {
	fn default() -> Self {
		Self::empty()
	}
}

impl<T> fmt::Debug for Observer<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Observer")
			.field("next", &self.next.as_ref().map(|_| "<function>"))
			.field("error", &self.error.as_ref().map(|_| "<function>"))
			.field("complete", &self.complete.as_ref().map(|_| "<function>"))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::cell::{Cell, RefCell};

	#[derive(Debug, Error)]
	#[error("boom")]
	struct Boom;

	#[rstest]
	fn test_next_invokes_handler() {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = seen.clone();
		let observer = Observer::new(move |value: &u8| sink.borrow_mut().push(*value));

		observer.next(&1);
		observer.next(&2);

		assert_eq!(*seen.borrow(), vec![1, 2]);
	}

	#[rstest]
	fn test_failure_routed_to_error_handler() {
		let errors = Rc::new(RefCell::new(Vec::new()));
		let sink = errors.clone();
		let observer = Observer::fallible(|_: &u8| Err(HandlerError::msg("bad value")))
			.on_error(move |err| sink.borrow_mut().push(err.to_string()));

		observer.next(&1);

		assert_eq!(*errors.borrow(), vec!["bad value".to_string()]);
	}

	#[rstest]
	fn test_failure_without_error_handler_is_swallowed() {
		let observer = Observer::fallible(|_: &u8| Err(HandlerError::msg("ignored")));
		assert!(!observer.has_error_handler());

		// Must not panic
		observer.next(&1);
	}

	#[rstest]
	fn test_complete_handler() {
		let completed = Rc::new(Cell::new(false));
		let flag = completed.clone();
		let observer = Observer::<u8>::empty().on_complete(move || flag.set(true));

		observer.complete();

		assert!(completed.get());
	}

	#[rstest]
	fn test_downcast_source_error() {
		let err = HandlerError::new(Boom);
		assert!(err.downcast_ref::<Boom>().is_some());
		assert_eq!(err.to_string(), "boom");
		assert!(HandlerError::msg("x").downcast_ref::<Boom>().is_none());
	}
}
