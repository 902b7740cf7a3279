//! Outbound event contract.
//!
//! Each component emits a fixed, enumerated set of events into exactly one [`EventSink`]
//! supplied at construction. Closures implement the trait directly, and [`EventLog`] records
//! events for hosts that prefer polling (and for tests).

// self
use crate::{_prelude::*, error::RiskError, fraud::Processor};

/// Receiver for a component's events.
pub trait EventSink<E>: Send + Sync {
	/// Delivers one event.
	fn emit(&self, event: E);
}
impl<E, F> EventSink<E> for F
where
	F: Fn(E) + Send + Sync,
{
	fn emit(&self, event: E) {
		self(event)
	}
}

/// Events emitted by [`ThreeDSecure`](crate::three_d_secure::ThreeDSecure).
#[derive(Clone, Debug, PartialEq)]
pub enum ThreeDSecureEvent {
	/// The selected strategy finished its readiness gate.
	Ready,
	/// Authentication finished; carries the vendor results.
	Done(Value),
	/// Authentication failed.
	Error(RiskError),
}

/// Events emitted by [`FraudCollector`](crate::fraud::FraudCollector).
#[derive(Clone, Debug, PartialEq)]
pub enum FraudEvent {
	/// A risk profile was activated.
	Ready(Processor),
	/// Collection failed.
	Error(RiskError),
}

/// Thread-safe in-memory sink that keeps every event in arrival order.
#[derive(Debug)]
pub struct EventLog<E>(Mutex<Vec<E>>);
impl<E> EventLog<E> {
	/// Creates an empty log.
	pub fn new() -> Self {
		Self(Mutex::new(Vec::new()))
	}

	/// Number of recorded events.
	pub fn len(&self) -> usize {
		self.0.lock().len()
	}

	/// Whether no event has been recorded.
	pub fn is_empty(&self) -> bool {
		self.0.lock().is_empty()
	}

	/// Removes and returns every recorded event.
	pub fn drain(&self) -> Vec<E> {
		std::mem::take(&mut *self.0.lock())
	}
}
impl<E> EventLog<E>
where
	E: Clone,
{
	/// Copies the recorded events.
	pub fn snapshot(&self) -> Vec<E> {
		self.0.lock().clone()
	}
}
impl<E> Default for EventLog<E> {
	fn default() -> Self {
		Self::new()
	}
}
impl<E> EventSink<E> for EventLog<E>
where
	E: Send,
{
	fn emit(&self, event: E) {
		self.0.lock().push(event);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn closures_and_logs_are_sinks() {
		let log = Arc::new(EventLog::new());
		let forward = {
			let log = log.clone();

			move |event: ThreeDSecureEvent| log.emit(event)
		};
		let sink: Arc<dyn EventSink<ThreeDSecureEvent>> = Arc::new(forward);

		sink.emit(ThreeDSecureEvent::Ready);
		sink.emit(ThreeDSecureEvent::Done(Value::Null));

		assert_eq!(log.snapshot(), vec![ThreeDSecureEvent::Ready, ThreeDSecureEvent::Done(Value::Null)]);
		assert_eq!(log.drain().len(), 2);
		assert!(log.is_empty());
	}
}
