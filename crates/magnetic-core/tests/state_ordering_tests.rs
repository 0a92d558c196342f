//! Property tests for the reactive value container
//!
//! For every update sequence `v1..vn`:
//! 1. A subscriber registered before the sequence observes the initial value
//!    followed by exactly `v1..vn`, in order.
//! 2. A subscriber registered after `vk` observes `vk, v(k+1), .., vn`.

use magnetic_core::reactive::{Observer, State, Stream};
use proptest::prelude::*;
use rstest::rstest;
use std::cell::RefCell;
use std::rc::Rc;

fn recording_observer(log: &Rc<RefCell<Vec<i64>>>) -> Observer<i64> {
	let sink = log.clone();
	Observer::new(move |value: &i64| sink.borrow_mut().push(*value))
}

proptest! {
	#[test]
	fn prop_early_subscriber_sees_every_update(
		initial in any::<i64>(),
		updates in prop::collection::vec(any::<i64>(), 0..32),
	) {
		let state = State::new(initial);
		let log = Rc::new(RefCell::new(Vec::new()));
		state.subscribe(recording_observer(&log));

		for value in &updates {
			state.update(*value);
		}

		let mut expected = vec![initial];
		expected.extend(updates.iter().copied());
		prop_assert_eq!(&*log.borrow(), &expected);
	}

	#[test]
	fn prop_late_subscriber_starts_at_current(
		updates in prop::collection::vec(any::<i64>(), 1..32),
		split in any::<prop::sample::Index>(),
	) {
		let k = split.index(updates.len());
		let state = State::new(0);
		for value in &updates[..=k] {
			state.update(*value);
		}

		let log = Rc::new(RefCell::new(Vec::new()));
		state.subscribe(recording_observer(&log));
		for value in &updates[k + 1..] {
			state.update(*value);
		}

		prop_assert_eq!(&*log.borrow(), &updates[k..].to_vec());
	}
}

// ============================================================================
// Multicast ordering
// ============================================================================

/// Tests that every subscriber of a stream sees the same sequence
#[rstest]
fn test_stream_subscribers_share_sequence() {
	let stream = Stream::new();
	let first = Rc::new(RefCell::new(Vec::new()));
	let second = Rc::new(RefCell::new(Vec::new()));
	stream.subscribe(recording_observer(&first));
	stream.subscribe(recording_observer(&second));

	for value in [3, 1, 4, 1, 5] {
		stream.push(value);
	}

	assert_eq!(*first.borrow(), vec![3, 1, 4, 1, 5]);
	assert_eq!(*first.borrow(), *second.borrow());
}

/// Tests that a subscriber added by a handler gets the replay, then later values
#[rstest]
fn test_subscriber_added_during_update_sees_replay_then_future() {
	let state = State::new(0_i64);
	let late_log = Rc::new(RefCell::new(Vec::new()));
	let registered = Rc::new(RefCell::new(false));

	let source = state.clone();
	let log = late_log.clone();
	let flag = registered.clone();
	state.subscribe_changes(Observer::new(move |_: &i64| {
		if !*flag.borrow() {
			*flag.borrow_mut() = true;
			source.subscribe(recording_observer(&log));
		}
	}));

	state.update(1);
	state.update(2);

	assert_eq!(*late_log.borrow(), vec![1, 2]);
}
