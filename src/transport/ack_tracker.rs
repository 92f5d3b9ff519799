//! Pairs subscribe requests with their SUBACK packets.
//!
//! rumqttc assigns packet ids when it writes a request, so a request is
//! first queued in send order and bound to its packet id once the event
//! loop reports `Outgoing::Subscribe(pkid)`. Callers must hold the
//! transport's send lock from [`AckTracker::enqueue`] until the request is
//! handed to the client, otherwise queue order and wire order diverge.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use rumqttc::SubscribeReasonCode;
use tokio::sync::oneshot;
use tracing::debug;

use super::TransportError;

type AckSender = oneshot::Sender<Result<(), TransportError>>;
pub(crate) type AckReceiver = oneshot::Receiver<Result<(), TransportError>>;

#[derive(Default)]
struct AckState {
	queued: VecDeque<AckSender>,
	inflight: HashMap<u16, AckSender>,
}

#[derive(Default)]
pub(crate) struct AckTracker {
	state: Mutex<AckState>,
}

impl AckTracker {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Queues a pending acknowledgement for the next subscribe request.
	pub(crate) fn enqueue(&self) -> AckReceiver {
		let (tx, rx) = oneshot::channel();
		self.state.lock().queued.push_back(tx);
		rx
	}

	/// Drops the most recently queued entry; its request never reached the
	/// client.
	pub(crate) fn cancel_last(&self) {
		self.state.lock().queued.pop_back();
	}

	/// The event loop wrote the oldest queued request with packet id `pkid`.
	pub(crate) fn on_outgoing(&self, pkid: u16) {
		let mut state = self.state.lock();
		match state.queued.pop_front() {
			| Some(tx) => {
				state.inflight.insert(pkid, tx);
			}
			| None => {
				debug!(pkid, "Outgoing SUBSCRIBE without a pending token");
			}
		}
	}

	/// Resolves the token bound to `pkid`.
	pub(crate) fn on_suback(&self, pkid: u16, codes: &[SubscribeReasonCode]) {
		let Some(tx) = self.state.lock().inflight.remove(&pkid) else {
			debug!(pkid, "SUBACK without a pending token");
			return;
		};
		let result = if codes
			.iter()
			.all(|code| matches!(code, SubscribeReasonCode::Success(_)))
		{
			Ok(())
		} else {
			Err(TransportError::SubscribeRejected)
		};
		// Receiver gone means the caller stopped waiting (timeout)
		let _ = tx.send(result);
	}

	/// Fails every request already written to the connection.
	///
	/// Queued requests stay: they are still in the client's request channel
	/// and will be written after reconnecting.
	pub(crate) fn fail_inflight(&self) {
		let inflight: Vec<AckSender> =
			self.state.lock().inflight.drain().map(|(_, tx)| tx).collect();
		for tx in inflight {
			let _ = tx.send(Err(TransportError::ConnectionLost));
		}
	}

	/// Fails every pending request, queued or in flight.
	pub(crate) fn fail_all(&self) {
		self.fail_inflight();
		let queued: Vec<AckSender> =
			self.state.lock().queued.drain(..).collect();
		for tx in queued {
			let _ = tx.send(Err(TransportError::ConnectionLost));
		}
	}

	#[cfg(test)]
	fn pending(&self) -> (usize, usize) {
		let state = self.state.lock();
		(state.queued.len(), state.inflight.len())
	}
}
