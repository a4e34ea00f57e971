//! Single-assignment completion cell for connect attempts.
//!
//! The write end ([`ConnectPromise`]) is consumed by `succeed`/`fail`, so a
//! second resolution is unrepresentable rather than merely forbidden. The
//! read end ([`ConnectFuture`]) is handed to the caller. Both sides live on
//! the loop thread; there is no cross-thread hand-off.

use std::cell::RefCell;
use std::rc::Rc;

use crate::channel::types::ConnectError;

#[derive(Debug)]
enum State {
    Pending,
    Complete(Result<(), ConnectError>),
    Taken,
}

/// Write end of a connect completion cell. Crate-internal: only the event
/// loop resolves connect attempts.
#[derive(Debug)]
pub(crate) struct ConnectPromise {
    cell: Rc<RefCell<State>>,
}

impl ConnectPromise {
    /// Creates a linked promise/future pair.
    pub(crate) fn new() -> (Self, ConnectFuture) {
        let cell = Rc::new(RefCell::new(State::Pending));
        (
            Self { cell: cell.clone() },
            ConnectFuture { cell },
        )
    }

    /// Resolves the attempt as successful.
    pub(crate) fn succeed(self) {
        self.complete(Ok(()));
    }

    /// Resolves the attempt as failed.
    pub(crate) fn fail(self, err: ConnectError) {
        self.complete(Err(err));
    }

    fn complete(self, result: Result<(), ConnectError>) {
        let mut state = self.cell.borrow_mut();
        debug_assert!(
            matches!(*state, State::Pending),
            "promise resolved while not pending"
        );
        *state = State::Complete(result);
    }
}

/// Read end of a connect completion cell.
#[derive(Debug)]
#[must_use = "a connect future should be polled or taken"]
pub struct ConnectFuture {
    cell: Rc<RefCell<State>>,
}

impl ConnectFuture {
    /// True while the attempt has not resolved.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(*self.cell.borrow(), State::Pending)
    }

    /// True once the attempt has resolved (and until the result is taken).
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(*self.cell.borrow(), State::Complete(_))
    }

    /// Takes the result if the attempt has resolved.
    ///
    /// Returns `None` while pending and after the result was already taken.
    #[must_use]
    pub fn take(&self) -> Option<Result<(), ConnectError>> {
        let mut state = self.cell.borrow_mut();
        match *state {
            State::Complete(_) => match std::mem::replace(&mut *state, State::Taken) {
                State::Complete(result) => Some(result),
                _ => None,
            },
            _ => None,
        }
    }
}
