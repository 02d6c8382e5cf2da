use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::adapter::{Detach, FrameHandler, ListenRequest, Transport, TransportMessage};
use crate::error::TransportError;

/// Records listen requests and lets a test push frames into them.
#[derive(Default)]
pub(crate) struct MockTransport {
    listens: RefCell<Vec<(ListenRequest, Rc<RefCell<FrameHandler>>)>>,
    detached: Rc<Cell<usize>>,
    refuse: Cell<bool>,
}

impl MockTransport {
    pub(crate) fn refuse(&self) {
        self.refuse.set(true);
    }

    pub(crate) fn request(&self, index: usize) -> ListenRequest {
        self.listens.borrow()[index].0.clone()
    }

    pub(crate) fn listen_count(&self) -> usize {
        self.listens.borrow().len()
    }

    pub(crate) fn detached(&self) -> usize {
        self.detached.get()
    }

    pub(crate) fn push(&self, index: usize, message: TransportMessage) {
        let handler = self.listens.borrow()[index].1.clone();
        (handler.borrow_mut().as_mut())(message);
    }

    pub(crate) fn frame(&self, index: usize, frame: serde_json::Value) {
        self.push(index, TransportMessage::Frame(frame));
    }
}

impl Transport for MockTransport {
    fn listen(
        &self,
        request: ListenRequest,
        on_message: FrameHandler,
    ) -> Result<Detach, TransportError> {
        if self.refuse.get() {
            return Err(TransportError("socket closed".to_string()));
        }
        self.listens
            .borrow_mut()
            .push((request, Rc::new(RefCell::new(on_message))));
        let detached = self.detached.clone();
        Ok(Box::new(move || detached.set(detached.get() + 1)))
    }
}
