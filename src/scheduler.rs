use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Identifier of a cooperative script-execution context.
///
/// These are not OS threads: the embedding multiplexes script contexts on one
/// native thread and only ever runs one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub u32);

/// One cooperative script-execution context.
#[derive(Debug)]
pub struct ScriptThread {
    id: ThreadId,
    blocked: Cell<bool>,
}

impl ScriptThread {
    fn new(id: ThreadId) -> Self {
        Self {
            id,
            blocked: Cell::new(false),
        }
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Whether this context is currently unable to make progress (for
    /// example, parked on a debugger stop). Mutation algorithms consult this
    /// after delivering an event to decide whether they must suspend.
    pub fn is_blocked(&self) -> bool {
        self.blocked.get()
    }

    pub fn block(&self) {
        self.blocked.set(true);
    }

    pub fn unblock(&self) {
        self.blocked.set(false);
    }
}

/// The external script-thread scheduler, kept opaque: this subsystem only
/// ever asks "which context is running" and "is it blocked". Fairness and
/// priority live entirely on the other side of this boundary.
pub struct Scheduler {
    threads: RefCell<Vec<Rc<ScriptThread>>>,
    current: Cell<ThreadId>,
    next_id: Cell<u32>,
}

impl Scheduler {
    pub fn new() -> Rc<Self> {
        let main = Rc::new(ScriptThread::new(ThreadId(1)));
        Rc::new(Self {
            threads: RefCell::new(vec![main]),
            current: Cell::new(ThreadId(1)),
            next_id: Cell::new(2),
        })
    }

    pub fn spawn(&self) -> Rc<ScriptThread> {
        let id = ThreadId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        let thread = Rc::new(ScriptThread::new(id));
        self.threads.borrow_mut().push(Rc::clone(&thread));
        thread
    }

    pub fn current_thread(&self) -> Rc<ScriptThread> {
        let current = self.current.get();
        self.threads
            .borrow()
            .iter()
            .find(|thread| thread.id() == current)
            .cloned()
            .unwrap_or_else(|| {
                // The current id always names a live context; the main thread
                // is never removed.
                Rc::clone(&self.threads.borrow()[0])
            })
    }

    pub fn thread(&self, id: ThreadId) -> Option<Rc<ScriptThread>> {
        self.threads
            .borrow()
            .iter()
            .find(|thread| thread.id() == id)
            .cloned()
    }

    pub fn switch_to(&self, id: ThreadId) {
        if self.thread(id).is_some() {
            self.current.set(id);
        }
    }
}
