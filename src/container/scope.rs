use std::cell::RefCell;
use std::rc::Rc;

/// Stack of "current" containers.
///
/// Entities created while a container is on top of the stack are captured into it. Entering
/// returns a guard; the previous container becomes current again when the guard drops, on
/// every exit path including early returns and unwinding.
#[derive(Clone, Debug, Default)]
pub struct ActiveContainerStack {
    stack: Rc<RefCell<Vec<String>>>,
}

impl ActiveContainerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.stack.borrow().last().cloned()
    }

    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    /// Push `container` and return the guard that pops it.
    #[must_use = "the container stops being active as soon as the guard is dropped"]
    pub fn enter(&self, container: impl Into<String>) -> ActiveContainerGuard {
        let name = container.into();
        let mut stack = self.stack.borrow_mut();
        stack.push(name.clone());
        ActiveContainerGuard {
            stack: Rc::clone(&self.stack),
            depth: stack.len(),
            name,
        }
    }
}

#[derive(Debug)]
pub struct ActiveContainerGuard {
    stack: Rc<RefCell<Vec<String>>>,
    depth: usize,
    name: String,
}

impl ActiveContainerGuard {
    pub fn container(&self) -> &str {
        &self.name
    }
}

impl Drop for ActiveContainerGuard {
    fn drop(&mut self) {
        let mut stack = self.stack.borrow_mut();
        if stack.len() >= self.depth {
            stack.truncate(self.depth - 1);
        } else {
            tracing::warn!(container = %self.name, "active container stack unwound out of order");
        }
    }
}
