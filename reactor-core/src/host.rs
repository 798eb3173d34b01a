//! Host Loop Integration
//!
//! Invalidations don't re-run computations right away. They ask for a
//! flush, and something has to run it: normally the host application's
//! main loop, at the head of its next iteration. [`FlushScheduler`] is that
//! seam. Without a scheduler, a reactor only flushes when application code
//! calls [`Reactor::flush`](crate::Reactor::flush) itself.
//!
//! [`MainLoop`] is a minimal single-threaded task queue that implements the
//! seam, for hosts that don't bring their own loop and for tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A task posted to a host loop.
pub type Task = Box<dyn FnOnce()>;

/// The host's "run this at the start of the next loop iteration" primitive.
pub trait FlushScheduler {
    /// Arrange for `flush` to run ahead of any other queued work.
    fn schedule_flush(&self, flush: Task);
}

/// A single-threaded FIFO task queue.
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct MainLoop {
    queue: Rc<RefCell<VecDeque<Task>>>,
}

impl MainLoop {
    /// Create an empty loop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task behind everything already posted.
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Queue a task ahead of everything already posted.
    pub fn post_at_front<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.queue.borrow_mut().push_front(Box::new(task));
    }

    /// Run the task at the head of the queue.
    ///
    /// Returns `false` if the queue was empty.
    pub fn run_once(&self) -> bool {
        // Pop first: the task may post more tasks.
        let task = self.queue.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until the queue is empty, including tasks posted along the
    /// way. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_once() {
            ran += 1;
        }
        ran
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl FlushScheduler for MainLoop {
    fn schedule_flush(&self, flush: Task) {
        self.queue.borrow_mut().push_front(flush);
    }
}

impl std::fmt::Debug for MainLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainLoop")
            .field("queued", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_run_in_fifo_order() {
        let main_loop = MainLoop::new();
        let log = Rc::new(RefCell::new(String::new()));

        for letter in ['a', 'b', 'c'] {
            let log = log.clone();
            main_loop.post(move || log.borrow_mut().push(letter));
        }

        assert_eq!(main_loop.len(), 3);
        assert_eq!(main_loop.run_until_idle(), 3);
        assert_eq!(*log.borrow(), "abc");
        assert!(main_loop.is_empty());
    }

    #[test]
    fn scheduled_flush_jumps_the_queue() {
        let main_loop = MainLoop::new();
        let log = Rc::new(RefCell::new(String::new()));

        let first = log.clone();
        main_loop.post(move || first.borrow_mut().push('t'));
        let flush = log.clone();
        main_loop.schedule_flush(Box::new(move || flush.borrow_mut().push('f')));

        main_loop.run_until_idle();
        assert_eq!(*log.borrow(), "ft");
    }

    #[test]
    fn tasks_may_post_tasks() {
        let main_loop = MainLoop::new();
        let count = Rc::new(RefCell::new(0));

        let inner_loop = main_loop.clone();
        let inner_count = count.clone();
        main_loop.post(move || {
            *inner_count.borrow_mut() += 1;
            let nested = inner_count.clone();
            inner_loop.post(move || *nested.borrow_mut() += 10);
        });

        assert_eq!(main_loop.run_until_idle(), 2);
        assert_eq!(*count.borrow(), 11);
    }

    #[test]
    fn run_once_on_empty_loop() {
        assert!(!MainLoop::new().run_once());
    }
}
