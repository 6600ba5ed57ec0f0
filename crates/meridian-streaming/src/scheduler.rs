//! Cooperative, tick-driven executor
//!
//! Script tasks are plain futures. The host loop calls [`Scheduler::tick`]
//! once per frame and every live task is polled exactly once, in spawn order.
//! Nothing blocks and nothing runs on another thread; a task that is not
//! ready simply yields until the next tick.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::future::{FutureExt, LocalBoxFuture};
use futures::task::noop_waker_ref;
use meridian_host::GameClock;
use tracing::trace;

/// Result slot shared between a running task and its [`TaskHandle`]
struct TaskSlot<T> {
    value: RefCell<Option<T>>,
    finished: Cell<bool>,
}

/// The caller's side of a spawned task.
///
/// Check it once per frame with [`try_take`](Self::try_take); it never blocks.
pub struct TaskHandle<T> {
    slot: Rc<TaskSlot<T>>,
}

impl<T> TaskHandle<T> {
    /// Take the output if the task has finished. Returns `None` while it is
    /// still running and after the output has already been taken.
    pub fn try_take(&self) -> Option<T> {
        self.slot.value.borrow_mut().take()
    }

    pub fn is_finished(&self) -> bool {
        self.slot.finished.get()
    }
}

/// An ordered list of tasks polled once per tick.
pub struct Scheduler {
    tasks: Vec<LocalBoxFuture<'static, ()>>,
    ticks: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            ticks: 0,
        }
    }

    /// Add a task to the end of the schedule. It is first polled on the next tick.
    pub fn spawn<F>(&mut self, future: F) -> TaskHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let slot = Rc::new(TaskSlot {
            value: RefCell::new(None),
            finished: Cell::new(false),
        });
        let task_slot = Rc::clone(&slot);
        self.tasks.push(
            async move {
                let output = future.await;
                *task_slot.value.borrow_mut() = Some(output);
                task_slot.finished.set(true);
            }
            .boxed_local(),
        );
        TaskHandle { slot }
    }

    /// Poll every live task once and drop the ones that finished.
    /// Returns how many finished on this tick.
    pub fn tick(&mut self) -> usize {
        self.ticks += 1;
        let mut cx = Context::from_waker(noop_waker_ref());
        let before = self.tasks.len();
        self.tasks
            .retain_mut(|task| task.as_mut().poll(&mut cx).is_pending());
        let finished = before - self.tasks.len();
        if finished > 0 {
            trace!("tick {}: {finished} task(s) finished, {} live", self.ticks, self.tasks.len());
        }
        finished
    }

    /// Number of ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of live tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Suspends until the host game timer has advanced by at least `ms`.
pub struct Delay<C: ?Sized> {
    clock: Rc<C>,
    deadline: u64,
}

impl<C: GameClock + ?Sized> Future for Delay<C> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.clock.game_timer() >= self.deadline {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Wait `ms` of game time, measured from now.
pub fn delay<C: GameClock + ?Sized>(clock: &Rc<C>, ms: u64) -> Delay<C> {
    Delay {
        deadline: clock.game_timer().saturating_add(ms),
        clock: Rc::clone(clock),
    }
}

/// Yields exactly once.
pub struct NextTick {
    yielded: bool,
}

impl Future for NextTick {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            Poll::Pending
        }
    }
}

/// Give up the rest of this tick.
pub fn next_tick() -> NextTick {
    NextTick { yielded: false }
}
