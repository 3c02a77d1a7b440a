//! The activity primitive and its combinators
//!
//! An activity is a small polling state machine: `step()` is called once per
//! tick and reports `true` when the work for its current goal is complete.
//! Behaviour trees are built by composing activities with the combinators in
//! this module and the containers in [`super::sequence`] and [`super::stack`].
//!
//! ```
//! use tickloop::runtime::activity::{from_fn, once, when, Activity};
//!
//! let mut fired = 0;
//! let mut a = when(from_fn(|| true), once(from_fn(move || {
//!     fired += 1;
//!     true
//! })));
//! assert!(a.step());
//! assert!(a.step());
//! ```

use std::time::{Duration, Instant};

/// A unit of behaviour polled once per tick.
///
/// `step` returns `true` when the activity's work is complete and `false`
/// when it should be called again next tick. There is no error channel: an
/// activity that cannot proceed reports `false`.
pub trait Activity {
    /// Perform one step of work
    fn step(&mut self) -> bool;
}

/// Heap-allocated activity, used wherever heterogeneous activities are stored
pub type BoxedActivity = Box<dyn Activity>;

impl<A: Activity + ?Sized> Activity for Box<A> {
    fn step(&mut self) -> bool {
        (**self).step()
    }
}

impl<A: Activity + ?Sized> Activity for &mut A {
    fn step(&mut self) -> bool {
        (**self).step()
    }
}

/// Convenience methods available on every sized activity
pub trait ActivityExt: Activity + Sized + 'static {
    /// Box this activity for storage in a container
    fn boxed(self) -> BoxedActivity {
        Box::new(self)
    }
}

impl<A: Activity + 'static> ActivityExt for A {}

/// Box a list of heterogeneous activities.
///
/// ```
/// use tickloop::activities;
/// use tickloop::runtime::activity::{noop, from_fn};
///
/// let list = activities![noop(), from_fn(|| true)];
/// assert_eq!(list.len(), 2);
/// ```
#[macro_export]
macro_rules! activities {
    ($($activity:expr),* $(,)?) => {
        ::std::vec![$(::std::boxed::Box::new($activity) as $crate::runtime::activity::BoxedActivity),*]
    };
}

/// Activity backed by a closure returning the completion flag
pub struct FromFn<F> {
    f: F,
}

impl<F: FnMut() -> bool> Activity for FromFn<F> {
    fn step(&mut self) -> bool {
        (self.f)()
    }
}

/// Turn a closure into an activity that returns whatever the closure returns
pub fn from_fn<F: FnMut() -> bool>(f: F) -> FromFn<F> {
    FromFn { f }
}

/// Activity that never completes
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

impl Activity for Noop {
    fn step(&mut self) -> bool {
        false
    }
}

/// An activity whose `step()` always returns `false`
pub fn noop() -> Noop {
    Noop
}

/// See [`always`]
pub struct Always<A> {
    inner: A,
}

impl<A: Activity> Activity for Always<A> {
    fn step(&mut self) -> bool {
        self.inner.step();
        false
    }
}

/// Step `activity` every tick, discarding its result.
///
/// The wrapper never completes, so the inner activity keeps running however
/// the surrounding container treats completed children.
pub fn always<A: Activity>(activity: A) -> Always<A> {
    Always { inner: activity }
}

/// See [`once`]
pub struct Once<A> {
    inner: A,
    result: Option<bool>,
}

impl<A: Activity> Activity for Once<A> {
    fn step(&mut self) -> bool {
        match self.result {
            Some(done) => done,
            None => {
                let done = self.inner.step();
                self.result = Some(done);
                done
            }
        }
    }
}

/// Step `activity` exactly once, then keep returning the value it produced
pub fn once<A: Activity>(activity: A) -> Once<A> {
    Once {
        inner: activity,
        result: None,
    }
}

/// See [`wrap`]
pub struct Wrap<C, F> {
    check: C,
    action: F,
}

impl<C, F> Activity for Wrap<C, F>
where
    C: FnMut() -> bool,
    F: FnMut(),
{
    fn step(&mut self) -> bool {
        if (self.check)() {
            return true;
        }
        (self.action)();
        false
    }
}

/// Adapt plain side-effecting code into an activity.
///
/// If `check()` holds the activity is complete and `action` is skipped;
/// otherwise `action` runs and the activity reports `false`.
pub fn wrap<C, F>(check: C, action: F) -> Wrap<C, F>
where
    C: FnMut() -> bool,
    F: FnMut(),
{
    Wrap { check, action }
}

/// Run `action` every tick; never completes
pub fn wrap_action<F: FnMut()>(action: F) -> Wrap<fn() -> bool, F> {
    fn never() -> bool {
        false
    }
    wrap(never as fn() -> bool, action)
}

/// Run `action` on the first step only
pub fn once_action<F: FnMut()>(action: F) -> Once<Wrap<fn() -> bool, F>> {
    once(wrap_action(action))
}

/// See [`when`] and [`when_else`]
pub struct When<T, A, B> {
    test: T,
    then: A,
    otherwise: B,
}

impl<T: Activity, A: Activity, B: Activity> Activity for When<T, A, B> {
    fn step(&mut self) -> bool {
        if self.test.step() {
            self.then.step()
        } else {
            self.otherwise.step()
        }
    }
}

/// Step `then` when `test` reports `true`; otherwise do nothing and return `false`
pub fn when<T: Activity, A: Activity>(test: T, then: A) -> When<T, A, Noop> {
    when_else(test, then, noop())
}

/// Step exactly one of `then` / `otherwise` depending on `test`
pub fn when_else<T: Activity, A: Activity, B: Activity>(
    test: T,
    then: A,
    otherwise: B,
) -> When<T, A, B> {
    When {
        test,
        then,
        otherwise,
    }
}

/// See [`unless`]
pub struct Unless<T, A> {
    test: T,
    inner: A,
}

impl<T: Activity, A: Activity> Activity for Unless<T, A> {
    fn step(&mut self) -> bool {
        if self.test.step() {
            false
        } else {
            self.inner.step()
        }
    }
}

/// Guard `activity`: it only runs while `test` reports `false`
pub fn unless<T: Activity, A: Activity>(test: T, activity: A) -> Unless<T, A> {
    Unless {
        test,
        inner: activity,
    }
}

/// See [`any`]
pub struct Any {
    activities: Vec<BoxedActivity>,
}

impl Activity for Any {
    fn step(&mut self) -> bool {
        // Every child is stepped; no short-circuit.
        self.activities
            .iter_mut()
            .fold(false, |done, activity| activity.step() || done)
    }
}

/// Step every activity in order; complete if at least one of them completed.
///
/// An empty `any` never completes.
pub fn any(activities: impl IntoIterator<Item = BoxedActivity>) -> Any {
    Any {
        activities: activities.into_iter().collect(),
    }
}

/// See [`delay`]
pub struct Delay<A> {
    start: Instant,
    wait: Duration,
    inner: A,
}

impl<A: Activity> Activity for Delay<A> {
    fn step(&mut self) -> bool {
        if self.start.elapsed() < self.wait {
            return false;
        }
        self.inner.step()
    }
}

/// Return `false` until `wait` has elapsed since construction, then step
/// `activity` on every call.
///
/// Gating uses wall-clock time, so the first tick on which `activity` runs
/// depends on the tick rate.
pub fn delay<A: Activity>(wait: Duration, activity: A) -> Delay<A> {
    Delay {
        start: Instant::now(),
        wait,
        inner: activity,
    }
}

/// [`delay`] with the wait given in milliseconds
pub fn delay_ms<A: Activity>(millis: u64, activity: A) -> Delay<A> {
    delay(Duration::from_millis(millis), activity)
}
