//! Integration tests for composed activity trees
//!
//! Exercises ordering and termination across combinators, sequences and
//! stacks the way a tick host drives them: one root `step()` per tick.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tickloop::activities;
use tickloop::runtime::activity::{
    always, any, from_fn, noop, once, unless, when, when_else, Activity, ActivityExt,
    BoxedActivity,
};
use tickloop::runtime::sequence::{all, queue, until_first_false};
use tickloop::runtime::stack::{stack, Stack};

/// Counts steps and reports a completion flag the test controls
#[derive(Clone, Default)]
struct Probe {
    steps: Rc<Cell<u32>>,
    done: Rc<Cell<bool>>,
}

impl Probe {
    fn new() -> Self {
        Self::default()
    }

    fn finish(&self) {
        self.done.set(true);
    }

    fn steps(&self) -> u32 {
        self.steps.get()
    }
}

impl Activity for Probe {
    fn step(&mut self) -> bool {
        self.steps.set(self.steps.get() + 1);
        self.done.get()
    }
}

/// Activity that appends `id` to `log` and reports `result`
fn logging(log: &Rc<RefCell<Vec<&'static str>>>, id: &'static str, result: bool) -> BoxedActivity {
    let log = log.clone();
    from_fn(move || {
        log.borrow_mut().push(id);
        result
    })
    .boxed()
}

#[test]
fn test_sequence_visits_children_in_insertion_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut root = all(vec![
        logging(&log, "a", false),
        logging(&log, "b", true),
        logging(&log, "c", false),
    ]);

    for _ in 0..3 {
        assert!(!root.step());
    }
    assert_eq!(*log.borrow(), vec!["a", "b", "c", "a", "b", "c", "a", "b", "c"]);
}

#[test]
fn test_queue_drains_and_then_reports_empty_value() {
    let a = Probe::new();
    let b = Probe::new();
    let mut q = queue(activities![a.clone(), b.clone()]);

    assert!(!q.step());
    assert!(!q.step());
    a.finish();
    b.finish();
    q.step();
    assert!(q.is_empty());

    assert!(q.step());
    assert_eq!((a.steps(), b.steps()), (3, 3));
}

#[test]
fn test_stack_override_falls_back_to_base_behaviour() {
    let base = Probe::new();
    let interrupt = Probe::new();

    let mut s = stack(activities![base.clone()]);
    s.step();
    assert_eq!(base.steps(), 1);

    s.push(interrupt.clone().boxed());
    s.step();
    s.step();
    assert_eq!((base.steps(), interrupt.steps()), (1, 2));

    interrupt.finish();
    s.step();
    assert_eq!((base.steps(), interrupt.steps()), (2, 3));

    s.step();
    assert_eq!((base.steps(), interrupt.steps()), (3, 3));
    assert_eq!(s.len(), 1);
}

#[test]
fn test_stack_of_queues_runs_plan_steps_in_order() {
    let log = Rc::new(RefCell::new(Vec::new()));

    // Each plan step completes on its first tick; the stack runs the most recent plan first.
    let first_plan = until_first_false(vec![logging(&log, "p1-a", true), logging(&log, "p1-b", true)]);
    let second_plan = until_first_false(vec![logging(&log, "p2-a", true)]);

    let mut s = Stack::new();
    s.push(first_plan.boxed());
    s.push(second_plan.boxed());

    assert!(!s.step());
    assert!(s.is_empty());
    assert_eq!(*log.borrow(), vec!["p2-a", "p1-a", "p1-b"]);
}

#[test]
fn test_once_inside_all_runs_a_single_time() {
    let setup = Probe::new();
    setup.finish();
    let loop_body = Probe::new();
    let mut root = all(activities![once(setup.clone()), loop_body.clone()]);

    for _ in 0..5 {
        root.step();
    }
    assert_eq!((setup.steps(), loop_body.steps()), (1, 5));
}

#[test]
fn test_any_steps_every_child_every_call() {
    let a = Probe::new();
    let b = Probe::new();
    let c = Probe::new();
    b.finish();
    let mut root = any(activities![a.clone(), b.clone(), c.clone()]);

    assert!(root.step());
    assert!(root.step());
    assert_eq!((a.steps(), b.steps(), c.steps()), (2, 2, 2));
}

#[test]
fn test_guards_pause_whole_subtree() {
    let paused = Rc::new(Cell::new(false));
    let body = Probe::new();
    let test = {
        let paused = paused.clone();
        from_fn(move || paused.get())
    };
    let mut root = unless(test, all(activities![body.clone()]));

    root.step();
    paused.set(true);
    root.step();
    root.step();
    paused.set(false);
    root.step();
    assert_eq!(body.steps(), 2);
}

#[test]
fn test_when_else_selects_branch_each_tick() {
    let toggle = Rc::new(Cell::new(true));
    let yes = Probe::new();
    let no = Probe::new();
    let test = {
        let toggle = toggle.clone();
        from_fn(move || {
            let value = toggle.get();
            toggle.set(!value);
            value
        })
    };
    let mut root = when_else(test, yes.clone(), no.clone());

    for _ in 0..5 {
        root.step();
    }
    assert_eq!((yes.steps(), no.steps()), (3, 2));
}

#[test]
fn test_always_keeps_child_alive_in_queue() {
    let keeper = Probe::new();
    keeper.finish();
    let mut q = queue(activities![always(keeper.clone()), when(noop(), noop())]);

    for _ in 0..4 {
        assert!(!q.step());
    }
    assert_eq!(q.len(), 2);
    assert_eq!(keeper.steps(), 4);
}
