//! Ordered multi-child container
//!
//! A [`Sequence`] steps its children in insertion order every tick. Four
//! policy flags control early exit, removal of completed children and the
//! value reported back to the parent. The named factories ([`each`], [`all`],
//! [`queue`], [`until_first_false`]) are flag presets over the same type.

use super::activity::{Activity, BoxedActivity};

/// Ordered, mutable collection of activities
pub struct Sequence {
    list: Vec<BoxedActivity>,
    remove_on_complete: bool,
    stop_on_first_false: bool,
    stop_on_first_true: bool,
    return_true_if_all_true: bool,
    return_on_empty: bool,
}

impl Default for Sequence {
    fn default() -> Self {
        Self {
            list: Vec::new(),
            remove_on_complete: false,
            stop_on_first_false: false,
            stop_on_first_true: false,
            return_true_if_all_true: false,
            return_on_empty: true,
        }
    }
}

impl Sequence {
    /// Create an empty sequence with every flag cleared and `return_on_empty = true`
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an activity; it will be stepped after every activity already present
    pub fn push(&mut self, activity: BoxedActivity) -> &mut Self {
        self.list.push(activity);
        self
    }

    /// Append several activities, keeping their order
    pub fn extend(&mut self, activities: impl IntoIterator<Item = BoxedActivity>) -> &mut Self {
        self.list.extend(activities);
        self
    }

    /// Number of activities currently held
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Whether the sequence holds no activities
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Drop activities once they report completion
    pub fn remove_on_complete(mut self, enabled: bool) -> Self {
        self.remove_on_complete = enabled;
        self
    }

    /// Stop the pass at the first activity reporting `false`
    pub fn stop_on_first_false(mut self, enabled: bool) -> Self {
        self.stop_on_first_false = enabled;
        self
    }

    /// Stop the pass at the first activity reporting `true`
    pub fn stop_on_first_true(mut self, enabled: bool) -> Self {
        self.stop_on_first_true = enabled;
        self
    }

    /// Report the AND of all results when the pass visits every activity
    pub fn return_true_if_all_true(mut self, enabled: bool) -> Self {
        self.return_true_if_all_true = enabled;
        self
    }

    /// Value reported when the sequence is empty
    pub fn return_on_empty(mut self, value: bool) -> Self {
        self.return_on_empty = value;
        self
    }

    /// Whether completed activities are removed
    pub fn removes_on_complete(&self) -> bool {
        self.remove_on_complete
    }

    /// Whether the pass stops at the first `false`
    pub fn stops_on_first_false(&self) -> bool {
        self.stop_on_first_false
    }

    /// Whether the pass stops at the first `true`
    pub fn stops_on_first_true(&self) -> bool {
        self.stop_on_first_true
    }

    /// Whether a full pass reports the AND of all results
    pub fn returns_true_if_all_true(&self) -> bool {
        self.return_true_if_all_true
    }

    /// Value reported on an empty sequence
    pub fn empty_value(&self) -> bool {
        self.return_on_empty
    }
}

impl Activity for Sequence {
    fn step(&mut self) -> bool {
        if self.list.is_empty() {
            return self.return_on_empty;
        }

        let len = self.list.len();
        let mut visited = 0;
        let mut all_done = true;
        let mut completed = Vec::new();

        for (index, activity) in self.list.iter_mut().enumerate() {
            let done = activity.step();
            all_done &= done;
            if done {
                if self.remove_on_complete {
                    completed.push(index);
                }
                if self.stop_on_first_true {
                    break;
                }
            } else if self.stop_on_first_false {
                break;
            }
            visited += 1;
        }

        // Removal happens only after the pass so nothing is skipped or visited twice.
        if !completed.is_empty() {
            let mut index = 0;
            let mut next = completed.iter().peekable();
            self.list.retain(|_| {
                let remove = next.next_if_eq(&&index).is_some();
                index += 1;
                !remove
            });
            tracing::trace!(removed = completed.len(), remaining = self.list.len(), "sequence pruned");
        }

        visited == len && self.return_true_if_all_true && all_done
    }
}

/// Sequence reporting `true` once every activity completes in the same pass.
///
/// Nothing is removed and nothing exits early; this is the building block the
/// other presets start from.
pub fn each(activities: impl IntoIterator<Item = BoxedActivity>) -> Sequence {
    let mut sequence = Sequence::new().return_true_if_all_true(true);
    sequence.extend(activities);
    sequence
}

/// Re-step every activity on every tick, forever; complete when all are complete
pub fn all(activities: impl IntoIterator<Item = BoxedActivity>) -> Sequence {
    each(activities)
}

/// Run activities until each one individually completes, then drop it
pub fn queue(activities: impl IntoIterator<Item = BoxedActivity>) -> Sequence {
    each(activities).remove_on_complete(true)
}

/// Step a prefix each tick, stopping at the first activity not yet complete
pub fn until_first_false(activities: impl IntoIterator<Item = BoxedActivity>) -> Sequence {
    each(activities).stop_on_first_false(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities;
    use crate::runtime::activity::mock::MockActivity;
    use crate::runtime::activity::{from_fn, ActivityExt};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_queue_flags_and_removal() {
        let m1 = MockActivity::new();
        let m2 = MockActivity::new();
        let mut seq = queue(activities![m1.clone(), m2.clone()]);

        assert!(!seq.stops_on_first_false());
        assert!(!seq.stops_on_first_true());
        assert!(seq.removes_on_complete());
        assert!(seq.empty_value());
        assert!(seq.returns_true_if_all_true());

        seq.step();
        seq.step();
        assert_eq!((m1.steps(), m2.steps()), (2, 2));

        m1.complete();
        m2.complete();
        seq.step();
        assert_eq!((m1.steps(), m2.steps()), (3, 3));
        assert!(seq.is_empty());

        assert!(seq.step());
        assert_eq!((m1.steps(), m2.steps()), (3, 3));
    }

    #[test]
    fn test_each_keeps_completed() {
        let m1 = MockActivity::new();
        let m2 = MockActivity::new();
        let mut seq = each(activities![m1.clone(), m2.clone()]);

        assert!(!seq.removes_on_complete());
        assert!(!seq.step());
        assert!(!seq.step());

        m1.complete();
        m2.complete();
        assert!(seq.step());
        assert_eq!(seq.len(), 2);
        assert_eq!((m1.steps(), m2.steps()), (3, 3));
    }

    #[test]
    fn test_all_reports_and_of_results() {
        let m1 = MockActivity::new();
        let m2 = MockActivity::new();
        let mut seq = all(activities![m1.clone(), m2.clone()]);

        assert!(!seq.step());
        m1.complete();
        assert!(!seq.step());
        m2.complete();
        assert!(seq.step());
        m1.reset();
        assert!(!seq.step());
    }

    #[test]
    fn test_until_first_false_runs_prefix() {
        let m1 = MockActivity::completed();
        let m2 = MockActivity::new();
        let m3 = MockActivity::new();
        let mut seq = until_first_false(activities![m1.clone(), m2.clone(), m3.clone()]);

        assert!(!seq.step());
        assert_eq!((m1.steps(), m2.steps(), m3.steps()), (1, 1, 0));

        m2.complete();
        assert!(!seq.step());
        assert_eq!((m1.steps(), m2.steps(), m3.steps()), (2, 2, 1));

        m3.complete();
        assert!(seq.step());
        assert_eq!((m1.steps(), m2.steps(), m3.steps()), (3, 3, 2));
    }

    #[test]
    fn test_stop_on_first_true_marks_then_stops() {
        let m1 = MockActivity::new();
        let m2 = MockActivity::completed();
        let m3 = MockActivity::new();
        let mut seq = Sequence::new()
            .stop_on_first_true(true)
            .remove_on_complete(true)
            .return_true_if_all_true(true);
        seq.extend(activities![m1.clone(), m2.clone(), m3.clone()]);

        assert!(!seq.step());
        assert_eq!((m1.steps(), m2.steps(), m3.steps()), (1, 1, 0));
        assert_eq!(seq.len(), 2);

        assert!(!seq.step());
        assert_eq!((m1.steps(), m2.steps(), m3.steps()), (2, 1, 1));
    }

    #[test]
    fn test_empty_value_is_configurable() {
        assert!(Sequence::new().step());
        assert!(!Sequence::new().return_on_empty(false).step());
    }

    #[test]
    fn test_without_all_true_flag_reports_false() {
        let mut seq = Sequence::new();
        seq.push(from_fn(|| true).boxed());
        assert!(!seq.step());
    }

    #[test]
    fn test_removal_keeps_remaining_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut items = Vec::new();
        for id in 0..5 {
            let log = log.clone();
            // even ids finish on their first step
            items.push(from_fn(move || {
                log.borrow_mut().push(id);
                id % 2 == 0
            })
            .boxed());
        }
        let mut seq = queue(items);

        seq.step();
        assert_eq!(seq.len(), 2);
        log.borrow_mut().clear();
        seq.step();
        assert_eq!(*log.borrow(), vec![1, 3]);
    }

    proptest! {
        #[test]
        fn prop_children_stepped_in_insertion_order(outcomes in proptest::collection::vec(any::<bool>(), 1..12)) {
            let log = Rc::new(RefCell::new(Vec::new()));
            let items: Vec<BoxedActivity> = outcomes
                .iter()
                .enumerate()
                .map(|(id, &outcome)| {
                    let log = log.clone();
                    from_fn(move || {
                        log.borrow_mut().push(id);
                        outcome
                    })
                    .boxed()
                })
                .collect();
            let mut seq = all(items);

            for _ in 0..3 {
                log.borrow_mut().clear();
                let done = seq.step();
                let expected: Vec<usize> = (0..outcomes.len()).collect();
                prop_assert_eq!(&*log.borrow(), &expected);
                prop_assert_eq!(done, outcomes.iter().all(|&o| o));
            }
        }

        #[test]
        fn prop_queue_never_revisits_completed(outcomes in proptest::collection::vec(any::<bool>(), 0..12)) {
            let log = Rc::new(RefCell::new(Vec::new()));
            let items: Vec<BoxedActivity> = outcomes
                .iter()
                .enumerate()
                .map(|(id, &outcome)| {
                    let log = log.clone();
                    from_fn(move || {
                        log.borrow_mut().push(id);
                        outcome
                    })
                    .boxed()
                })
                .collect();
            let mut seq = queue(items);

            seq.step();
            let pending: Vec<usize> = (0..outcomes.len()).filter(|&id| !outcomes[id]).collect();
            prop_assert_eq!(seq.len(), pending.len());

            log.borrow_mut().clear();
            let done = seq.step();
            prop_assert_eq!(&*log.borrow(), &pending);
            prop_assert_eq!(done, pending.is_empty());
        }
    }
}
