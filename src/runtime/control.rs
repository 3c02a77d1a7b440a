//! Tick host: lifecycle phases and per-tick ordering
//!
//! The host owns the machine, one root activity per run mode and the
//! recorder. Each periodic call performs, in order, the recorder's playback,
//! the root activity, actuation, and the recorder's record step (teleop
//! only). In teleop a replayed snapshot replaces the root activity for that
//! tick, so an operator can trigger playback of a stored script. The activity tree and the recorder never call
//! each other; they only meet through the machine's state snapshot.

use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info};

use super::activity::{Activity, ActivityExt, BoxedActivity, noop};
use super::error::{RecorderResult, Result};
use super::recorder::Recorder;
use super::registry::ScriptRegistry;
use super::snapshot::{Reel, Snapshot};

/// A machine whose controllable state can be captured and restored
pub trait Machine {
    /// Snapshot of everything replay must reproduce
    type State: Snapshot;

    /// Independent copy of the current controllable state
    fn state(&self) -> Self::State;

    /// Overwrite the controllable state
    fn set_state(&mut self, state: Self::State);

    /// Push the controllable state to the outputs
    fn actuate(&mut self);

    /// Command all outputs to rest
    fn stop(&mut self) {}
}

/// Host lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Outputs at rest, nothing recorded or replayed
    Disabled,
    /// Replaying the selected script
    Autonomous,
    /// Operator control, optionally recorded
    Teleop,
}

/// Drives a machine, its activities and its recorder from a periodic tick
pub struct Host<M: Machine> {
    machine: Rc<RefCell<M>>,
    recorder: Recorder<M::State>,
    autonomous: BoxedActivity,
    teleop: BoxedActivity,
    phase: Phase,
    ticks: u64,
}

impl<M: Machine> Host<M> {
    /// Create a disabled host around `machine`
    pub fn new(machine: M) -> Self {
        Self {
            machine: Rc::new(RefCell::new(machine)),
            recorder: Recorder::new(),
            autonomous: noop().boxed(),
            teleop: noop().boxed(),
            phase: Phase::Disabled,
            ticks: 0,
        }
    }

    /// Shared handle to the machine, for activities that command it
    pub fn machine(&self) -> Rc<RefCell<M>> {
        Rc::clone(&self.machine)
    }

    /// Root activity stepped on every autonomous tick
    pub fn set_autonomous(&mut self, activity: BoxedActivity) {
        self.autonomous = activity;
    }

    /// Root activity stepped on every teleop tick
    pub fn set_teleop(&mut self, activity: BoxedActivity) {
        self.teleop = activity;
    }

    /// The recorder
    pub fn recorder(&self) -> &Recorder<M::State> {
        &self.recorder
    }

    /// Mutable access to the recorder, e.g. to start or stop recording
    pub fn recorder_mut(&mut self) -> &mut Recorder<M::State> {
        &mut self.recorder
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of periodic calls made so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Enter the disabled phase: stop playback and recording, rest the outputs
    pub fn disabled_init(&mut self) {
        self.recorder.stop_playback();
        self.recorder.stop_recording();
        self.machine.borrow_mut().stop();
        self.enter(Phase::Disabled);
    }

    /// Load `script` and replay it from its first snapshot
    pub fn autonomous_init(&mut self, script: &Reel<M::State>) -> RecorderResult<()> {
        self.recorder.set_script(script);
        self.recorder.reset_playback();
        self.recorder.start_playback()?;
        self.enter(Phase::Autonomous);
        Ok(())
    }

    /// Look up `name` in `registry` and replay it
    pub fn autonomous_init_named(&mut self, registry: &ScriptRegistry, name: &str) -> Result<()> {
        let script = registry.get_script(name)?;
        self.autonomous_init(&script)?;
        Ok(())
    }

    /// Enter operator control; any playback in progress stops
    pub fn teleop_init(&mut self) {
        self.recorder.stop_playback();
        self.machine.borrow_mut().stop();
        self.enter(Phase::Teleop);
    }

    /// One autonomous tick: replay a snapshot, step the root activity, actuate
    pub fn autonomous_periodic(&mut self) {
        if let Some(state) = self.recorder.playback() {
            self.machine.borrow_mut().set_state(state);
        }
        self.autonomous.step();
        self.machine.borrow_mut().actuate();
        self.ticks += 1;
    }

    /// One teleop tick: replay a snapshot if playback is active, otherwise
    /// step the root activity; then actuate and record the state
    pub fn teleop_periodic(&mut self) {
        match self.recorder.playback() {
            Some(state) => self.machine.borrow_mut().set_state(state),
            None => {
                self.teleop.step();
            }
        }
        self.machine.borrow_mut().actuate();
        let state = self.machine.borrow().state();
        self.recorder.record(&state);
        self.ticks += 1;
    }

    /// One disabled tick
    pub fn disabled_periodic(&mut self) {
        self.ticks += 1;
    }

    /// Run the periodic call for the current phase
    pub fn tick(&mut self) {
        match self.phase {
            Phase::Disabled => self.disabled_periodic(),
            Phase::Autonomous => self.autonomous_periodic(),
            Phase::Teleop => self.teleop_periodic(),
        }
    }

    /// Run `count` ticks in the current phase
    pub fn run(&mut self, count: u64) {
        for _ in 0..count {
            self.tick();
        }
    }

    /// Whether autonomous playback still has snapshots to emit
    pub fn is_replaying(&self) -> bool {
        self.phase == Phase::Autonomous && self.recorder.is_playing_back()
    }

    fn enter(&mut self, phase: Phase) {
        if self.phase != phase {
            info!(from = ?self.phase, to = ?phase, tick = self.ticks, "phase change");
        } else {
            debug!(phase = ?phase, "phase re-entered");
        }
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::activity::from_fn;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Counter {
        output: i64,
    }

    #[derive(Default)]
    struct CounterMachine {
        state: Counter,
        actuated: Vec<i64>,
    }

    impl Machine for CounterMachine {
        type State = Counter;

        fn state(&self) -> Counter {
            self.state.clone()
        }

        fn set_state(&mut self, state: Counter) {
            self.state = state;
        }

        fn actuate(&mut self) {
            self.actuated.push(self.state.output);
        }

        fn stop(&mut self) {
            self.state.output = 0;
        }
    }

    #[test]
    fn test_teleop_records_after_activity() {
        let mut host = Host::new(CounterMachine::default());
        let machine = host.machine();
        host.set_teleop(
            from_fn(move || {
                machine.borrow_mut().state.output += 1;
                false
            })
            .boxed(),
        );

        host.teleop_init();
        host.recorder_mut().start_recording().unwrap();
        host.run(3);

        let outputs: Vec<i64> = host.recorder().script().iter().map(|c| c.output).collect();
        assert_eq!(outputs, vec![1, 2, 3]);
        assert_eq!(host.machine().borrow().actuated, vec![1, 2, 3]);
        assert_eq!(host.ticks(), 3);
    }

    #[test]
    fn test_teleop_playback_overrides_operator() {
        let script: Reel<Counter> = [5, 6].into_iter().map(|output| Counter { output }).collect();
        let mut host = Host::new(CounterMachine::default());
        let machine = host.machine();
        host.set_teleop(
            from_fn(move || {
                machine.borrow_mut().state.output = 100;
                false
            })
            .boxed(),
        );

        host.teleop_init();
        host.recorder_mut().set_script(&script);
        host.recorder_mut().start_playback().unwrap();
        host.tick();
        assert_eq!(host.recorder().playback_position(), 1);
        host.tick();

        // reel exhausted: playback stops and the operator activity takes over
        host.tick();
        assert!(!host.recorder().is_playing_back());
        assert_eq!(host.machine().borrow().actuated, vec![5, 6, 100]);
        assert_eq!(host.phase(), Phase::Teleop);
    }

    #[test]
    fn test_autonomous_replays_then_stops() {
        let script: Reel<Counter> = [5, 6].into_iter().map(|output| Counter { output }).collect();
        let mut host = Host::new(CounterMachine::default());

        host.autonomous_init(&script).unwrap();
        assert!(host.is_replaying());
        host.run(3);

        assert_eq!(host.machine().borrow().actuated, vec![5, 6, 6]);
        assert!(!host.is_replaying());
        assert_eq!(host.phase(), Phase::Autonomous);
    }

    #[test]
    fn test_autonomous_init_stops_recording() {
        let mut host = Host::new(CounterMachine::default());
        host.teleop_init();
        host.recorder_mut().start_recording().unwrap();

        // set_script stops recording first, so autonomous can always start
        host.autonomous_init(&Reel::new()).unwrap();
        assert!(!host.recorder().is_recording());
    }

    #[test]
    fn test_autonomous_init_named() {
        use crate::runtime::error::{RuntimeError, ScriptError};
        use crate::runtime::registry::ScriptCatalog;

        let catalog = ScriptCatalog::new();
        catalog.register_text("seven", r#"[{"output":7}]"#);
        let registry = catalog.snapshot();
        let mut host = Host::new(CounterMachine::default());

        let err = host.autonomous_init_named(&registry, "missing").unwrap_err();
        assert!(matches!(err, RuntimeError::Script(ScriptError::NotFound(_))));
        assert_eq!(host.phase(), Phase::Disabled);

        host.autonomous_init_named(&registry, "seven").unwrap();
        host.tick();
        assert_eq!(host.machine().borrow().actuated, vec![7]);
    }

    #[test]
    fn test_disabled_stops_everything() {
        let script: Reel<Counter> = [1].into_iter().map(|output| Counter { output }).collect();
        let mut host = Host::new(CounterMachine::default());
        host.autonomous_init(&script).unwrap();
        host.tick();
        host.disabled_init();

        assert_eq!(host.phase(), Phase::Disabled);
        assert!(!host.recorder().is_playing_back());
        assert_eq!(host.machine().borrow().state.output, 0);

        host.tick();
        assert_eq!(host.machine().borrow().actuated, vec![1]);
    }

    #[test]
    fn test_teleop_init_interrupts_playback() {
        let script: Reel<Counter> = [1, 2, 3].into_iter().map(|output| Counter { output }).collect();
        let mut host = Host::new(CounterMachine::default());
        host.autonomous_init(&script).unwrap();
        host.tick();
        host.teleop_init();

        assert!(!host.recorder().is_playing_back());
        assert_eq!(host.recorder().playback_position(), 1);
    }
}
