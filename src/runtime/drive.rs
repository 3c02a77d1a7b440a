//! Simulated differential drive line
//!
//! A small machine used by the CLI and the tests. All motion commands only
//! write [`DriveLineState`]; [`DriveLine::actuate`] turns that state into
//! wheel outputs and integrates a simple odometry model. Because only the
//! state is recorded, replaying a reel drives the odometry through the same
//! sequence of outputs.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use super::activity::{Activity, from_fn};
use super::control::Machine;

/// Gear selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftMode {
    /// High gear
    #[default]
    High,
    /// Low gear
    Low,
}

/// How the two drive values are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriveMode {
    /// Left and right wheel speeds
    Tank,
    /// Forward magnitude and curve
    #[default]
    Arcade,
}

/// Controllable state of the drive line; this is what gets recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DriveLineState {
    /// Gear selection
    pub shift_mode: ShiftMode,
    /// Interpretation of the two drive values
    pub drive_mode: DriveMode,
    /// Arcade magnitude or tank left speed, in `[-1, 1]`
    pub magnitude_or_left: f64,
    /// Arcade curve or tank right speed, in `[-1, 1]`
    pub curve_or_right: f64,
    /// Square inputs for finer low-speed control
    pub squared_inputs: bool,
}

/// Full machine snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RobotState {
    /// Drive line state
    pub drive_line: DriveLineState,
}

/// Integrated position estimate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Odometry {
    /// Distance travelled by the left wheels, in meters
    pub left: f64,
    /// Distance travelled by the right wheels, in meters
    pub right: f64,
    /// Heading change in degrees, positive clockwise
    pub heading: f64,
}

impl Odometry {
    /// Average of both wheel distances
    pub fn distance(&self) -> f64 {
        (self.left + self.right) / 2.0
    }
}

/// Top speed at full output in high gear, meters per second
const HIGH_GEAR_SPEED: f64 = 3.0;
/// Top speed at full output in low gear, meters per second
const LOW_GEAR_SPEED: f64 = 1.5;
/// Distance between the wheel sets, meters
const TRACK_WIDTH: f64 = 0.6;

/// Simulated drive line
#[derive(Debug, Clone)]
pub struct DriveLine {
    state: DriveLineState,
    odometry: Odometry,
    outputs: (f64, f64),
    tick_seconds: f64,
}

impl DriveLine {
    /// Create a drive line advanced once every `tick_period_ms`
    pub fn new(tick_period_ms: u64) -> Self {
        Self {
            state: DriveLineState::default(),
            odometry: Odometry::default(),
            outputs: (0.0, 0.0),
            tick_seconds: tick_period_ms as f64 / 1000.0,
        }
    }

    /// Current controllable state
    pub fn state(&self) -> &DriveLineState {
        &self.state
    }

    /// Replace the controllable state
    pub fn set_state(&mut self, state: DriveLineState) {
        self.state = state;
    }

    /// Position estimate
    pub fn odometry(&self) -> Odometry {
        self.odometry
    }

    /// Wheel outputs applied by the last `actuate()`
    pub fn outputs(&self) -> (f64, f64) {
        self.outputs
    }

    /// Select high gear
    pub fn shift_high(&mut self) {
        self.state.shift_mode = ShiftMode::High;
    }

    /// Select low gear
    pub fn shift_low(&mut self) {
        self.state.shift_mode = ShiftMode::Low;
    }

    /// Command arcade drive
    pub fn arcade_drive(&mut self, magnitude: f64, curve: f64, squared_inputs: bool) {
        self.state.drive_mode = DriveMode::Arcade;
        self.state.magnitude_or_left = magnitude;
        self.state.curve_or_right = curve;
        self.state.squared_inputs = squared_inputs;
    }

    /// Command tank drive
    pub fn tank_drive(&mut self, left: f64, right: f64, squared_inputs: bool) {
        self.state.drive_mode = DriveMode::Tank;
        self.state.magnitude_or_left = left;
        self.state.curve_or_right = right;
        self.state.squared_inputs = squared_inputs;
    }

    /// Command zero output
    pub fn stop(&mut self) {
        self.tank_drive(0.0, 0.0, false);
    }

    /// Apply the commanded state for one tick
    pub fn actuate(&mut self) {
        let shape = |v: f64| {
            let v = v.clamp(-1.0, 1.0);
            if self.state.squared_inputs {
                v * v.abs()
            } else {
                v
            }
        };
        let a = shape(self.state.magnitude_or_left);
        let b = shape(self.state.curve_or_right);
        let (left, right) = match self.state.drive_mode {
            DriveMode::Tank => (a, b),
            DriveMode::Arcade => ((a + b).clamp(-1.0, 1.0), (a - b).clamp(-1.0, 1.0)),
        };
        self.outputs = (left, right);

        let top = match self.state.shift_mode {
            ShiftMode::High => HIGH_GEAR_SPEED,
            ShiftMode::Low => LOW_GEAR_SPEED,
        };
        let dl = left * top * self.tick_seconds;
        let dr = right * top * self.tick_seconds;
        self.odometry.left += dl;
        self.odometry.right += dr;
        self.odometry.heading += ((dl - dr) / TRACK_WIDTH).to_degrees();
    }
}

/// Simulated robot made of a single drive line
#[derive(Debug, Clone)]
pub struct SimRobot {
    /// The drive line subsystem
    pub drive_line: DriveLine,
}

impl SimRobot {
    /// Create a robot ticking every `tick_period_ms`
    pub fn new(tick_period_ms: u64) -> Self {
        Self {
            drive_line: DriveLine::new(tick_period_ms),
        }
    }
}

impl Machine for SimRobot {
    type State = RobotState;

    fn state(&self) -> RobotState {
        RobotState {
            drive_line: self.drive_line.state().clone(),
        }
    }

    fn set_state(&mut self, state: RobotState) {
        self.drive_line.set_state(state.drive_line);
    }

    fn actuate(&mut self) {
        self.drive_line.actuate();
    }

    fn stop(&mut self) {
        self.drive_line.stop();
    }
}

/// Drive `distance` meters from where the robot is when this is built.
///
/// Speed ramps down inside `trim_distance` of the target; the activity
/// completes once within `tolerance`.
pub fn drive_straight(
    robot: Rc<RefCell<SimRobot>>,
    distance: f64,
    max_speed: f64,
    tolerance: f64,
    trim_distance: f64,
) -> impl Activity {
    let (start_distance, start_heading) = {
        let odometry = robot.borrow().drive_line.odometry();
        (odometry.distance(), odometry.heading)
    };
    let slope = max_speed / trim_distance;

    from_fn(move || {
        let mut robot = robot.borrow_mut();
        let odometry = robot.drive_line.odometry();
        let error = distance - (odometry.distance() - start_distance);
        if error.abs() < tolerance {
            robot.drive_line.stop();
            return true;
        }
        let correction = (-(odometry.heading - start_heading) / 90.0).clamp(-1.0, 1.0);
        robot
            .drive_line
            .arcade_drive((error * slope).clamp(-max_speed, max_speed), correction, false);
        false
    })
}

/// Turn in place by `degrees` (positive clockwise) from the current heading
pub fn turn_by_angle(
    robot: Rc<RefCell<SimRobot>>,
    degrees: f64,
    max_speed: f64,
    tolerance: f64,
    trim_angle: f64,
) -> impl Activity {
    let start = robot.borrow().drive_line.odometry().heading;
    let slope = max_speed / trim_angle;

    from_fn(move || {
        let mut robot = robot.borrow_mut();
        let error = degrees - (robot.drive_line.odometry().heading - start);
        if error.abs() < tolerance {
            robot.drive_line.stop();
            return true;
        }
        let speed = (error * slope).clamp(-max_speed, max_speed);
        robot.drive_line.tank_drive(speed, -speed, false);
        false
    })
}
