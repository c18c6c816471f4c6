use super::{
    ControlAxis, ControlOutput, FlightController, PidTerm, ProgramId, StickInputs, TransitionRejected, TrimState,
    controls::HeldAttitude,
    horizon_history::HorizonHistory,
    program::{CycleInputs, LevelFlight, SurfaceCheck},
};
use crate::config::{ControllerConfig, PidGains};
use crate::horizon::AttitudeSample;

const FPS: u32 = 30;
const EPS: f64 = 1e-9;

fn good(roll: f64, pitch: f64) -> AttitudeSample { AttitudeSample::fitted(roll, pitch, 0.2, 1.3) }

fn controller() -> FlightController { FlightController::new(ControllerConfig::default(), FPS) }

fn assert_output(actual: ControlOutput, aileron: f64, elevator: f64) {
    assert!(
        (actual.aileron - aileron).abs() < EPS && (actual.elevator - elevator).abs() < EPS,
        "got {actual:?}, expected ({aileron}, {elevator})"
    );
}

#[test]
fn test_manual_passes_sticks_through() {
    let mut controller = controller();
    let report = controller.run(&good(0.0, 0.0), StickInputs::new(0.3, -0.2, 0.0));
    assert_eq!(report.program, ProgramId::Manual);
    assert_output(report.output, 0.3, -0.2);
    assert_eq!(report.trims, TrimState::default());

    // manual flight is never interrupted and never finishes
    let report = controller.run(&AttitudeSample::NO_HORIZON, StickInputs::new(0.9, -0.9, 0.0));
    assert_output(report.output, 0.4, -0.4);
    assert_eq!(controller.active_program(), ProgramId::Manual);
}

#[test]
fn test_servo_reversal() {
    let config = ControllerConfig { servos_reversed: true, ..ControllerConfig::default() };
    let mut controller = FlightController::new(config, FPS);
    let report = controller.run(&good(0.0, 0.0), StickInputs::new(0.3, -0.2, 0.0));
    assert_output(report.output, -0.3, 0.2);
}

#[test]
fn test_surface_check_runs_to_completion() {
    let config = ControllerConfig::default();
    let total = SurfaceCheck::new(&config, FPS).total_iterations();
    let mut controller = controller();
    controller.select_program(ProgramId::SurfaceCheck).unwrap();

    let mut max_aileron: f64 = 0.0;
    let mut max_elevator: f64 = 0.0;
    for iteration in 1..=total {
        assert_eq!(controller.active_program(), ProgramId::SurfaceCheck, "iteration {iteration}");
        let report = controller.run(&AttitudeSample::NO_HORIZON, StickInputs::CENTRED);
        assert_eq!(report.program, ProgramId::SurfaceCheck);
        assert!(report.output.aileron.abs() <= config.max_deflection + EPS);
        assert!(report.output.elevator.abs() <= config.max_deflection + EPS);
        assert!(report.output.aileron.abs() < EPS || report.output.elevator.abs() < EPS);
        max_aileron = max_aileron.max(report.output.aileron.abs());
        max_elevator = max_elevator.max(report.output.elevator.abs());
        if iteration == total {
            assert_output(report.output, 0.0, 0.0);
        }
    }
    assert!((max_aileron - config.max_deflection).abs() < EPS);
    assert!((max_elevator - config.max_deflection).abs() < EPS);
    assert_eq!(controller.active_program(), ProgramId::Manual);
}

#[test]
fn test_level_flight_returns_to_neutral_without_horizon() {
    let mut controller = controller();
    controller.select_program(ProgramId::LevelFlight).unwrap();
    for _ in 0..3 {
        let report = controller.run(&good(20.0, 5.0), StickInputs::CENTRED);
        assert_output(report.output, -0.3, -0.1875);
    }

    // coast on the last command while the history still holds a good horizon
    for _ in 0..7 {
        let report = controller.run(&AttitudeSample::NO_HORIZON, StickInputs::CENTRED);
        assert_output(report.output, -0.3, -0.1875);
        assert!(!controller.held_attitude().is_good);
        assert!((controller.held_attitude().roll_deg - 20.0).abs() < EPS);
    }
    for _ in 0..5 {
        let report = controller.run(&AttitudeSample::NO_HORIZON, StickInputs::CENTRED);
        assert_output(report.output, 0.0, 0.0);
        assert_eq!(controller.held_attitude(), HeldAttitude::default());
    }
    assert_eq!(controller.active_program(), ProgramId::LevelFlight);
}

#[test]
fn test_level_flight_uses_signed_roll() {
    let mut controller = controller();
    controller.select_program(ProgramId::LevelFlight).unwrap();
    let report = controller.run(&good(350.0, 0.0), StickInputs::CENTRED);
    assert!((controller.held_attitude().roll_deg + 10.0).abs() < EPS);
    assert_output(report.output, 0.15, 0.0);
}

#[test]
fn test_stick_input_interrupts_autopilot() {
    let mut controller = controller();
    controller.select_program(ProgramId::LevelFlight).unwrap();
    controller.run(&good(0.0, 0.0), StickInputs::CENTRED);

    let report = controller.run(&good(0.0, 0.0), StickInputs::new(0.3, 0.0, 0.0));
    assert_eq!(report.program, ProgramId::LevelFlight);
    assert_eq!(controller.active_program(), ProgramId::Manual);

    let report = controller.run(&good(0.0, 0.0), StickInputs::new(0.3, 0.0, 0.0));
    assert_eq!(report.program, ProgramId::Manual);
    assert_output(report.output, 0.3, 0.0);
}

#[test]
fn test_rudder_does_not_interrupt() {
    let mut controller = controller();
    controller.select_program(ProgramId::QuickWiggle).unwrap();
    controller.run(&good(0.0, 0.0), StickInputs::new(0.0, 0.0, 1.0));
    assert_eq!(controller.active_program(), ProgramId::QuickWiggle);
}

#[test]
fn test_quick_wiggle_returns_to_manual() {
    let mut controller = controller();
    controller.select_program(ProgramId::QuickWiggle).unwrap();
    for _ in 0..15 {
        let report = controller.run(&AttitudeSample::NO_HORIZON, StickInputs::CENTRED);
        assert_eq!(report.program, ProgramId::QuickWiggle);
        assert_output(report.output, 0.1, 0.1);
    }
    assert_eq!(controller.active_program(), ProgramId::Manual);
}

#[test]
fn test_transition_requests() {
    let mut controller = controller();
    controller.select_program(ProgramId::SurfaceCheck).unwrap();
    let first = controller.run(&AttitudeSample::NO_HORIZON, StickInputs::CENTRED).output;
    controller.run(&AttitudeSample::NO_HORIZON, StickInputs::CENTRED);

    assert_eq!(
        controller.select_program(ProgramId::LevelFlight),
        Err(TransitionRejected { from: ProgramId::SurfaceCheck, to: ProgramId::LevelFlight })
    );
    assert_eq!(controller.active_program(), ProgramId::SurfaceCheck);

    // reselecting starts over with fresh state
    controller.select_program(ProgramId::SurfaceCheck).unwrap();
    assert_eq!(controller.run(&AttitudeSample::NO_HORIZON, StickInputs::CENTRED).output, first);

    controller.select_program(ProgramId::QuickWiggle).unwrap();
    assert!(controller.select_program(ProgramId::SurfaceCheck).is_err());
    controller.select_program(ProgramId::Manual).unwrap();
    controller.select_program(ProgramId::LevelFlight).unwrap();
    assert_eq!(controller.active_program(), ProgramId::LevelFlight);
}

#[test]
fn test_trim_acquisition() {
    let mut controller = controller();
    controller.select_program(ProgramId::LevelFlight).unwrap();
    let sticks = StickInputs::new(0.1, -0.05, 0.0);
    for _ in 0..29 {
        controller.run(&good(0.0, 0.0), sticks);
        assert_eq!(controller.trims(), TrimState::default());
    }
    let report = controller.run(&good(0.0, 0.0), sticks);
    assert!((report.trims.aileron_trim - 0.1).abs() < EPS);
    assert!((report.trims.elevator_trim + 0.05).abs() < EPS);
    // easy mode targets 6 deg roll and -1 deg pitch, trim is added on top
    assert_output(report.output, 0.015 * 6.0 + 0.1, 0.0375 * -1.0 - 0.05);

    // later samples no longer change the trim
    controller.run(&good(0.0, 0.0), StickInputs::new(0.2, 0.0, 0.0));
    assert!((controller.trims().aileron_trim - 0.1).abs() < EPS);
}

#[test]
fn test_trim_is_added_after_pid_limit() {
    let config = ControllerConfig {
        aileron_pid: PidGains::proportional(0.015, 0.1),
        trim_secs: 0.0,
        ..ControllerConfig::default()
    };
    let mut program = LevelFlight::new(&config, FPS);
    let mut history = HorizonHistory::new(8);
    history.push(true);
    let mut trims = TrimState::new(0.05, 0.0);
    let inputs = CycleInputs {
        attitude: HeldAttitude { roll_deg: -50.0, pitch_deg: 0.0, is_good: true },
        sticks: StickInputs::CENTRED,
        history: &history,
    };
    let step = program.step(&inputs, &mut trims);
    assert!((step.output.aileron - 0.15).abs() < EPS);
    assert!(!step.is_finished);
}

#[test]
fn test_gain_adjustment_reaches_autopilot() {
    let mut controller = controller();
    assert!(controller.active_gains(ControlAxis::Aileron).is_none());
    controller.adjust_gain(ControlAxis::Aileron, PidTerm::P, 0.005);
    controller.select_program(ProgramId::LevelFlight).unwrap();
    assert!((controller.active_gains(ControlAxis::Aileron).unwrap().kp - 0.02).abs() < EPS);

    let gains = controller.adjust_gain(ControlAxis::Elevator, PidTerm::I, 0.01);
    assert!((gains.ki - 0.01).abs() < EPS);
    assert_eq!(controller.active_gains(ControlAxis::Elevator), Some(gains));
    assert_eq!(controller.config().elevator_pid, gains);
}
