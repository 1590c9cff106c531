use traffic_viewer_core::{ConfigRequest, SignalMode};
use traffic_viewer_rendering_macroquad::ControlPanelInputState;

fn run_reset_sequence(sequence: &[bool]) -> Vec<bool> {
    let mut state = ControlPanelInputState::default();
    let mut resets = Vec::new();
    for &pressed in sequence {
        resets.push(state.take_reset());
        if pressed {
            state.register_reset();
        }
    }

    // Flush any trailing latched press so the harness observes the final reset.
    resets.push(state.take_reset());
    resets
}

fn run_apply_sequence(sequence: &[Option<u32>]) -> Vec<Option<u32>> {
    let mut state = ControlPanelInputState::default();
    let mut applied = Vec::new();
    for cycle in sequence {
        applied.push(state.take_apply_config().map(|request| request.light_cycle));
        if let Some(cycle) = cycle {
            state.register_apply_config(ConfigRequest::new(SignalMode::Fixed, *cycle, 1.0));
        }
    }
    applied.push(state.take_apply_config().map(|request| request.light_cycle));
    applied
}

#[test]
fn reset_button_sequence_is_deterministic() {
    let button_sequence = [false, true, false, true, true, false];
    let expected = vec![false, false, true, false, true, true, false];

    let first_run = run_reset_sequence(&button_sequence);
    let second_run = run_reset_sequence(&button_sequence);

    assert_eq!(first_run, expected);
    assert_eq!(first_run, second_run);
}

#[test]
fn latest_apply_press_wins_within_a_frame() {
    let mut state = ControlPanelInputState::default();
    state.register_apply_config(ConfigRequest::new(SignalMode::Fixed, 5, 1.0));
    state.register_apply_config(ConfigRequest::new(SignalMode::Adaptive, 9, 1.0));

    let request = state.take_apply_config().expect("apply latched");
    assert_eq!(request.signal_mode, SignalMode::Adaptive);
    assert_eq!(request.light_cycle, 9);
    assert!(state.take_apply_config().is_none());
}

#[test]
fn apply_sequence_is_deterministic() {
    let sequence = [Some(12), None, Some(4), Some(6), None];
    let expected = vec![None, Some(12), None, Some(4), Some(6), None];

    assert_eq!(run_apply_sequence(&sequence), expected);
}

#[test]
fn baseline_latch_clears_after_take() {
    let mut state = ControlPanelInputState::default();
    assert!(!state.take_capture_baseline());
    state.register_capture_baseline();
    assert!(state.take_capture_baseline());
    assert!(!state.take_capture_baseline());
}
