use crate::ServerState;
use crate::ServerState::*;

/// **VALUE**: Pins the only legal paths through the lifecycle.
///
/// **BUG THIS CATCHES**: Would catch a transition table edit that lets a stopped
/// backend be "restarted" within the same run.
#[test]
fn given_lifecycle_table_when_checking_transitions_then_only_forward_steps_allowed() {
    let allowed = [
        (NotStarted, Starting),
        (NotStarted, Stopped),
        (Starting, Running),
        (Starting, Stopped),
        (Running, Stopped),
        (Stopped, Stopped),
    ];
    let all = [NotStarted, Starting, Running, Stopped];

    for from in all {
        for to in all {
            let expected = allowed.contains(&(from, to));
            assert_eq!(
                from.can_transition_to(to),
                expected,
                "{from:?} -> {to:?} should be allowed={expected}"
            );
        }
    }
}

#[test]
fn given_default_state_when_created_then_not_started() {
    assert_eq!(ServerState::default(), NotStarted);
    assert!(!NotStarted.is_terminal());
    assert!(Stopped.is_terminal());
}

#[test]
fn given_state_when_displayed_then_lowercase_words() {
    assert_eq!(NotStarted.to_string(), "not started");
    assert_eq!(Running.to_string(), "running");
}
