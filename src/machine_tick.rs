use log::*;

const MAX_STATE_TRANSITIONS: u32 = 8;

/// Steps a role state machine until a state settles within the tick. Returns the transitions taken.
pub fn run_state_machine<S, F>(state: &mut S, label: &str, mut tick_fn: F) -> u32
where
    S: std::fmt::Debug,
    F: FnMut(&mut S) -> Option<S>,
{
    for transitions in 0..MAX_STATE_TRANSITIONS {
        match tick_fn(state) {
            Some(next) => {
                trace!("{}: {:?} -> {:?}", label, state, next);

                *state = next;
            }
            None => return transitions,
        }
    }

    warn!("{} did not settle after {} transitions, holding {:?}", label, MAX_STATE_TRANSITIONS, state);

    MAX_STATE_TRANSITIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settles_on_first_none() {
        let mut state = 0u32;

        let transitions = run_state_machine(&mut state, "count", |s| if *s < 3 { Some(*s + 1) } else { None });

        assert_eq!(state, 3);
        assert_eq!(transitions, 3);
    }

    #[test]
    fn oscillation_is_bounded() {
        let mut state = false;
        let mut steps = 0;

        let transitions = run_state_machine(&mut state, "flip", |s| {
            steps += 1;
            Some(!*s)
        });

        assert_eq!(steps, MAX_STATE_TRANSITIONS);
        assert_eq!(transitions, MAX_STATE_TRANSITIONS);
        assert!(!state);
    }
}
