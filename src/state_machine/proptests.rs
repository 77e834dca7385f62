//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_in_flight() -> impl Strategy<Value = Option<InFlight>> {
    prop_oneof![
        Just(None),
        Just(Some(InFlight::CorpusLoad)),
        (1u64..50).prop_map(|request| Some(InFlight::Reply { request })),
    ]
}

fn arb_state() -> impl Strategy<Value = ChatState> {
    prop_oneof![
        arb_in_flight().prop_map(|in_flight| ChatState::Closed { in_flight }),
        Just(ChatState::OpenLoading),
        Just(ChatState::OpenReady),
        (1u64..50).prop_map(|request| ChatState::OpenAwaitingReply { request }),
    ]
}

fn arb_context() -> impl Strategy<Value = ChatContext> {
    (any::<bool>(), any::<bool>(), 1u64..50).prop_map(
        |(corpus_loaded, has_conversation, next_request)| ChatContext {
            corpus_loaded,
            has_conversation,
            next_request,
        },
    )
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[ \t\n]{1,5}",
        "[ ]{0,3}[a-zA-Z?]{1,20}[ ]{0,3}",
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Open),
        Just(Event::Close),
        Just(Event::Reset),
        Just(Event::CorpusLoaded),
        "[a-z ]{1,20}".prop_map(|message| Event::CorpusFailed { message }),
        arb_text().prop_map(|text| Event::Submit { text }),
        (1u64..50, "[a-z ]{1,20}").prop_map(|(request, text)| Event::ReplyReceived {
            request,
            text
        }),
        (1u64..50, "[a-z ]{1,20}").prop_map(|(request, message)| Event::ReplyFailed {
            request,
            message
        }),
    ]
}

fn appends_turn(effects: &[Effect]) -> bool {
    effects
        .iter()
        .any(|e| matches!(e, Effect::AppendTurn { .. }))
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: Closing hides the widget but keeps background work
    #[test]
    fn prop_close_preserves_in_flight(state in arb_state(), ctx in arb_context()) {
        let result = transition(&state, &ctx, Event::Close).unwrap();
        prop_assert!(!result.new_state.is_open());
        prop_assert_eq!(result.new_state.in_flight(), state.in_flight());
        prop_assert!(result.effects.is_empty());
    }

    // Invariant 2: Reopening resumes the work that was running
    #[test]
    fn prop_reopen_resumes_in_flight(in_flight in arb_in_flight(), ctx in arb_context()) {
        prop_assume!(in_flight.is_some());
        let state = ChatState::Closed { in_flight };
        let result = transition(&state, &ctx, Event::Open).unwrap();
        prop_assert!(result.new_state.is_open());
        prop_assert_eq!(result.new_state.in_flight(), in_flight);
        prop_assert!(!result.effects.contains(&Effect::LoadCorpus));
    }

    // Invariant 3: Submissions are accepted only when ready with a corpus
    #[test]
    fn prop_submit_accepted_only_when_ready(
        state in arb_state(),
        ctx in arb_context(),
        text in arb_text()
    ) {
        let result = transition(&state, &ctx, Event::Submit { text: text.clone() });
        let acceptable = state == ChatState::OpenReady
            && ctx.corpus_loaded
            && !text.trim().is_empty();

        match result {
            Ok(result) => {
                prop_assert!(acceptable, "accepted {:?} in {:?}", text, state);
                prop_assert_eq!(
                    result.new_state,
                    ChatState::OpenAwaitingReply { request: ctx.next_request }
                );
                prop_assert_eq!(
                    result.effects,
                    vec![
                        Effect::append_user(text.trim()),
                        Effect::RequestCompletion { request: ctx.next_request },
                    ]
                );
            }
            Err(_) => prop_assert!(!acceptable, "rejected {:?} in {:?}", text, state),
        }
    }

    // Invariant 4: Whitespace-only input never reaches the transcript
    #[test]
    fn prop_blank_submit_rejected(state in arb_state(), ctx in arb_context(), text in "[ \t\n]{0,8}") {
        let result = transition(&state, &ctx, Event::Submit { text });
        prop_assert_eq!(result.unwrap_err(), TransitionError::EmptyMessage);
    }

    // Invariant 5: Reset never leaves a reply awaited
    #[test]
    fn prop_reset_abandons_reply(state in arb_state(), ctx in arb_context()) {
        let result = transition(&state, &ctx, Event::Reset).unwrap();
        prop_assert_eq!(result.new_state.awaited_request(), None);
        prop_assert_eq!(result.new_state.is_open(), state.is_open());
        prop_assert_eq!(result.new_state.is_loading(), state.is_loading());
        prop_assert_eq!(result.effects, vec![Effect::ClearHistory, Effect::ShowGreeting]);
    }

    // Invariant 6: A reply for any request other than the awaited one is refused
    #[test]
    fn prop_mismatched_reply_never_appends(
        state in arb_state(),
        ctx in arb_context(),
        request in 1u64..50
    ) {
        prop_assume!(state.awaited_request() != Some(request));
        let event = Event::ReplyReceived { request, text: "late".to_string() };
        let result = transition(&state, &ctx, event);
        prop_assert_eq!(result.unwrap_err(), TransitionError::StaleReply { request });
    }

    // Invariant 7: The corpus is requested only when absent and not already loading
    #[test]
    fn prop_load_corpus_only_once(state in arb_state(), ctx in arb_context(), event in arb_event()) {
        if let Ok(result) = transition(&state, &ctx, event) {
            if result.effects.contains(&Effect::LoadCorpus) {
                prop_assert!(!ctx.corpus_loaded);
                prop_assert!(!state.is_loading());
                prop_assert!(result.new_state.is_loading());
            }
        }
    }

    // Invariant 8: Random event sequences keep the in-flight bookkeeping consistent
    #[test]
    fn prop_sequences_stay_consistent(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ChatState::default();
        let mut ctx = ChatContext { next_request: 1, ..ChatContext::default() };

        for event in events {
            let Ok(result) = transition(&state, &ctx, event) else {
                continue;
            };

            for effect in &result.effects {
                match effect {
                    Effect::RequestCompletion { request } => {
                        prop_assert_eq!(*request, ctx.next_request);
                        prop_assert_eq!(result.new_state.awaited_request(), Some(*request));
                        ctx.next_request += 1;
                    }
                    Effect::AppendTurn { .. } | Effect::ShowNotice { .. } | Effect::ShowGreeting => {
                        ctx.has_conversation = true;
                    }
                    Effect::ClearHistory => ctx.has_conversation = false,
                    _ => {}
                }
            }
            if state.is_loading() && !result.new_state.is_loading() {
                prop_assert!(!appends_turn(&result.effects));
                // A failed load reports a notice; a successful one caches the corpus
                if !result.effects.iter().any(|e| matches!(e, Effect::ShowNotice { .. })) {
                    ctx.corpus_loaded = true;
                }
            }
            prop_assert!(!(result.new_state.is_loading() && ctx.corpus_loaded));
            state = result.new_state;
        }
    }
}
