//! End-to-end session flows: card → host → sensor → gate, driven tick by
//! tick through `AppService` with mock peripherals and the real host link.

use ecorvm::app::events::AppEvent;
use ecorvm::fsm::StateId;
use ecorvm::fsm::context::Outcome;
use ecorvm::messages;

use crate::mock_hw::{HwCall, Kiosk, TICK_MS};

fn screen(l1: &str, l2: &str) -> Option<(String, String)> {
    Some((l1.to_owned(), l2.to_owned()))
}

fn outcomes(k: &Kiosk) -> Vec<Outcome> {
    k.sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::SessionEnded(s) => Some(s.outcome),
            _ => None,
        })
        .collect()
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn boots_into_idle_with_gate_closed_and_welcome() {
    let k = Kiosk::new();
    assert_eq!(k.state(), StateId::Idle);
    assert_eq!(k.hw.calls[0], HwCall::GateClose);
    assert_eq!(
        k.hw.last_screen(),
        screen(messages::WELCOME_L1, messages::WELCOME_L2)
    );
    assert!(!k.app.timers_armed());
}

// ── Scenario 1: card → RFID line → READY → insert object ─────

#[test]
fn card_read_reports_identifier_and_ready_asks_for_object() {
    let mut k = Kiosk::new();
    k.hw.present_card("1234");
    k.tick_after(TICK_MS);

    assert_eq!(k.state(), StateId::Authenticating);
    assert_eq!(k.sent(), vec!["RFID:1234".to_owned()]);
    assert_eq!(k.hw.count(&HwCall::Beep), 1);

    k.host_says("READY");
    k.tick_after(TICK_MS);

    assert_eq!(k.state(), StateId::AwaitingObject);
    assert_eq!(
        k.hw.last_screen(),
        screen("User:1234", messages::INSERT_OBJECT_L2)
    );
}

#[test]
fn ready_never_skips_to_dispensing() {
    let mut k = Kiosk::new();
    k.authenticate("A1B2");
    k.run_for(500);
    assert_eq!(
        k.sink.transitions(),
        vec![
            (StateId::Idle, StateId::Authenticating),
            (StateId::Authenticating, StateId::AwaitingObject),
        ]
    );
    assert!(!k.hw.gate_is_open());
}

#[test]
fn user_ok_reply_greets_by_name() {
    let mut k = Kiosk::new();
    k.hw.present_card("1234");
    k.tick_after(TICK_MS);
    k.host_says("USER:OK:Maria");
    k.tick_after(TICK_MS);
    assert_eq!(k.state(), StateId::AwaitingObject);
    assert_eq!(
        k.hw.last_screen(),
        screen("User:Maria", messages::INSERT_OBJECT_L2)
    );
}

// ── Scenario 2: object → OBJ_DETECTED → ACCEPTED → gate cycle ─

#[test]
fn accepted_object_cycles_the_gate() {
    let mut k = Kiosk::new();
    k.authenticate("1234");

    k.hw.distance_cm = 10.0;
    k.tick_after(TICK_MS);
    assert_eq!(k.state(), StateId::Analyzing);
    assert_eq!(k.sent().last().map(String::as_str), Some("OBJ_DETECTED"));
    assert_eq!(
        k.hw.last_screen(),
        screen(messages::ANALYZING_L1, messages::PLEASE_WAIT_L2)
    );

    k.host_says("ACCEPTED");
    k.tick_after(TICK_MS);
    assert_eq!(k.state(), StateId::Dispensing);
    assert!(k.hw.gate_is_open());
    assert_eq!(k.hw.count(&HwCall::SuccessTone), 1);
    assert_eq!(
        k.hw.last_screen(),
        screen(messages::ACCEPTED_L1, "+10 points")
    );

    k.run_for(2_990);
    assert_eq!(k.state(), StateId::Dispensing);
    assert!(k.hw.gate_is_open());

    k.tick_after(TICK_MS);
    assert_eq!(k.state(), StateId::Idle);
    assert!(!k.hw.gate_is_open());
    assert_eq!(k.hw.count(&HwCall::GateOpen), 1);
    // Boot close + post-dispense close.
    assert_eq!(k.hw.count(&HwCall::GateClose), 2);
    assert_eq!(outcomes(&k), vec![Outcome::Completed]);
    assert!(!k.app.timers_armed());
}

#[test]
fn accepted_points_are_shown_and_counted() {
    let mut k = Kiosk::new();
    k.authenticate("1234");
    k.deposit();
    k.host_says("ACCEPTED:25");
    k.tick_after(TICK_MS);
    assert_eq!(k.hw.last_screen(), screen(messages::ACCEPTED_L1, "+25 points"));

    assert!(k.run_until(StateId::Idle, 5_000));
    let status = k.app.build_status();
    assert_eq!(status.accepted, 1);
    assert_eq!(status.points_awarded, 25);
}

#[test]
fn object_at_or_beyond_threshold_is_not_a_deposit() {
    let mut k = Kiosk::new();
    k.authenticate("1234");
    for d in [15.0, 40.0, 0.5, f32::NAN, f32::INFINITY] {
        k.hw.distance_cm = d;
        k.run_for(200);
        assert_eq!(k.state(), StateId::AwaitingObject, "distance {d}");
    }
    assert!(k.hw.proximity_polls > 0);
}

// ── Scenario 3: no host reply → timeout ──────────────────────

#[test]
fn authentication_times_out_without_gate_action() {
    let mut k = Kiosk::new();
    k.hw.present_card("1234");
    k.tick_after(TICK_MS);
    assert_eq!(k.state(), StateId::Authenticating);

    k.run_for(29_990);
    assert_eq!(k.state(), StateId::Authenticating);

    k.tick_after(TICK_MS);
    assert_eq!(k.state(), StateId::Idle);
    assert_eq!(k.hw.count(&HwCall::ErrorTone), 1);
    assert_eq!(k.hw.gate_actuations(), 1, "only the boot-time close");
    assert_eq!(
        k.hw.last_screen(),
        screen(messages::TIMEOUT_L1, messages::WELCOME_L2)
    );
    assert_eq!(outcomes(&k), vec![Outcome::Timeout]);

    k.run_for(3_000);
    assert_eq!(
        k.hw.last_screen(),
        screen(messages::WELCOME_L1, messages::WELCOME_L2)
    );
}

#[test]
fn every_waiting_phase_times_out_to_idle_with_gate_closed() {
    // AwaitingObject
    let mut k = Kiosk::new();
    k.authenticate("1234");
    k.run_for(30_000);
    assert_eq!(k.state(), StateId::Idle);
    assert!(!k.hw.gate_is_open());

    // Analyzing
    let mut k = Kiosk::new();
    k.authenticate("1234");
    k.deposit();
    k.run_for(30_000);
    assert_eq!(k.state(), StateId::Idle);
    assert!(!k.hw.gate_is_open());
    assert!(!k.app.timers_armed());
    assert_eq!(k.app.stats().timeouts, 1);
}

#[test]
fn timer_wins_over_a_reply_arriving_on_the_deadline_tick() {
    let mut k = Kiosk::new();
    k.hw.present_card("1234");
    k.tick_after(TICK_MS);
    let before = k.sink.transitions().len();

    k.host_says("READY");
    k.tick_after(30_000);

    assert_eq!(k.state(), StateId::Idle);
    let transitions = k.sink.transitions();
    assert_eq!(transitions.len(), before + 1, "one transition per tick");
    assert_eq!(
        transitions.last(),
        Some(&(StateId::Authenticating, StateId::Idle))
    );

    // The stale READY was consumed, not replayed into the next session.
    k.run_for(200);
    assert_eq!(k.state(), StateId::Idle);
}

// ── Scenario 4: REJECTED in Analyzing ────────────────────────

#[test]
fn rejected_object_keeps_gate_closed_and_returns_to_idle() {
    let mut k = Kiosk::new();
    k.authenticate("1234");
    k.deposit();
    k.host_says("REJECTED");
    k.tick_after(TICK_MS);

    assert_eq!(k.state(), StateId::Rejected);
    assert_eq!(
        k.hw.last_screen(),
        screen(messages::REJECTED_L1, messages::TRY_AGAIN_L2)
    );
    assert_eq!(k.hw.count(&HwCall::ErrorTone), 1);

    k.run_for(3_000);
    assert_eq!(k.state(), StateId::Idle);
    assert_eq!(k.hw.count(&HwCall::GateOpen), 0);
    assert!(!k.hw.gate_is_open());
    assert_eq!(outcomes(&k), vec![Outcome::ObjectRejected]);
}

#[test]
fn unknown_user_sees_not_registered() {
    for reply in ["USER:NEW", "USER:ERROR"] {
        let mut k = Kiosk::new();
        k.hw.present_card("9999");
        k.tick_after(TICK_MS);
        k.host_says(reply);
        k.tick_after(TICK_MS);
        assert_eq!(k.state(), StateId::Rejected, "{reply}");
        assert_eq!(
            k.hw.last_screen(),
            screen(messages::USER_NOT_FOUND_L1, messages::TRY_AGAIN_L2)
        );
        assert!(k.run_until(StateId::Idle, 5_000));
        assert_eq!(outcomes(&k), vec![Outcome::UserNotFound]);
    }
}

// ── Link faults ──────────────────────────────────────────────

#[test]
fn malformed_reply_is_dropped_without_transition() {
    let mut k = Kiosk::new();
    k.hw.present_card("1234");
    k.tick_after(TICK_MS);

    for junk in ["BANANA", "ACCEPTED:lots", "ready"] {
        k.host_says(junk);
        k.tick_after(TICK_MS);
        assert_eq!(k.state(), StateId::Authenticating, "{junk}");
    }
    assert_eq!(k.app.stats().link_faults, 3);
    assert!(
        k.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::LinkFault(_)))
    );

    k.host_says("READY");
    k.tick_after(TICK_MS);
    assert_eq!(k.state(), StateId::AwaitingObject);
}

#[test]
fn send_failure_is_left_to_the_timeout() {
    let mut k = Kiosk::new();
    k.host.transport_mut().set_fail_writes(true);
    k.hw.present_card("1234");
    k.tick_after(TICK_MS);

    assert_eq!(k.state(), StateId::Authenticating);
    assert!(
        k.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::HostSendFailed(_)))
    );
    k.run_for(30_000);
    assert_eq!(k.state(), StateId::Idle);
}

#[test]
fn reply_split_across_reads_is_reassembled() {
    let mut k = Kiosk::new();
    k.hw.present_card("1234");
    k.tick_after(TICK_MS);

    k.host.transport_mut().inject(b"REA");
    k.tick_after(TICK_MS);
    assert_eq!(k.state(), StateId::Authenticating);
    k.host.transport_mut().inject(b"DY\r\n");
    k.tick_after(TICK_MS);
    assert_eq!(k.state(), StateId::AwaitingObject);
}

// ── Sessions back to back ────────────────────────────────────

#[test]
fn second_session_starts_clean() {
    let mut k = Kiosk::new();
    k.authenticate("AAAA");
    k.deposit();
    k.host_says("ACCEPTED");
    assert!(k.run_until(StateId::Idle, 5_000));
    assert!(k.app.session().user_id.is_empty());

    k.authenticate("BBBB");
    assert_eq!(k.app.session().user_id.as_str(), "BBBB");
    assert_eq!(k.app.session().points, 0);
    assert_eq!(
        k.sent(),
        vec![
            "RFID:AAAA".to_owned(),
            "OBJ_DETECTED".to_owned(),
            "RFID:BBBB".to_owned(),
        ]
    );
    assert_eq!(k.app.stats().sessions, 2);
}
