use std::{rc::Rc, sync::Arc};

use quiz_buzzer_client::{
    config::ClientConfig,
    dto::{
        events::{InboundEvent, OutboundEvent},
        snapshot::VisibleGamePhase,
    },
    error::{ActionOutcome, IgnoreReason, TransportError},
    services::{self, dispatch::handle_inbound, host_service, player_service},
    state::{
        SharedClient,
        game::{Participant, ParticipantId, Quiz, QuizKind, Verdict},
        session::{Session, SharedRoster},
    },
    transport::LocalChannel,
};
use uuid::Uuid;

/// Minimal room relay: turns every client's emissions into the events the server would
/// broadcast and delivers them to everyone.
struct Room {
    catalog: Vec<Quiz>,
    members: Vec<(ParticipantId, Rc<LocalChannel>, SharedClient)>,
    round: u64,
}

impl Room {
    fn new(catalog: Vec<Quiz>) -> Self {
        let participants = vec![
            Participant::host("h", "Host"),
            Participant::player("a", "Ann"),
            Participant::player("b", "Bea"),
            Participant::player("c", "Cid"),
        ];
        let roster = Arc::new(SharedRoster::from_participants(participants.clone()));
        let config = Arc::new(ClientConfig::default());

        let members = participants
            .into_iter()
            .map(|participant| {
                let channel = Rc::new(LocalChannel::new());
                let client = services::connect(
                    Session::new(participant.clone()),
                    roster.clone(),
                    channel.clone(),
                    catalog.clone(),
                    config.clone(),
                );
                (participant.id, channel, client)
            })
            .collect();

        Self {
            catalog,
            members,
            round: 0,
        }
    }

    fn client(&self, id: &str) -> &SharedClient {
        &self.member(id).2
    }

    fn channel(&self, id: &str) -> &Rc<LocalChannel> {
        &self.member(id).1
    }

    fn member(&self, id: &str) -> &(ParticipantId, Rc<LocalChannel>, SharedClient) {
        self.members
            .iter()
            .find(|(member, _, _)| member.as_str() == id)
            .expect("unknown member")
    }

    fn clients(&self) -> impl Iterator<Item = &SharedClient> {
        self.members.iter().map(|(_, _, client)| client)
    }

    fn broadcast(&self, event: &InboundEvent) {
        for (_, channel, _) in &self.members {
            channel.deliver(event);
        }
    }

    /// Relay pending emissions until the room is quiet. Returns how many were relayed.
    fn flush(&mut self) -> usize {
        let mut relayed = 0;
        loop {
            let pending: Vec<OutboundEvent> = self
                .members
                .iter()
                .flat_map(|(_, channel, _)| channel.take_emitted())
                .collect();
            if pending.is_empty() {
                return relayed;
            }
            for event in pending {
                relayed += 1;
                let inbound = self.to_inbound(event);
                self.broadcast(&inbound);
            }
        }
    }

    fn to_inbound(&mut self, event: OutboundEvent) -> InboundEvent {
        match event {
            OutboundEvent::RequestBuzz {
                participant_id,
                round,
            } => InboundEvent::Buzz {
                participant_id,
                round: Some(round),
            },
            OutboundEvent::SubmitAnswer {
                participant_id,
                text,
                round,
            } => InboundEvent::AnswerSubmitted {
                participant_id,
                text,
                round: Some(round),
            },
            OutboundEvent::RequestStartQuiz { quiz_id }
            | OutboundEvent::RequestNextQuiz { quiz_id } => {
                self.round += 1;
                let quiz = self
                    .catalog
                    .iter()
                    .find(|quiz| quiz.id == quiz_id)
                    .cloned()
                    .expect("quiz from catalog");
                InboundEvent::QuizStarted {
                    quiz,
                    round: Some(self.round),
                }
            }
            OutboundEvent::ApplyJudgment {
                participant_id,
                correct,
                points_delta,
                round,
            } => InboundEvent::JudgmentApplied {
                participant_id,
                correct,
                points_delta,
                round: Some(round),
            },
            OutboundEvent::RequestRevealAnswer { round } => {
                InboundEvent::RevealAnswer { round: Some(round) }
            }
            OutboundEvent::EndQuiz { finished, round } => InboundEvent::QuizEnded {
                finished,
                round: Some(round),
            },
            OutboundEvent::StartFreeMode { quiz, round } => {
                self.round = round;
                InboundEvent::FreeModeStarted {
                    quiz,
                    round: Some(round),
                }
            }
            OutboundEvent::ResetFreeModeRound { round } => {
                self.round = round;
                InboundEvent::FreeModeReset { round: Some(round) }
            }
        }
    }
}

fn quiz(prompt: &str, answer: &str) -> Quiz {
    Quiz {
        id: Uuid::new_v4(),
        prompt: prompt.into(),
        answer: answer.into(),
        kind: QuizKind::Text,
        image_url: None,
        points: None,
    }
}

fn score(client: &SharedClient, id: &str) -> Option<u64> {
    client.read_room(|room| room.ledger().score(&id.into()))
}

fn queue(client: &SharedClient) -> Vec<String> {
    client
        .snapshot()
        .queue
        .into_iter()
        .map(|entry| entry.participant_id.to_string())
        .collect()
}

fn submissions(channel: &LocalChannel) -> Vec<OutboundEvent> {
    channel
        .emitted()
        .into_iter()
        .filter(|event| matches!(event, OutboundEvent::SubmitAnswer { .. }))
        .collect()
}

fn started_room() -> Room {
    let tokyo = quiz("Capital of Japan?", "Tokyo");
    let mut room = Room::new(vec![tokyo.clone()]);
    assert_eq!(
        host_service::start_quiz(room.client("h"), tokyo.id),
        ActionOutcome::Applied
    );
    room.flush();
    room
}

#[test]
fn buzz_order_is_preserved_and_head_answers() {
    let mut room = started_room();
    for id in ["c", "a", "b"] {
        player_service::request_buzz(room.client(id));
        room.flush();
    }

    for client in room.clients() {
        assert_eq!(queue(client), ["c", "a", "b"]);
        assert_eq!(client.snapshot().active_responder, Some("c".into()));
    }
}

#[test]
fn full_round_scores_clears_and_reveals() {
    let mut room = started_room();
    for id in ["b", "a", "c"] {
        player_service::request_buzz(room.client(id));
        room.flush();
    }
    assert_eq!(
        room.client("a").snapshot().active_responder,
        Some("b".into())
    );

    assert_eq!(
        player_service::submit_answer(room.client("b"), "Tokyo"),
        ActionOutcome::Applied
    );
    room.flush();
    let host_view = room.client("h").snapshot();
    assert_eq!(host_view.phase, VisibleGamePhase::Submitted);
    assert_eq!(
        host_view.current_answer.map(|answer| answer.text),
        Some("Tokyo".to_string())
    );

    assert_eq!(
        host_service::judge(room.client("h"), &"b".into(), Verdict::Correct),
        ActionOutcome::Applied
    );
    let host_view = room.client("h").snapshot();
    assert!(host_view.queue.is_empty());
    assert!(!host_view.has_answered);
    assert!(host_view.current_answer.is_none());

    room.flush();
    for client in room.clients() {
        let snapshot = client.snapshot();
        assert_eq!(score(client, "b"), Some(10));
        assert_eq!(snapshot.phase, VisibleGamePhase::Judged);
        assert_eq!(
            snapshot.quiz.and_then(|quiz| quiz.answer),
            Some("Tokyo".to_string())
        );
        assert_eq!(
            snapshot.judgments[0].answer_text.as_deref(),
            Some("Tokyo")
        );
    }
}

#[test]
fn double_submit_in_same_tick_emits_once() {
    let mut room = started_room();
    player_service::request_buzz(room.client("a"));
    room.flush();

    let a = room.client("a");
    assert_eq!(
        player_service::submit_answer(a, "Paris"),
        ActionOutcome::Applied
    );
    assert!(matches!(
        player_service::submit_answer(a, "Paris"),
        ActionOutcome::Ignored(IgnoreReason::DuplicateEvent(_))
    ));
    assert_eq!(
        submissions(room.channel("a")),
        vec![OutboundEvent::SubmitAnswer {
            participant_id: "a".into(),
            text: "Paris".into(),
            round: 1,
        }]
    );

    room.flush();
    assert!(matches!(
        player_service::submit_answer(room.client("a"), "Paris"),
        ActionOutcome::Ignored(_)
    ));
    assert!(submissions(room.channel("a")).is_empty());
}

#[test]
fn replayed_judgment_scores_once() {
    let room = started_room();
    let judgment = InboundEvent::JudgmentApplied {
        participant_id: "a".into(),
        correct: true,
        points_delta: 10,
        round: Some(1),
    };
    room.broadcast(&judgment);
    room.broadcast(&judgment);

    for client in room.clients() {
        assert_eq!(score(client, "a"), Some(10));
    }
}

#[test]
fn round_reset_clears_round_fields_together() {
    let paris = quiz("Capital of France?", "Paris");
    let tokyo = quiz("Capital of Japan?", "Tokyo");
    let mut room = Room::new(vec![tokyo.clone(), paris]);
    host_service::start_quiz(room.client("h"), tokyo.id);
    room.flush();
    player_service::request_buzz(room.client("a"));
    room.flush();
    player_service::submit_answer(room.client("a"), "Kyoto");
    room.flush();
    host_service::judge(room.client("h"), &"a".into(), Verdict::Incorrect);
    room.flush();

    host_service::next_quiz(room.client("h"));
    room.flush();
    for client in room.clients() {
        let snapshot = client.snapshot();
        assert_eq!(snapshot.phase, VisibleGamePhase::AwaitingBuzz);
        assert_eq!(snapshot.round, 2);
        assert!(snapshot.queue.is_empty());
        assert!(snapshot.active_responder.is_none());
        assert!(!snapshot.has_answered);
        assert!(snapshot.current_answer.is_none());
        assert!(snapshot.judgments.is_empty());
        assert_eq!(
            snapshot.quiz.map(|quiz| quiz.prompt),
            Some("Capital of France?".to_string())
        );
    }
    let player_quiz = room.client("c").snapshot().quiz.expect("quiz");
    assert!(player_quiz.answer.is_none());
}

#[test]
fn scores_are_the_sum_of_distinct_judgments() {
    let room = started_room();
    let judgment = |id: &str, points_delta, round| InboundEvent::JudgmentApplied {
        participant_id: id.into(),
        correct: points_delta > 0,
        points_delta,
        round: Some(round),
    };

    room.broadcast(&judgment("a", 10, 1));
    room.broadcast(&judgment("b", 0, 1));
    room.broadcast(&InboundEvent::QuizStarted {
        quiz: quiz("Largest ocean?", "Pacific"),
        round: Some(2),
    });
    room.broadcast(&judgment("a", 7, 2));
    // Late arrival from round 1 and a replay from round 2.
    room.broadcast(&judgment("c", 5, 1));
    room.broadcast(&judgment("a", 7, 2));

    for client in room.clients() {
        assert_eq!(score(client, "a"), Some(17));
        assert_eq!(score(client, "b"), Some(0));
        assert_eq!(score(client, "c"), Some(5));
    }
}

#[test]
fn free_mode_initializes_scores_and_reset_keeps_them() {
    let mut room = Room::new(Vec::new());
    assert_eq!(
        host_service::start_free_mode(room.client("h")),
        ActionOutcome::Applied
    );
    room.flush();

    for client in room.clients() {
        let snapshot = client.snapshot();
        assert!(snapshot.free_mode);
        assert_eq!(snapshot.quiz.map(|quiz| quiz.kind), Some(QuizKind::Free));
        for id in ["a", "b", "c"] {
            assert_eq!(score(client, id), Some(0));
        }
        assert_eq!(score(client, "h"), Some(0));
    }
    let quiz_ids: Vec<_> = room
        .clients()
        .map(|client| client.snapshot().quiz.map(|quiz| quiz.id))
        .collect();
    assert!(quiz_ids.windows(2).all(|pair| pair[0] == pair[1]));

    player_service::request_buzz(room.client("a"));
    room.flush();
    player_service::submit_answer(room.client("a"), "anything");
    room.flush();
    host_service::judge(room.client("h"), &"a".into(), Verdict::Correct);
    room.flush();
    player_service::request_buzz(room.client("b"));

    assert_eq!(
        host_service::reset_free_mode_round(room.client("h")),
        ActionOutcome::Applied
    );
    room.flush();
    for client in room.clients() {
        let snapshot = client.snapshot();
        assert_eq!(snapshot.phase, VisibleGamePhase::AwaitingBuzz);
        assert!(snapshot.queue.is_empty());
        assert!(!snapshot.has_answered);
        assert_eq!(score(client, "a"), Some(10));
        assert_eq!(snapshot.round, 2);
    }
}

#[test]
fn exhausted_rotation_finishes_with_scores_intact() {
    let first = quiz("Capital of Peru?", "Lima");
    let second = quiz("Capital of Chile?", "Santiago");
    let mut room = Room::new(vec![first, second]);

    for (player, answer) in [("a", "Lima"), ("b", "Santiago")] {
        assert_eq!(
            host_service::next_quiz(room.client("h")),
            ActionOutcome::Applied
        );
        room.flush();
        player_service::request_buzz(room.client(player));
        room.flush();
        player_service::submit_answer(room.client(player), answer);
        room.flush();
        host_service::judge(room.client("h"), &player.into(), Verdict::Correct);
        room.flush();
    }

    assert_eq!(
        host_service::next_quiz(room.client("h")),
        ActionOutcome::Applied
    );
    assert_eq!(
        room.channel("h").emitted(),
        vec![OutboundEvent::EndQuiz {
            finished: true,
            round: 2,
        }]
    );
    assert_eq!(
        room.client("h").snapshot().phase,
        VisibleGamePhase::Finished
    );

    room.flush();
    for client in room.clients() {
        assert_eq!(client.snapshot().phase, VisibleGamePhase::Finished);
        assert_eq!(score(client, "a"), Some(10));
        assert_eq!(score(client, "b"), Some(10));
    }
}

#[test]
fn unknown_participants_never_enter_the_queue() {
    let room = started_room();
    room.broadcast(&InboundEvent::Buzz {
        participant_id: "zed".into(),
        round: None,
    });
    room.broadcast(&InboundEvent::AnswerSubmitted {
        participant_id: "zed".into(),
        text: "Tokyo".into(),
        round: None,
    });

    for client in room.clients() {
        let snapshot = client.snapshot();
        assert!(snapshot.queue.is_empty());
        assert!(!snapshot.has_answered);
    }
}

#[test]
fn hosts_never_enter_the_queue() {
    let room = started_room();
    room.broadcast(&InboundEvent::Buzz {
        participant_id: "h".into(),
        round: None,
    });
    assert!(matches!(
        player_service::request_buzz(room.client("h")),
        ActionOutcome::Ignored(IgnoreReason::InvalidTransition(_))
    ));

    for client in room.clients() {
        assert!(client.snapshot().queue.is_empty());
    }
    assert!(room.channel("h").emitted().is_empty());
}

#[test]
fn events_from_earlier_rounds_are_discarded() {
    let room = started_room();
    room.broadcast(&InboundEvent::QuizStarted {
        quiz: quiz("Capital of Italy?", "Rome"),
        round: Some(3),
    });

    let player = room.client("a");
    assert_eq!(
        handle_inbound(player, &InboundEvent::RevealAnswer { round: Some(2) }),
        Err(IgnoreReason::StaleRound {
            event_round: 2,
            current_round: 3
        })
    );
    room.broadcast(&InboundEvent::Buzz {
        participant_id: "b".into(),
        round: Some(1),
    });

    for client in room.clients() {
        let snapshot = client.snapshot();
        assert_eq!(snapshot.phase, VisibleGamePhase::AwaitingBuzz);
        assert!(snapshot.queue.is_empty());
    }
}

#[test]
fn late_quiz_end_never_closes_the_next_round() {
    let first = quiz("Capital of Kenya?", "Nairobi");
    let second = quiz("Capital of Ghana?", "Accra");
    let mut room = Room::new(vec![first.clone(), second.clone()]);

    host_service::start_quiz(room.client("h"), first.id);
    room.flush();
    assert_eq!(
        host_service::end_quiz(room.client("h")),
        ActionOutcome::Applied
    );
    room.flush();
    host_service::start_quiz(room.client("h"), second.id);
    room.flush();
    player_service::request_buzz(room.client("b"));
    room.flush();

    let late_end = InboundEvent::QuizEnded {
        finished: false,
        round: Some(1),
    };
    assert_eq!(
        handle_inbound(room.client("a"), &late_end),
        Err(IgnoreReason::StaleRound {
            event_round: 1,
            current_round: 2,
        })
    );
    room.broadcast(&late_end);

    for client in room.clients() {
        let snapshot = client.snapshot();
        assert_eq!(snapshot.phase, VisibleGamePhase::Responding);
        assert_eq!(snapshot.round, 2);
        assert_eq!(snapshot.quiz.map(|quiz| quiz.id), Some(second.id));
        assert_eq!(queue(client), ["b"]);
    }
}

#[test]
fn replayed_free_mode_reset_is_a_noop() {
    let mut room = Room::new(Vec::new());
    host_service::start_free_mode(room.client("h"));
    room.flush();
    host_service::reset_free_mode_round(room.client("h"));
    room.flush();

    player_service::request_buzz(room.client("a"));
    room.flush();
    let before = room.client("c").snapshot();

    let replay = InboundEvent::FreeModeReset { round: Some(2) };
    assert!(matches!(
        handle_inbound(room.client("c"), &replay),
        Err(IgnoreReason::DuplicateEvent(_))
    ));
    room.broadcast(&replay);
    assert_eq!(room.client("c").snapshot(), before);
    assert_eq!(queue(room.client("c")), ["a"]);
}

#[test]
fn failed_judgment_emission_still_clears_round() {
    let mut room = started_room();
    player_service::request_buzz(room.client("a"));
    room.flush();
    player_service::submit_answer(room.client("a"), "Osaka");
    room.flush();

    let host = room.client("h");
    room.channel("h").set_failing(true);
    assert_eq!(
        host_service::judge(host, &"a".into(), Verdict::Incorrect),
        ActionOutcome::EmitFailed
    );

    let snapshot = host.snapshot();
    assert!(snapshot.queue.is_empty());
    assert!(!snapshot.has_answered);
    assert_eq!(snapshot.phase, VisibleGamePhase::AwaitingBuzz);
    assert_eq!(host.active_notices().len(), 1);
    assert!(room.channel("h").emitted().is_empty());

    room.channel("h").set_failing(false);
    assert_eq!(room.flush(), 0);
    assert_eq!(
        room.client("a").snapshot().phase,
        VisibleGamePhase::Submitted
    );
}

#[test]
fn raw_frames_drive_the_core() {
    let room = Room::new(Vec::new());
    let channel = room.channel("b");
    let frame = serde_json::json!({
        "type": "quiz-started",
        "quiz": {
            "id": "1b4e28ba-2fa1-11d2-883f-0016d3cca427",
            "prompt": "Capital of Japan?",
            "answer": "Tokyo",
            "kind": "text"
        },
        "round": 1
    });
    assert_eq!(channel.deliver_json(&frame.to_string()).unwrap(), 1);
    channel
        .deliver_json(r#"{"type":"buzz","participant_id":"a","round":1}"#)
        .unwrap();

    assert!(matches!(
        channel.deliver_json(r#"{"type":"self-destruct"}"#),
        Err(TransportError::Decode(_))
    ));
    assert!(channel.deliver_json("{not json").is_err());

    let snapshot = room.client("b").snapshot();
    assert_eq!(snapshot.phase, VisibleGamePhase::Responding);
    assert_eq!(snapshot.active_responder, Some("a".into()));
}
