//! End-to-end protocol tests for the live content feed decoder.
//!
//! Frames are built as raw JSON, the way they come off the socket, and pushed
//! through the public entry points.
//!
//! Modules under test:
//!   1. Notification batches          (src/protocol/notification.rs)
//!   2. Delta classification          (src/protocol/delta.rs)
//!   3. Snapshots                     (src/protocol/snapshot.rs)
//!   4. Odds and scores               (src/data/models.rs, src/data/live_data.rs)
//!   5. Feed-health counters          (src/stats.rs)

use rust_decimal_macros::dec;
use serde_json::{json, Value};

use live_content_feed::data::live_data::decode_live_data;
use live_content_feed::data::models::{sorted_scores, ActivePlayerServe, Outcome, Score};
use live_content_feed::protocol::delta::{classify, ChangeType};
use live_content_feed::protocol::path::extract_match_minutes;
use live_content_feed::protocol::{
    decode_content_container, decode_notification, ContentContainer, ContentIdentifier,
    ContentType, DecodeError, NotificationType,
};
use live_content_feed::stats::FeedStats;

// =============================================================================
// Helpers
// =============================================================================

fn event_content() -> Value {
    json!({"type": "event", "id": "100"})
}

fn market_json(id: &str, name: Option<&str>) -> Value {
    let mut market = json!({
        "idfomarket": id,
        "idfoevent": "100",
        "selections": [
            {"idfoselection": "9001", "name": "Home", "selectionhashcode": "h1",
             "currentpriceup": "5", "currentpricedown": "2", "hadvalue": "h"},
            {"idfoselection": "9002", "name": "Away", "selectionhashcode": "a1",
             "currentpriceup": "1", "currentpricedown": "3", "hadvalue": "a"},
        ]
    });
    if let Some(name) = name {
        market["name"] = json!(name);
    }
    market
}

fn delta(path: &str, change_type: &str, change: Value) -> Value {
    json!({
        "contentId": event_content(),
        "path": path,
        "changeType": change_type,
        "change": change,
    })
}

fn event_id() -> ContentIdentifier {
    ContentIdentifier::new(ContentType::EventDetails, "100")
}

// =============================================================================
// 1. Notification batches
// =============================================================================

#[test]
fn content_changes_keeps_valid_frames_in_order() {
    // [addMarket 55, addMarket without name (malformed), odd update 9001 -> 3/1]
    let frame = json!({
        "notificationType": "CONTENT_CHANGES",
        "data": [
            delta("events[idfoevent=100].markets[idfomarket=55]", "added", market_json("55", Some("Match Result"))),
            delta("events[idfoevent=100].markets[idfomarket=56]", "added", market_json("56", None)),
            delta(
                "events[idfoevent=100].markets[idfomarket=55].selections[idfoselection=9001]",
                "updated",
                json!({"idfoselection": "9001", "currentpriceup": "3", "currentpricedown": "1"}),
            ),
        ]
    });
    let bytes = serde_json::to_vec(&frame).unwrap();

    let NotificationType::ContentChanges { contents, dropped } = decode_notification(&bytes).unwrap() else {
        panic!("expected a content batch");
    };

    assert_eq!(contents.len(), 2, "Malformed market must be dropped");
    assert_eq!(dropped, 1);

    match &contents[0] {
        ContentContainer::AddMarket { market, .. } => {
            assert_eq!(market.id, "55");
            assert_eq!(market.event_id.as_deref(), Some("100"));
            assert_eq!(market.outcomes.len(), 2);
        }
        other => panic!("expected addMarket first, got {other}"),
    }
    match &contents[1] {
        ContentContainer::UpdateOutcomeOdd {
            selection_id,
            new_odd_numerator,
            new_odd_denominator,
            ..
        } => {
            assert_eq!(selection_id, "9001");
            assert_eq!(new_odd_numerator.as_deref(), Some("3"));
            assert_eq!(new_odd_denominator.as_deref(), Some("1"));
        }
        other => panic!("expected updateOutcomeOdd second, got {other}"),
    }
}

#[test]
fn unknown_content_type_drops_only_that_frame() {
    let frame = json!({
        "notificationType": "CONTENT_CHANGES",
        "data": [
            {"contentId": {"type": "horoscope", "id": "1"}, "change": []},
            {"contentId": {"type": "inplaySportList", "id": "all"}, "change": []},
        ]
    });
    let NotificationType::ContentChanges { contents, dropped } =
        NotificationType::from_value(&frame).unwrap()
    else {
        panic!("expected a content batch");
    };
    assert_eq!(dropped, 1);
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0].kind(), "liveSports");
}

#[test]
fn content_type_is_a_hard_boundary_for_single_frames() {
    let err = decode_content_container(&json!({"contentId": {"type": "horoscope", "id": "1"}})).unwrap_err();
    assert!(matches!(err, DecodeError::UnknownContentType(ref t) if t == "horoscope"));
}

// =============================================================================
// 2. Delta classification
// =============================================================================

#[test]
fn market_tradability_wins_over_presence_toggle() {
    // Matches both the market-tradability rule and the generic istradable rule.
    let out = classify(
        &ContentIdentifier::new(ContentType::Market, "77"),
        "markets[idfomarket=77].istradable",
        ChangeType::Updated,
        Some(&json!(true)),
    )
    .unwrap();
    assert_eq!(
        out,
        ContentContainer::UpdateMarketTradability {
            content_identifier: ContentIdentifier::new(ContentType::Market, "77"),
            market_id: "77".to_string(),
            is_tradable: true,
        },
        "Specific tradability rule must win over enableMarket"
    );
}

#[test]
fn classification_is_idempotent() {
    let frames = [
        delta("events[idfoevent=100].numMarkets", "updated", json!(14)),
        delta("events[idfoevent=100].liveDataSummary.matchTime", "updated", json!("67:12")),
        delta("events[idfoevent=100].markets[idfomarket=55]", "removed", Value::Null),
        delta("something.else", "updated", json!({"x": 1})),
    ];
    for frame in &frames {
        let first = decode_content_container(frame).unwrap();
        let second = decode_content_container(frame).unwrap();
        assert_eq!(first, second, "Same frame must classify the same way");
    }
}

#[test]
fn unrecognised_paths_are_unknown_for_any_change_type() {
    let payloads = [json!(null), json!(true), json!("text"), json!({"a": [1, 2]}), json!(17)];
    for path in ["", "foo.bar", "liveDataSummary", "participants[0].name", "attributes.COMPLETE"] {
        for change_type in ["added", "removed", "updated", "refreshed", ""] {
            for change in &payloads {
                let out = classify(&event_id(), path, ChangeType::parse(change_type), Some(change));
                assert_eq!(
                    out.unwrap(),
                    ContentContainer::Unknown,
                    "path {path:?} / {change_type:?} must be unknown"
                );
            }
        }
    }
}

#[test]
fn matched_rule_with_bad_payload_is_a_hard_error() {
    let err = decode_content_container(&delta(
        "events[idfoevent=100].numMarkets",
        "updated",
        json!("lots"),
    ))
    .unwrap_err();
    assert!(err.is_protocol_violation());
    assert_eq!(err.content_id(), Some("100"));
    assert_eq!(err.path(), Some("events[idfoevent=100].numMarkets"));
}

#[test]
fn decimal_ids_are_normalized() {
    let out = decode_content_container(&delta(
        "events[idfoevent=100.0].markets[idfomarket=2794662.1]",
        "removed",
        Value::Null,
    ))
    .unwrap();
    assert!(matches!(out, ContentContainer::RemoveMarket { ref market_id, .. } if market_id == "2794662.1"));

    let out = decode_content_container(&delta("events[idfoevent=123.0]", "removed", Value::Null)).unwrap();
    assert!(matches!(out, ContentContainer::RemoveEvent { ref event_id, .. } if event_id == "123"));
}

#[test]
fn removals_target_the_narrowest_item() {
    // Selection path: only the selection goes, its market stays.
    let out = decode_content_container(&delta(
        "events[idfoevent=100].markets[idfomarket=55].selections[idfoselection=9001]",
        "removed",
        Value::Null,
    ))
    .unwrap();
    assert!(
        matches!(out, ContentContainer::RemoveSelection { ref selection_id, .. } if selection_id == "9001"),
        "Selection removal must not drop the whole market"
    );

    // Market subscription: the subscription names the market, path or not.
    let frame = json!({"contentId": {"type": "market", "id": "55"}, "path": "", "changeType": "removed"});
    let out = decode_content_container(&frame).unwrap();
    assert!(matches!(out, ContentContainer::RemoveMarket { ref market_id, .. } if market_id == "55"));
}

#[test]
fn live_data_subscription_receives_updates() {
    let frame = json!({
        "contentId": {"type": "liveData", "id": "2001"},
        "path": "",
        "changeType": "updated",
        "change": {"attributes": {"COMPLETE": {
            "SERVE": {"EVENT": 2},
            "CURRENT_SCORE": {"COMPETITOR": {"home": 1, "away": 0}},
        }}}
    });
    let ContentContainer::UpdateEventLiveDataExtended { event_id, live_data, .. } =
        decode_content_container(&frame).unwrap()
    else {
        panic!("expected a live-data update");
    };
    assert_eq!(event_id, "2001");
    assert_eq!(live_data.active_player_serving, Some(ActivePlayerServe::Away));
    assert_eq!((live_data.home_score, live_data.away_score), (Some(1), Some(0)));

    let clock = json!({
        "contentId": {"type": "liveData", "id": "2001"},
        "path": "matchTime",
        "changeType": "updated",
        "change": "55:10"
    });
    let ContentContainer::UpdateEventLiveDataExtended { live_data, .. } =
        decode_content_container(&clock).unwrap()
    else {
        panic!("expected a clock-only live-data update");
    };
    assert_eq!(live_data.match_time.as_deref(), Some("55:10"));
}

#[test]
fn match_time_updates() {
    let path = "events[idfoevent=100].liveDataSummary.matchTime";
    let out = decode_content_container(&delta(path, "updated", json!("12:34"))).unwrap();
    assert!(matches!(out, ContentContainer::UpdateEventTime { ref new_time, .. } if new_time == "12'"));

    let out = decode_content_container(&delta(path, "updated", json!("Penalties"))).unwrap();
    assert!(out.is_unknown(), "No minutes found: soft skip");
}

#[test]
fn add_event_carries_markets_and_live_summary() {
    let change = json!({
        "idfoevent": 100,
        "participantname_home": "Lions",
        "participantname_away": "Tigers",
        "idfotournament": "501.0",
        "tournamentname": "Premier",
        "sporttypename": "Football",
        "tsstart": "2024-05-01T19:45:00.000+01:00",
        "markets": [market_json("55", Some("1X2\n"))],
        "liveDataSummary": {
            "matchTime": "45:00 +2:10",
            "status": "1st half",
            "scores": {"CURRENT_SCORE": {"home": 1, "away": 1}}
        }
    });
    let out = decode_content_container(&delta("events[idfoevent=100]", "added", change)).unwrap();
    let ContentContainer::AddEvent { event, .. } = out else {
        panic!("expected addEvent");
    };
    assert_eq!(event.id, "100");
    assert_eq!(event.competition_id.as_deref(), Some("501"));
    assert_eq!(event.markets[0].name, "1X2");
    assert_eq!(event.match_time.as_deref(), Some("45+2'"));
    assert_eq!((event.home_score, event.away_score), (Some(1), Some(1)));
    assert!(event.status.is_live());
    assert!(event.start_date.is_some());
}

// =============================================================================
// 3. Snapshots
// =============================================================================

#[test]
fn fail_soft_array_matches_single_element_decodes() {
    let good = [
        json!({"idfoevent": "1", "markets": []}),
        json!({"idfoevent": "2", "markets": [market_json("20", Some("Winner"))]}),
        json!({"idfoevent": "3", "markets": []}),
    ];
    let bad = json!({"idfoevent": "4", "tsstart": "not a date"});

    let mut batch: Vec<Value> = good.to_vec();
    batch.insert(1, bad);

    let frame = json!({"contentId": {"type": "liveDataSummaryAdvancedListBySportType", "id": "FBL"}, "change": batch});
    let ContentContainer::LiveEvents { events, .. } = decode_content_container(&frame).unwrap() else {
        panic!("expected live events");
    };
    assert_eq!(events.len(), good.len(), "N-1 elements survive");

    for (decoded, raw) in events.iter().zip(good.iter()) {
        let single = json!({"contentId": {"type": "event", "id": "x"}, "change": raw});
        let ContentContainer::EventDetails { event: Some(alone), .. } = decode_content_container(&single).unwrap() else {
            panic!("expected event details");
        };
        assert_eq!(decoded, &alone);
    }
}

#[test]
fn snapshots_keep_their_identifier() {
    let frames = [
        json!({"contentId": {"type": "eventListBySportTypeDate", "id": "FBL/2024-05-01"}}),
        json!({"contentId": {"type": "sportTypeByDate", "id": "2024-05-01"}, "change": [{"name": "Tennis", "alphaId": "TNS", "numberEvents": 4}]}),
        json!({"contentId": {"type": "eventGroup", "id": "g1"}}),
        json!({"contentId": {"type": "eventSummary", "id": "100"}}),
        json!({"contentId": {"type": "market", "id": "55"}, "change": market_json("55", Some("Winner"))}),
        json!({"contentId": {"type": "liveData", "id": "100"}}),
    ];
    for frame in &frames {
        let container = decode_content_container(frame).unwrap();
        assert!(container.is_snapshot());
        let expected = ContentIdentifier::from_frame(frame).unwrap();
        assert_eq!(container.content_identifier(), Some(&expected));
    }
}

// =============================================================================
// 4. Odds and scores
// =============================================================================

#[test]
fn fractional_odds_to_decimal() {
    let outcome: Outcome = serde_json::from_value(json!({
        "idfoselection": "1", "name": "Home", "selectionhashcode": "h",
        "currentpriceup": "5", "currentpricedown": "2"
    }))
    .unwrap();
    // 5/2 + 1 = 3.5
    assert_eq!(outcome.odd(), Some(dec!(3.5)));

    let evens: Outcome = serde_json::from_value(json!({
        "idfoselection": "2", "name": "Draw", "selectionhashcode": "d",
        "currentpriceup": "0", "currentpricedown": "1"
    }))
    .unwrap();
    // 0/1 + 1 = 1.0
    assert_eq!(evens.odd(), Some(dec!(1.0)));
}

#[test]
fn scores_sort_sets_then_game_then_match() {
    let raw = json!({"attributes": {"COMPLETE": {
        "MATCH_SCORE": {"COMPETITOR": {"home": 1, "away": 0}},
        "SET3_SCORE": {"COMPETITOR": {"home": 2, "away": 2}},
        "SET1_SCORE": {"COMPETITOR": {"home": 6, "away": 3}},
        "GAME_SCORE": {"COMPETITOR": {"home": 30, "away": 15}},
    }}});
    let data = decode_live_data(&raw, "100").unwrap();
    let order: Vec<String> = sorted_scores(&data.scores).iter().map(Score::key).collect();
    assert_eq!(order, ["set1", "set3", "gamePart", "matchFull"]);
}

#[test]
fn serving_player_accepts_int_and_string() {
    for (value, expected) in [
        (json!(1), Some(ActivePlayerServe::Home)),
        (json!("1"), Some(ActivePlayerServe::Home)),
        (json!(2), Some(ActivePlayerServe::Away)),
        (json!("2"), Some(ActivePlayerServe::Away)),
        (json!(0), None),
        (json!("x"), None),
    ] {
        assert_eq!(ActivePlayerServe::from_value(&value), expected, "serve {value}");
    }
}

#[test]
fn match_minutes_extraction() {
    assert_eq!(extract_match_minutes("12:34").as_deref(), Some("12'"));
    assert_eq!(extract_match_minutes("45:00 +3:20").as_deref(), Some("45+3'"));
    assert_eq!(extract_match_minutes("no clock"), None);
}

#[test]
fn live_data_needs_at_least_one_signal() {
    let empty = json!({"idfoevent": "100", "attributes": {"COMPLETE": {"IRRELEVANT": {}}}});
    assert!(matches!(
        decode_live_data(&empty, "100"),
        Err(DecodeError::EmptyLiveData { .. })
    ));

    let serve_only = json!({"attributes": {"COMPLETE": {"SERVE": {"EVENT": "1"}}}});
    let data = decode_live_data(&serve_only, "100").expect("Serving alone is enough");
    assert_eq!(data.active_player_serving, Some(ActivePlayerServe::Home));
    assert!(data.scores.is_empty());
}

// =============================================================================
// 5. Feed-health counters
// =============================================================================

#[test]
fn stats_follow_a_replayed_stream() {
    let stats = FeedStats::new();
    let frames: [&[u8]; 3] = [
        br#"{"notificationType":"LISTENING_STARTED","data":"abc"}"#,
        br#"{"notificationType":"CONTENT_CHANGES","data":[{"contentId":{"type":"event","id":"1"},"path":"events[idfoevent=1]","changeType":"removed"},{"nope":true}]}"#,
        b"not json",
    ];
    for frame in frames {
        match decode_notification(frame) {
            Ok(n) => stats.record(&n),
            Err(e) => stats.record_error(&e),
        }
    }
    let snap = stats.snapshot();
    assert_eq!(snap.frames, 3);
    assert_eq!(snap.containers, 1);
    assert_eq!(snap.dropped, 1);
    assert_eq!(snap.malformed, 1);
    assert_eq!(snap.by_kind.get("removeEvent"), Some(&1));
}
