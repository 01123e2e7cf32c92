//! End-to-end scenarios through the registry and session API.

use std::time::Duration;
use textsync_edit_core::SharedText;
use textsync_edit_server::{
    event_channel, CloseReason, Config, EditServerEvent, EventReceiver, Registration,
    SessionRegistry,
};
use textsync_edit_types::{
    CompositionSegment, CompositionUpdate, FieldEndpointId, Range, Request, Response, RevisionId,
    Selection, TextEditServerError, TextFieldError, TextFieldOptions, TextFieldState,
};

fn setup() -> (SessionRegistry, EventReceiver) {
    let (tx, rx) = event_channel();
    (SessionRegistry::new(Config::default(), tx), rx)
}

async fn register(
    registry: &SessionRegistry,
    endpoint: FieldEndpointId,
    content: &SharedText,
) -> Registration {
    registry
        .register(endpoint, Box::new(content.clone()), TextFieldOptions::default())
        .await
        .unwrap()
}

fn range(start: usize, end: usize) -> Range {
    Range::new(start, end).unwrap()
}

#[tokio::test]
async fn replace_word_then_stale_begin_fails() {
    let (registry, _rx) = setup();
    let content = SharedText::new("hello");
    let reg = register(&registry, FieldEndpointId::new(), &content).await;
    let session = &reg.session;

    let tx = session.begin_transaction(RevisionId::zero()).await.unwrap();
    session.set_text(tx, range(0, 5), "HELLO").await.unwrap();
    let state = session.commit_transaction(tx).await.unwrap();

    assert_eq!(state.revision_id, RevisionId::new(1));
    assert_eq!(state.contents_range, range(0, 5));
    assert_eq!(state.selection, Selection::caret(5));
    assert_eq!(content.contents().unwrap(), "HELLO");

    let err = session
        .begin_transaction(RevisionId::zero())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TextFieldError::StaleRevision {
            presented: RevisionId::zero(),
            current: RevisionId::new(1),
        }
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn cancelled_composition_restores_content() {
    let (registry, _rx) = setup();
    let content = SharedText::new("ab");
    let reg = register(&registry, FieldEndpointId::new(), &content).await;
    let session = &reg.session;
    let start = session.state().await.unwrap();

    session.begin_composition(start.revision_id).await.unwrap();

    let tx = session.begin_transaction(start.revision_id).await.unwrap();
    session.set_text(tx, Range::caret(1), "k").await.unwrap();
    let after_first = session
        .commit_in_composition(
            tx,
            CompositionUpdate {
                segments: vec![CompositionSegment {
                    range: range(1, 2),
                    raw_input_text: "k".into(),
                }],
                highlighted_segment: Some(0),
            },
        )
        .await
        .unwrap();
    assert_eq!(content.contents().unwrap(), "akb");

    let tx = session
        .begin_transaction(after_first.revision_id)
        .await
        .unwrap();
    session.set_text(tx, range(1, 2), "か").await.unwrap();
    let after_second = session
        .commit_in_composition(
            tx,
            CompositionUpdate {
                segments: vec![CompositionSegment {
                    range: range(1, 2),
                    raw_input_text: "ka".into(),
                }],
                highlighted_segment: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(content.contents().unwrap(), "aかb");
    assert!(after_second.composition.is_some());

    let end = session.cancel_composition().await.unwrap();
    assert_eq!(content.contents().unwrap(), "ab");
    assert_eq!(end.selection, start.selection);
    assert!(end.composition.is_none());
    assert!(end.revision_id.value() >= start.revision_id.value() + 2);
}

#[tokio::test]
async fn eviction_mid_transaction_invalidates_old_ids() {
    let (registry, mut rx) = setup();
    let endpoint = FieldEndpointId::new();
    let content = SharedText::new("draft");
    let mut reg = register(&registry, endpoint, &content).await;

    let old_tx = reg
        .session
        .begin_transaction(RevisionId::zero())
        .await
        .unwrap();
    reg.session
        .set_text(old_tx, range(0, 5), "final")
        .await
        .unwrap();

    assert_eq!(registry.evict(reg.handle()).await, Ok(true));
    assert_eq!(reg.closed.closed().await, CloseReason::Evicted);
    assert_eq!(content.contents().unwrap(), "draft");

    let mut saw_closed = false;
    while let Ok(event) = rx.try_recv() {
        if let EditServerEvent::SessionClosed { handle, reason } = event {
            assert_eq!(handle, reg.handle());
            assert_eq!(reason, CloseReason::Evicted);
            saw_closed = true;
        }
    }
    assert!(saw_closed);

    let fresh = register(&registry, endpoint, &content).await;
    assert_ne!(fresh.handle(), reg.handle());
    assert_eq!(
        fresh.session.state().await.unwrap().revision_id,
        RevisionId::zero()
    );
    assert_eq!(
        fresh.session.commit_transaction(old_tx).await,
        Err(TextFieldError::BadTransaction)
    );
}

#[tokio::test]
async fn duplicate_registration_rejected() {
    let (registry, _rx) = setup();
    let endpoint = FieldEndpointId::new();
    let content = SharedText::new("");
    let _reg = register(&registry, endpoint, &content).await;

    let err = registry
        .register(endpoint, Box::new(content.clone()), TextFieldOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err, TextEditServerError::AlreadyRegistered);
}

#[tokio::test]
async fn idle_eviction_spares_focused_fields() {
    let (registry, _rx) = setup();
    let focused = register(&registry, FieldEndpointId::new(), &SharedText::new("a")).await;
    let unfocused = register(&registry, FieldEndpointId::new(), &SharedText::new("b")).await;
    focused.session.notify_focus_gained().await.unwrap();

    assert_eq!(registry.evict_idle(Duration::ZERO).await, 1);
    assert!(!focused.closed.is_closed());
    assert_eq!(unfocused.closed.reason(), Some(CloseReason::Evicted));
}

#[tokio::test]
async fn out_of_band_change_keeps_transaction_alive() {
    let (registry, _rx) = setup();
    let content = SharedText::new("abc");
    let reg = register(&registry, FieldEndpointId::new(), &content).await;
    let session = &reg.session;

    let tx = session.begin_transaction(RevisionId::zero()).await.unwrap();
    session
        .notify_state_changed(TextFieldState {
            revision_id: RevisionId::new(7),
            contents_range: range(0, 3),
            selection: Selection::caret(3),
            composition: None,
        })
        .await
        .unwrap();
    assert_eq!(
        session.state().await.unwrap().revision_id,
        RevisionId::new(7)
    );

    session.set_text(tx, Range::caret(3), "d").await.unwrap();
    let state = session.commit_transaction(tx).await.unwrap();
    assert_eq!(state.revision_id, RevisionId::new(8));
    assert_eq!(content.contents().unwrap(), "abcd");

    let err = session
        .notify_state_changed(TextFieldState {
            revision_id: RevisionId::new(8),
            contents_range: range(0, 4),
            selection: Selection::caret(0),
            composition: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TextEditServerError::StaleRevision { .. }));
}

#[tokio::test]
async fn msgpack_frames_drive_a_session() {
    let (registry, _rx) = setup();
    let content = SharedText::new("wire");
    let reg = register(&registry, FieldEndpointId::new(), &content).await;

    async fn call(reg: &Registration, request: Request) -> Response {
        let bytes = request.to_bytes().unwrap();
        let reply = reg.session.handle_frame(&bytes).await.unwrap();
        Response::from_bytes(&reply).unwrap()
    }

    let Response::TransactionBegun { transaction_id } = call(
        &reg,
        Request::BeginTransaction {
            revision_id: RevisionId::zero(),
        },
    )
    .await
    else {
        panic!("expected TransactionBegun");
    };
    assert_eq!(
        call(
            &reg,
            Request::SetText {
                transaction_id,
                old_range: Range::caret(4),
                new_text: "d".into(),
            },
        )
        .await,
        Response::Ack
    );
    let Response::State { state } =
        call(&reg, Request::CommitTransaction { transaction_id }).await
    else {
        panic!("expected State");
    };
    assert_eq!(state.revision_id, RevisionId::new(1));
    assert_eq!(content.contents().unwrap(), "wired");
}

#[tokio::test]
async fn unregister_then_calls_report_closed() {
    let (registry, _rx) = setup();
    let reg = register(&registry, FieldEndpointId::new(), &SharedText::new("x")).await;
    registry.unregister(reg.handle()).await.unwrap();

    assert_eq!(reg.session.state().await, Err(TextFieldError::Closed));
    assert_eq!(reg.closed.reason(), Some(CloseReason::Unregistered));
}
