mod common;

use common::*;
use parley_engine::{EngineError, UploadRequest, DEFAULT_UPLOAD_QUERY};
use parley_persist::{NewUser, UserStore};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn upload(file_name: &str, body: &[u8], query: Option<&str>) -> UploadRequest {
    UploadRequest {
        thread_id: "thread_1".into(),
        owner_id: "u1".into(),
        file_name: file_name.into(),
        bytes: body.to_vec(),
        query: query.map(str::to_string),
    }
}

#[tokio::test(start_paused = true)]
async fn relevant_upload_is_relayed_with_query() {
    let h = harness(FakeAssistant::completing_after(1, "Your budget looks fine."));
    owned_thread(&h.store, "thread_1", "u1").await;

    let reply = h
        .engine
        .upload(upload("budget.txt", b"Q3 spend: 1200", Some("Is this ok?")))
        .await
        .unwrap();

    assert_eq!(reply.content, "Your budget looks fine.");
    assert_eq!(
        h.assistant.submitted_texts(),
        vec!["File uploaded: budget.txt\nContent:\nQ3 spend: 1200\n\nUser query: Is this ok?"]
    );
    assert_eq!(h.engine.uploads().in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_query_uses_default_prompt() {
    let h = harness(FakeAssistant::completing_after(0, "ok"));
    owned_thread(&h.store, "thread_1", "u1").await;

    h.engine
        .upload(upload("notes.txt", b"numbers", Some("   ")))
        .await
        .unwrap();

    let sent = h.assistant.submitted_texts();
    assert!(sent[0].ends_with(&format!("User query: {}", DEFAULT_UPLOAD_QUERY)));
}

#[tokio::test(start_paused = true)]
async fn irrelevant_upload_sends_explanation_only() {
    let h = harness_with(
        FakeAssistant::completing_after(0, "That file is off topic."),
        HarnessOptions {
            relevant_uploads: false,
            ..Default::default()
        },
    );
    owned_thread(&h.store, "thread_1", "u1").await;

    h.engine
        .upload(upload("pie.txt", b"flour, butter", None))
        .await
        .unwrap();

    assert_eq!(
        h.assistant.submitted_texts(),
        vec!["File uploaded: pie.txt\nNot related to healthcare/finance/marketing/Acme: no, it is a recipe"]
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_upload_from_same_owner_is_refused() {
    let h = Arc::new(harness(FakeAssistant::completing_after(6, "done")));
    owned_thread(&h.store, "thread_1", "u1").await;

    let first = {
        let h = Arc::clone(&h);
        tokio::spawn(async move { h.engine.upload(upload("a.txt", b"first", None)).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.engine.uploads().is_busy("u1"));

    let second = h.engine.upload(upload("b.txt", b"second", None)).await;
    assert!(matches!(second, Err(EngineError::UploadBusy)));

    assert!(first.await.unwrap().is_ok());
    assert_eq!(h.engine.uploads().in_flight(), 0);
    assert_eq!(h.assistant.submitted_texts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn busy_flag_cleared_on_every_failure() {
    let h = harness(FakeAssistant::never_finishing());
    owned_thread(&h.store, "thread_1", "u1").await;

    let err = h.engine.upload(upload("deck.pptx", b"x", None)).await.unwrap_err();
    assert!(matches!(err, EngineError::UnsupportedFile(_)));
    assert_eq!(h.engine.uploads().in_flight(), 0);

    let err = h.engine.upload(upload("blank.txt", b"   ", None)).await.unwrap_err();
    assert!(matches!(err, EngineError::EmptyUpload));
    assert_eq!(h.engine.uploads().in_flight(), 0);

    h.assistant.fail_submit.store(true, Ordering::SeqCst);
    let err = h.engine.upload(upload("a.txt", b"text", None)).await.unwrap_err();
    assert!(matches!(err, EngineError::Provider(_)));
    assert_eq!(h.engine.uploads().in_flight(), 0);

    h.assistant.fail_submit.store(false, Ordering::SeqCst);
    let err = h.engine.upload(upload("a.txt", b"text", None)).await.unwrap_err();
    assert!(matches!(err, EngineError::TimedOut));
    assert_eq!(h.engine.uploads().in_flight(), 0);
}

#[tokio::test]
async fn upload_into_foreign_thread_is_rejected_before_locking() {
    let h = harness(FakeAssistant::never_finishing());
    owned_thread(&h.store, "thread_1", "someone_else").await;

    let err = h.engine.upload(upload("a.txt", b"text", None)).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidThread));
    assert_eq!(h.engine.uploads().in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn consultation_sends_two_emails_then_relays() {
    let h = harness(FakeAssistant::completing_after(0, "We'll be in touch."));
    let mut new_user = NewUser::new("ada@example.com", "hash");
    new_user.name = Some("Ada".into());
    let user = h.store.create_user(new_user).await.unwrap();
    owned_thread(&h.store, "thread_1", &user.id).await;

    let reply = h
        .engine
        .request_consultation("thread_1", &user.id, "Compliance review")
        .await
        .unwrap();

    assert_eq!(reply.content, "We'll be in touch.");
    let sent = h.mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "ops@example.com");
    assert_eq!(sent[1].to, "ada@example.com");
    assert_eq!(
        h.assistant.submitted_texts(),
        vec!["Consultation request submitted!\n\nName: Ada\nEmail: ada@example.com\nDescription: Compliance review\n\nTeam notified, email sent."]
    );
}

#[tokio::test]
async fn consultation_mail_failure_stops_before_assistant() {
    let h = harness(FakeAssistant::never_finishing());
    let user = h
        .store
        .create_user(NewUser::new("ada@example.com", "hash"))
        .await
        .unwrap();
    owned_thread(&h.store, "thread_1", &user.id).await;
    h.mailer.fail.store(true, Ordering::SeqCst);

    let err = h
        .engine
        .request_consultation("thread_1", &user.id, "help")
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Mail(_)));
    assert!(h.assistant.submitted_texts().is_empty());
}

#[tokio::test]
async fn consultation_needs_a_known_user() {
    let h = harness(FakeAssistant::never_finishing());
    owned_thread(&h.store, "thread_1", "ghost").await;

    let err = h
        .engine
        .request_consultation("thread_1", "ghost", "help")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UserNotFound));
}
