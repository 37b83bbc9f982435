//! Drives `AppStore` against the real router on a loopback port.

use std::sync::Arc;

use argon2::Params;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use sharebin_api::credentials::Argon2Credentials;
use sharebin_api::{AppState, AppStateInner, build_router};
use sharebin_client::http::ApiClient;
use sharebin_client::storage::DeviceStorage;
use sharebin_client::validate::{ContentForm, PasswordChangeForm, SignUpForm, ValidationError};
use sharebin_client::{AppStore, ClientError};
use sharebin_db::Database;
use sharebin_db::models::{UserRow, now_timestamp};
use sharebin_types::Role;
use sharebin_types::api::UpdateProfileRequest;

struct TestServer {
    url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Stops accepting connections and waits for the listener to close.
    async fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.unwrap();
        }
    }
}

fn seed_user(state: &AppState, id: &str, username: &str, password: &str, role: &str) {
    let row = UserRow {
        id: id.into(),
        username: username.into(),
        email: format!("{username}@x.com"),
        password: state.credentials.hash(password).unwrap(),
        name: None,
        role: role.into(),
        created_at: now_timestamp(),
    };
    state.db.create_user(&row).unwrap();
}

/// Server seeded with bob (user) and root (admin).
async fn spawn_server() -> TestServer {
    let db = Database::open_in_memory().unwrap();
    let credentials = Argon2Credentials::new(Params::new(1024, 1, 1, None).unwrap());
    let state: AppState = Arc::new(AppStateInner::with_credentials(
        db,
        "test-secret".into(),
        Box::new(credentials),
    ));
    seed_user(&state, "u-bob", "bob", "hunter22", "user");
    seed_user(&state, "u-root", "root", "toor-pass", "admin");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        axum::serve(listener, build_router(state))
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    TestServer {
        url,
        shutdown: Some(tx),
        handle: Some(handle),
    }
}

fn store(url: &str, dir: &TempDir) -> AppStore {
    let api = ApiClient::new(url).unwrap();
    let storage = DeviceStorage::open(dir.path()).unwrap();
    AppStore::hydrate(api, storage).unwrap()
}

fn sign_up(username: &str, password: &str) -> SignUpForm {
    SignUpForm {
        username: username.into(),
        email: format!("{username}@x.com"),
        name: String::new(),
        password: password.into(),
        confirm_password: password.into(),
    }
}

fn paste_form(title: &str) -> ContentForm {
    ContentForm::new(title, "fn main() { println!(\"hi\"); }", "rust, snippet")
}

#[tokio::test]
async fn sign_up_login_and_session_restore() {
    let server = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let mut app = store(&server.url, &dir);

    let alice = app.register(&sign_up("alice", "secret")).await.unwrap();
    assert_eq!(alice.role, Role::User);
    assert!(!app.auth().is_authenticated());

    let err = app.login("alice", "wrong-pass").await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
    assert!(!app.auth().is_authenticated());

    let user = app.login("alice@x.com", "secret").await.unwrap();
    assert_eq!(user.id, alice.id);
    assert!(app.auth().is_authenticated());

    // A fresh store over the same state dir picks the session back up.
    let mut restored = store(&server.url, &dir);
    assert_eq!(restored.auth().user_id(), Some(alice.id.as_str()));
    restored.add_paste(&paste_form("From restore")).await.unwrap();

    restored.logout().unwrap();
    let after = store(&server.url, &dir);
    assert!(!after.auth().is_authenticated());
}

#[tokio::test]
async fn paste_and_blog_mutations_commit_on_success() {
    let server = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let mut app = store(&server.url, &dir);
    app.login("bob", "hunter22").await.unwrap();

    let paste = app.add_paste(&paste_form("Hello")).await.unwrap();
    assert_eq!(paste.user_id, "u-bob");
    assert_eq!(paste.tags, ["rust", "snippet"]);
    assert_eq!(app.pastes().len(), 1);

    let updated = app
        .update_paste(&paste.id, &paste_form("Hello again"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Hello again");
    assert_eq!(app.pastes().get(&paste.id).unwrap().title, "Hello again");

    let blog_form = ContentForm::new("Long form", "a".repeat(60), "");
    let blog = app.add_blog(&blog_form).await.unwrap();
    assert!(blog.updated_at.is_none());
    let edited = app
        .update_blog(&blog.id, &ContentForm::new("Longer form", "b".repeat(60), ""))
        .await
        .unwrap()
        .unwrap();
    assert!(edited.updated_at.is_some());

    // A second client sees the same data after a fetch-all.
    let other_dir = tempfile::tempdir().unwrap();
    let mut other = store(&server.url, &other_dir);
    other.load().await.unwrap();
    assert_eq!(other.pastes().items().len(), 1);
    assert_eq!(other.blogs().items().len(), 1);

    app.delete_paste(&paste.id).await.unwrap();
    assert!(app.pastes().is_empty());

    other.load().await.unwrap();
    assert!(other.pastes().is_empty());
}

#[tokio::test]
async fn failures_leave_local_state_untouched() {
    let mut server = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let mut app = store(&server.url, &dir);

    let err = app.add_paste(&paste_form("Nope")).await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));

    app.login("bob", "hunter22").await.unwrap();
    let err = app
        .add_paste(&ContentForm::new("ab", "too short", ""))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::TitleTooShort(3))
    ));

    let kept = app.add_paste(&paste_form("Keeper")).await.unwrap();
    server.stop().await;

    let err = app.add_paste(&paste_form("Lost")).await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
    let err = app.delete_paste(&kept.id).await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
    assert!(app.load().await.is_err());

    assert_eq!(app.pastes().len(), 1);
    assert_eq!(app.pastes().items()[0].title, "Keeper");
}

#[tokio::test]
async fn ownership_is_checked_before_sending() {
    let server = spawn_server().await;
    let bob_dir = tempfile::tempdir().unwrap();
    let mut bob = store(&server.url, &bob_dir);
    bob.login("bob", "hunter22").await.unwrap();
    let paste = bob.add_paste(&paste_form("Bob's")).await.unwrap();

    let alice_dir = tempfile::tempdir().unwrap();
    let mut alice = store(&server.url, &alice_dir);
    alice.register(&sign_up("alice", "secret")).await.unwrap();
    alice.login("alice", "secret").await.unwrap();
    alice.load().await.unwrap();

    let seen = alice.pastes().get(&paste.id).unwrap().clone();
    assert!(!alice.can_modify(&seen));
    let err = alice.delete_paste(&paste.id).await.unwrap_err();
    assert!(matches!(err, ClientError::NotPermitted(_)));
    assert_eq!(alice.pastes().len(), 1);

    let root_dir = tempfile::tempdir().unwrap();
    let mut root = store(&server.url, &root_dir);
    root.login("root", "toor-pass").await.unwrap();
    root.load().await.unwrap();
    assert!(root.can_modify(&seen));
    root.update_paste(&paste.id, &paste_form("Moderated"))
        .await
        .unwrap();

    bob.load().await.unwrap();
    assert_eq!(bob.pastes().get(&paste.id).unwrap().title, "Moderated");
}

#[tokio::test]
async fn chat_rooms_and_replies() {
    let server = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let mut bob = store(&server.url, &dir);
    bob.login("bob", "hunter22").await.unwrap();

    let hello = bob.send_chat("hello everyone", None).await.unwrap();
    assert_eq!(hello.room_id, "general");

    let reply = bob.send_chat("replying", Some(&hello.id)).await.unwrap();
    assert_eq!(reply.reply_to_message.as_deref(), Some("hello everyone"));
    assert_eq!(reply.reply_to_username.as_deref(), Some("bob"));

    let room = bob.create_room("  Rust  Talk ").unwrap();
    assert_eq!(room, "rust-talk");
    assert_eq!(bob.chats().current_room(), "rust-talk");
    assert!(matches!(
        bob.create_room("rust talk"),
        Err(ClientError::RoomExists(_))
    ));
    bob.send_chat("borrowck!", None).await.unwrap();
    assert_eq!(bob.chats().room_chats().len(), 1);

    // The remembered room survives a restart even before a fetch.
    let reopened = store(&server.url, &dir);
    assert!(reopened.chats().rooms().contains(&"rust-talk".to_string()));

    let err = bob.delete_room("rust-talk").await.unwrap_err();
    assert!(matches!(err, ClientError::NotPermitted(_)));

    let root_dir = tempfile::tempdir().unwrap();
    let mut root = store(&server.url, &root_dir);
    root.login("root", "toor-pass").await.unwrap();
    root.load().await.unwrap();
    assert_eq!(root.chats().rooms(), ["general", "rust-talk"]);
    assert_eq!(root.delete_room("rust-talk").await.unwrap(), 1);
    assert_eq!(root.chats().rooms(), ["general"]);

    bob.load().await.unwrap();
    assert_eq!(bob.chats().messages().len(), 2);
    let err = bob.send_chat("   ", None).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::EmptyMessage)
    ));
}

#[tokio::test]
async fn account_and_admin_flows() {
    let server = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let mut bob = store(&server.url, &dir);
    bob.login("bob", "hunter22").await.unwrap();

    let err = bob
        .change_password(&PasswordChangeForm {
            current_password: "not-it".into(),
            new_password: "brand-new".into(),
            confirm_password: "brand-new".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));

    bob.change_password(&PasswordChangeForm {
        current_password: "hunter22".into(),
        new_password: "brand-new".into(),
        confirm_password: "brand-new".into(),
    })
    .await
    .unwrap();

    let renamed = bob
        .update_profile(
            "u-bob",
            &UpdateProfileRequest {
                name: Some("Robert".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Robert");
    assert_eq!(bob.auth().current_user().unwrap().name, "Robert");

    assert!(matches!(
        bob.list_users().await,
        Err(ClientError::NotPermitted(_))
    ));

    let root_dir = tempfile::tempdir().unwrap();
    let mut root = store(&server.url, &root_dir);
    root.login("root", "toor-pass").await.unwrap();

    let carol = root
        .add_user(&sign_up("carol", "carol-pass"), Role::Admin)
        .await
        .unwrap();
    assert_eq!(carol.role, Role::Admin);
    assert_eq!(root.list_users().await.unwrap().len(), 3);

    let demoted = root.set_role(&carol.id, Role::User).await.unwrap();
    assert_eq!(demoted.role, Role::User);

    root.reset_password("u-bob", "reset-by-root").await.unwrap();
    bob.logout().unwrap();
    assert!(bob.login("bob", "brand-new").await.is_err());
    bob.login("bob", "reset-by-root").await.unwrap();
}
