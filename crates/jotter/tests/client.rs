use std::time::Duration;

use jotter::{ClientError, HttpNotesApi, NoteForm, NotesApi, NotesState, SortOrder};
use jotter_core::NoteInput;
use jotter_server::config::Config;
use jotter_server::routes;
use jotter_server::state::AppState;
use tokio::net::TcpListener;

async fn spawn_server(database_url: &str) -> String {
    let mut config = Config::default();
    config.storage.database_url = database_url.to_string();
    let app = routes::router(AppState::new(&config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/", addr)
}

fn client(base_url: &str) -> HttpNotesApi {
    HttpNotesApi::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn crud_through_http() {
    let api = client(&spawn_server("memory://").await);

    let created = api
        .create(&NoteInput::new("Groceries", "milk, eggs"))
        .await
        .unwrap();
    assert_eq!(created.title, "Groceries");
    assert!(!created.was_updated());

    let id = created.id.to_string();
    let updated = api
        .update(&id, &NoteInput::new("Groceries", "milk, eggs, bread"))
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert!(updated.updated_at > created.updated_at);

    assert_eq!(api.get(&id).await.unwrap(), updated);
    assert_eq!(api.list().await.unwrap(), vec![updated]);

    api.delete(&id).await.unwrap();
    let err = api.get(&id).await.unwrap_err();
    assert_eq!(
        err,
        ClientError::Api {
            status: 404,
            message: "Note not found".to_string()
        }
    );
}

#[tokio::test]
async fn server_messages_are_passed_through() {
    let api = client(&spawn_server("memory://").await);

    let err = api.get("nope").await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "Invalid note ID");

    let err = api.create(&NoteInput::new("", "body")).await.unwrap_err();
    assert_eq!(err.to_string(), "Title is required");
}

#[tokio::test]
async fn health_reports_store_state() {
    let api = client(&spawn_server("memory://").await);
    let health = api.health().await.unwrap();
    assert_eq!(health.message, "Database connected successfully");

    let api = client(&spawn_server("mongodb://127.0.0.1:27017/notesapp").await);
    let err = api.list().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "Database connection failed");
}

#[tokio::test]
async fn state_and_form_against_server() {
    let api = client(&spawn_server("sqlite::memory:").await);
    let mut state = NotesState::new(api);

    for (title, content) in [("beta", "second"), ("Alpha", "first")] {
        state.begin_create().unwrap();
        let mut form = NoteForm::new(None);
        form.set_title(title);
        form.set_content(content);
        assert!(form.submit(&mut state).await.is_some());
    }

    state.fetch_all().await.unwrap();
    assert_eq!(state.notes().len(), 2);
    assert_eq!(state.notes()[0].title, "Alpha");

    state.set_sort_order(SortOrder::Title);
    state.set_search_query("SEC");
    let visible = state.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "beta");
}

#[tokio::test]
async fn silent_server_times_out() {
    // Accepts connections but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let api = HttpNotesApi::new(&url, Duration::from_millis(200)).unwrap();
    assert_eq!(api.list().await.unwrap_err(), ClientError::Timeout);

    drop(listener);
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = client(&url).list().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "{:?}", err);
}
