use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures::{Stream, StreamExt};

use crate::middleware::auth::AuthenticatedUser;
use crate::services::change_feed::FeedMessage;
use crate::state::AppState;

pub fn create_realtime_router() -> Router<AppState> {
    Router::new().route("/issues", get(issue_changes))
}

fn to_event(message: FeedMessage) -> Event {
    match message {
        FeedMessage::Change(change) => match Event::default().event("change").json_data(&change) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("⚠️ No se pudo serializar el cambio {:?}: {}", change, e);
                Event::default().event("resync").data("serialization")
            }
        },
        FeedMessage::Resync { missed } => Event::default().event("resync").data(missed.to_string()),
    }
}

/// SSE con los cambios de issues y ubicaciones en vivo
async fn issue_changes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    log::info!(
        "📡 Suscriptor {} conectado al feed ({} activos)",
        user.technician_id,
        state.change_feed.subscriber_count() + 1
    );

    let stream = state.change_feed.subscribe().map(|message| Ok(to_event(message)));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
