//! Test helpers: sample events and a loopback HTTP server

use crate::types::CalendarEvent;
use axum::Router;

/// Serve `app` on an ephemeral loopback port, returning its base URL
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}", addr)
}

pub fn event(id: Option<&str>, impact: &str, date: &str) -> CalendarEvent {
    CalendarEvent {
        id: id.map(str::to_string),
        title: Some("NFP".to_string()),
        country: Some("USD".to_string()),
        currency: None,
        impact: impact.to_string(),
        date: Some(date.to_string()),
        forecast: Some("180K".to_string()),
        previous: Some("150K".to_string()),
    }
}

pub fn titled(id: &str, title: &str, date: &str) -> CalendarEvent {
    CalendarEvent {
        title: Some(title.to_string()),
        ..event(Some(id), "High", date)
    }
}
