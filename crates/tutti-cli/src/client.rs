//! Async HTTP client wrapping the Tutti JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tutti_core::{
  attendance::{AttendanceRecord, AttendanceStatus},
  compliance::ComplianceSnapshot,
  dues::DuesRecord,
  event::{Event, EventKind},
  member::{Member, MemberRole},
  period::Period,
  report::{Admission, Backfill, BatchReport, Scheduled},
};
use uuid::Uuid;

/// Async HTTP client for the Tutti JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: String) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(120))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base_url })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  /// Send `req` and decode a JSON body, turning a non-2xx status into an
  /// error carrying the server's `{"error": ...}` message.
  async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
    tracing::debug!(what, "sending request");
    let resp = req.send().await.with_context(|| format!("{what} failed"))?;

    let status = resp.status();
    if !status.is_success() {
      let message = resp
        .json::<Value>()
        .await
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_owned))
        .unwrap_or_default();
      return Err(anyhow!("{what} → {status} {message}"));
    }
    resp.json().await.with_context(|| format!("deserialising {what} response"))
  }

  // ── Members ───────────────────────────────────────────────────────────────

  /// `GET /api/members[?active=true]`
  pub async fn list_members(&self, active_only: bool) -> Result<Vec<Member>> {
    let req = self
      .client
      .get(self.url("/members"))
      .query(&[("active", active_only)]);
    self.send(req, "GET /members").await
  }

  /// `POST /api/members`
  pub async fn admit_member(&self, name: &str, role: MemberRole) -> Result<Admission> {
    let req = self
      .client
      .post(self.url("/members"))
      .json(&json!({ "name": name, "role": role }));
    self.send(req, "POST /members").await
  }

  // ── Dues ──────────────────────────────────────────────────────────────────

  /// `POST /api/dues/generate`
  pub async fn generate_dues(&self, period: Option<Period>) -> Result<BatchReport> {
    let req = self
      .client
      .post(self.url("/dues/generate"))
      .json(&json!({ "period": period }));
    self.send(req, "POST /dues/generate").await
  }

  /// `POST /api/members/:id/dues/backfill`
  pub async fn backfill_dues(&self, member_id: Uuid) -> Result<Backfill> {
    let req = self
      .client
      .post(self.url(&format!("/members/{member_id}/dues/backfill")));
    self.send(req, "POST /members/:id/dues/backfill").await
  }

  /// `PATCH /api/dues/:id`
  pub async fn set_paid(
    &self,
    dues_id: Uuid,
    paid: bool,
    note: Option<String>,
  ) -> Result<DuesRecord> {
    let req = self
      .client
      .patch(self.url(&format!("/dues/{dues_id}")))
      .json(&json!({ "paid": paid, "note": note }));
    self.send(req, "PATCH /dues/:id").await
  }

  /// `GET /api/members/:id/dues`
  pub async fn member_dues(&self, member_id: Uuid) -> Result<Vec<DuesRecord>> {
    let req = self
      .client
      .get(self.url(&format!("/members/{member_id}/dues")));
    self.send(req, "GET /members/:id/dues").await
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  /// `POST /api/members/:id/attendance/seed`
  pub async fn seed_member(&self, member_id: Uuid) -> Result<BatchReport> {
    let req = self
      .client
      .post(self.url(&format!("/members/{member_id}/attendance/seed")));
    self.send(req, "POST /members/:id/attendance/seed").await
  }

  /// `POST /api/events/:id/attendance/seed`
  pub async fn seed_event(&self, event_id: Uuid) -> Result<BatchReport> {
    let req = self
      .client
      .post(self.url(&format!("/events/{event_id}/attendance/seed")));
    self.send(req, "POST /events/:id/attendance/seed").await
  }

  /// `PATCH /api/attendance/:id`
  pub async fn mark_attendance(
    &self,
    attendance_id: Uuid,
    status: AttendanceStatus,
  ) -> Result<AttendanceRecord> {
    let req = self
      .client
      .patch(self.url(&format!("/attendance/{attendance_id}")))
      .json(&json!({ "status": status }));
    self.send(req, "PATCH /attendance/:id").await
  }

  // ── Events ────────────────────────────────────────────────────────────────

  /// `GET /api/events[?date_from=...]`
  pub async fn list_events(&self, from: Option<NaiveDate>) -> Result<Vec<Event>> {
    let mut req = self.client.get(self.url("/events"));
    if let Some(from) = from {
      req = req.query(&[("date_from", from.to_string())]);
    }
    self.send(req, "GET /events").await
  }

  /// `POST /api/events`
  pub async fn add_event(
    &self,
    kind: EventKind,
    date: NaiveDate,
    title: &str,
  ) -> Result<Scheduled> {
    let req = self
      .client
      .post(self.url("/events"))
      .json(&json!({ "kind": kind, "date": date, "title": title }));
    self.send(req, "POST /events").await
  }

  // ── Compliance ────────────────────────────────────────────────────────────

  /// `GET /api/compliance`
  pub async fn compliance(&self) -> Result<ComplianceSnapshot> {
    self
      .send(self.client.get(self.url("/compliance")), "GET /compliance")
      .await
  }
}
