//! Members of the ensemble.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// A member's role within the ensemble.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
  #[default]
  Musician,
  SectionLeader,
  Board,
  /// Leads rehearsals; not subject to attendance compliance.
  Conductor,
}

impl MemberRole {
  /// Whether members with this role are excluded from absence compliance.
  pub fn is_attendance_exempt(&self) -> bool { matches!(self, Self::Conductor) }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Musician => "musician",
      Self::SectionLeader => "section_leader",
      Self::Board => "board",
      Self::Conductor => "conductor",
    }
  }
}

impl fmt::Display for MemberRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

impl FromStr for MemberRole {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "musician" => Ok(Self::Musician),
      "section_leader" => Ok(Self::SectionLeader),
      "board" => Ok(Self::Board),
      "conductor" => Ok(Self::Conductor),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

/// A member as held by the member directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
  pub member_id:  Uuid,
  pub name:       String,
  pub active:     bool,
  /// A frozen membership: still on the books, but not expected to attend.
  pub suspended:  bool,
  pub role:       MemberRole,
  pub created_at: DateTime<Utc>,
}

impl Member {
  /// Whether this member is evaluated for chronic absence.
  pub fn is_attendance_eligible(&self) -> bool {
    self.active && !self.suspended && !self.role.is_attendance_exempt()
  }
}

/// Input to [`crate::store::MemberDirectory::add_member`].
/// `member_id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
  pub name:      String,
  #[serde(default)]
  pub role:      MemberRole,
  #[serde(default = "default_true")]
  pub active:    bool,
  #[serde(default)]
  pub suspended: bool,
}

fn default_true() -> bool { true }

impl NewMember {
  /// An active, non-suspended musician.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:      name.into(),
      role:      MemberRole::default(),
      active:    true,
      suspended: false,
    }
  }

  pub fn with_role(mut self, role: MemberRole) -> Self {
    self.role = role;
    self
  }
}

/// Partial update applied by administrative actions. `None` leaves the field
/// unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberUpdate {
  pub name:      Option<String>,
  pub active:    Option<bool>,
  pub suspended: Option<bool>,
  pub role:      Option<MemberRole>,
}
