//! Subjects and identities.
//!
//! PolicyKit describes "who" as a `(sa{sv})` record: a kind string plus a
//! dictionary of details whose keys depend on the kind. [`Subject`] is the
//! typed view; [`SubjectRecord`] and [`OwnedSubjectRecord`] are the outbound
//! and inbound wire forms.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use zbus::zvariant::{OwnedValue, Type, Value};

const KIND_UNIX_SESSION: &str = "unix-session";
const KIND_UNIX_USER: &str = "unix-user";
const KIND_UNIX_GROUP: &str = "unix-group";
const KIND_UNIX_PROCESS: &str = "unix-process";

const KEY_SESSION_ID: &str = "session-id";
const KEY_UID: &str = "uid";
const KEY_GID: &str = "gid";
const KEY_PID: &str = "pid";
const KEY_START_TIME: &str = "start-time";

/// Errors decoding a wire record into a [`Subject`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubjectError {
    #[error("{kind} subject is missing detail '{key}'")]
    MissingDetail { kind: String, key: &'static str },
    #[error("{kind} subject detail '{key}' has an unexpected type")]
    WrongDetailType { kind: String, key: &'static str },
}

/// A typed PolicyKit subject.
///
/// Each variant carries exactly the details its kind requires, so a partial
/// record cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    UnixSession { session_id: String },
    UnixUser { uid: u32 },
    UnixGroup { gid: u32 },
    UnixProcess { pid: u32, start_time: u64 },
    /// A kind this agent does not interpret; details are dropped.
    Unknown { kind: String },
}

/// Identities are subjects of the `unix-user` / `unix-group` kinds.
pub type Identity = Subject;

/// Build the `unix-user` identity sent back to the authority.
pub fn build_identity(uid: u32) -> Identity {
    Subject::UnixUser { uid }
}

/// Build the `unix-session` subject the agent registers for.
pub fn build_session_subject(session_id: impl Into<String>) -> Subject {
    Subject::UnixSession {
        session_id: session_id.into(),
    }
}

impl Subject {
    pub fn kind(&self) -> &str {
        match self {
            Self::UnixSession { .. } => KIND_UNIX_SESSION,
            Self::UnixUser { .. } => KIND_UNIX_USER,
            Self::UnixGroup { .. } => KIND_UNIX_GROUP,
            Self::UnixProcess { .. } => KIND_UNIX_PROCESS,
            Self::Unknown { kind } => kind,
        }
    }

    /// Wire record for outbound calls.
    pub fn to_record(&self) -> SubjectRecord<'static> {
        let mut details: HashMap<String, Value<'static>> = HashMap::new();
        match self {
            Self::UnixSession { session_id } => {
                details.insert(KEY_SESSION_ID.into(), Value::from(session_id.clone()));
            }
            Self::UnixUser { uid } => {
                details.insert(KEY_UID.into(), Value::from(*uid));
            }
            Self::UnixGroup { gid } => {
                details.insert(KEY_GID.into(), Value::from(*gid));
            }
            Self::UnixProcess { pid, start_time } => {
                details.insert(KEY_PID.into(), Value::from(*pid));
                details.insert(KEY_START_TIME.into(), Value::from(*start_time));
            }
            Self::Unknown { .. } => {}
        }
        SubjectRecord {
            kind: self.kind().to_string(),
            details,
        }
    }
}

/// Outbound `(sa{sv})` record.
#[derive(Debug, PartialEq, Serialize, Type)]
pub struct SubjectRecord<'a> {
    pub kind: String,
    pub details: HashMap<String, Value<'a>>,
}

/// Inbound `(sa{sv})` record, as received in `BeginAuthentication`.
#[derive(Debug, Deserialize, Type)]
pub struct OwnedSubjectRecord {
    pub kind: String,
    pub details: HashMap<String, OwnedValue>,
}

impl TryFrom<&OwnedSubjectRecord> for Subject {
    type Error = SubjectError;

    fn try_from(record: &OwnedSubjectRecord) -> Result<Self, Self::Error> {
        let kind = record.kind.as_str();
        let details = &record.details;
        match kind {
            KIND_UNIX_SESSION => Ok(Self::UnixSession {
                session_id: detail_str(kind, details, KEY_SESSION_ID)?,
            }),
            KIND_UNIX_USER => Ok(Self::UnixUser {
                uid: detail_u32(kind, details, KEY_UID)?,
            }),
            KIND_UNIX_GROUP => Ok(Self::UnixGroup {
                gid: detail_u32(kind, details, KEY_GID)?,
            }),
            KIND_UNIX_PROCESS => Ok(Self::UnixProcess {
                pid: detail_u32(kind, details, KEY_PID)?,
                start_time: detail_u64(kind, details, KEY_START_TIME)?,
            }),
            other => Ok(Self::Unknown {
                kind: other.to_string(),
            }),
        }
    }
}

fn detail<'d>(
    kind: &str,
    details: &'d HashMap<String, OwnedValue>,
    key: &'static str,
) -> Result<&'d Value<'static>, SubjectError> {
    details
        .get(key)
        .map(|v| &**v)
        .ok_or_else(|| SubjectError::MissingDetail {
            kind: kind.to_string(),
            key,
        })
}

fn wrong_type(kind: &str, key: &'static str) -> SubjectError {
    SubjectError::WrongDetailType {
        kind: kind.to_string(),
        key,
    }
}

fn detail_str(
    kind: &str,
    details: &HashMap<String, OwnedValue>,
    key: &'static str,
) -> Result<String, SubjectError> {
    match detail(kind, details, key)? {
        Value::Str(s) => Ok(s.as_str().to_string()),
        _ => Err(wrong_type(kind, key)),
    }
}

fn detail_u32(
    kind: &str,
    details: &HashMap<String, OwnedValue>,
    key: &'static str,
) -> Result<u32, SubjectError> {
    match detail(kind, details, key)? {
        Value::U32(n) => Ok(*n),
        Value::I32(n) => u32::try_from(*n).map_err(|_| wrong_type(kind, key)),
        Value::U64(n) => u32::try_from(*n).map_err(|_| wrong_type(kind, key)),
        Value::I64(n) => u32::try_from(*n).map_err(|_| wrong_type(kind, key)),
        _ => Err(wrong_type(kind, key)),
    }
}

fn detail_u64(
    kind: &str,
    details: &HashMap<String, OwnedValue>,
    key: &'static str,
) -> Result<u64, SubjectError> {
    match detail(kind, details, key)? {
        Value::U64(n) => Ok(*n),
        Value::U32(n) => Ok(u64::from(*n)),
        Value::I64(n) => u64::try_from(*n).map_err(|_| wrong_type(kind, key)),
        _ => Err(wrong_type(kind, key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ov(value: Value<'static>) -> OwnedValue {
        OwnedValue::try_from(value).unwrap()
    }

    fn owned(kind: &str, details: Vec<(&str, OwnedValue)>) -> OwnedSubjectRecord {
        OwnedSubjectRecord {
            kind: kind.to_string(),
            details: details
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    #[test]
    fn build_identity_is_unix_user_with_uid() {
        let record = build_identity(1000).to_record();
        assert_eq!(record.kind, "unix-user");
        assert_eq!(record.details.len(), 1);
        assert_eq!(record.details.get("uid"), Some(&Value::U32(1000)));
    }

    #[test]
    fn build_identity_is_deterministic() {
        assert_eq!(build_identity(42), build_identity(42));
        assert_eq!(build_identity(42).to_record(), build_identity(42).to_record());
    }

    #[test]
    fn session_subject_record() {
        let record = build_session_subject("c2").to_record();
        assert_eq!(record.kind, "unix-session");
        assert_eq!(
            record.details.get("session-id"),
            Some(&Value::from("c2".to_string()))
        );
    }

    #[test]
    fn subject_record_signature() {
        assert_eq!(SubjectRecord::signature().as_str(), "(sa{sv})");
        assert_eq!(OwnedSubjectRecord::signature().as_str(), "(sa{sv})");
    }

    #[test]
    fn decode_unix_user() {
        let record = owned("unix-user", vec![("uid", ov(Value::from(1000u32)))]);
        assert_eq!(Subject::try_from(&record), Ok(Subject::UnixUser { uid: 1000 }));
    }

    #[test]
    fn decode_unix_group() {
        let record = owned("unix-group", vec![("gid", ov(Value::from(10u32)))]);
        assert_eq!(Subject::try_from(&record), Ok(Subject::UnixGroup { gid: 10 }));
    }

    #[test]
    fn decode_missing_detail_is_rejected() {
        let record = owned("unix-user", vec![]);
        assert_eq!(
            Subject::try_from(&record),
            Err(SubjectError::MissingDetail {
                kind: "unix-user".to_string(),
                key: "uid"
            })
        );
    }

    #[test]
    fn decode_negative_uid_is_rejected() {
        let record = owned("unix-user", vec![("uid", ov(Value::from(-1i32)))]);
        assert!(matches!(
            Subject::try_from(&record),
            Err(SubjectError::WrongDetailType { .. })
        ));
    }

    #[test]
    fn decode_unknown_kind_is_preserved() {
        let record = owned("netgroup", vec![]);
        assert_eq!(
            Subject::try_from(&record),
            Ok(Subject::Unknown {
                kind: "netgroup".to_string()
            })
        );
    }
}
