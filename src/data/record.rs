use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::util::round_hundredths;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum UserId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    #[serde(default)]
    pub connections: Vec<UserId>,
    #[serde(default)]
    pub check_in_time: Vec<String>,
}

pub fn parse_check_in_time(user: &UserId, raw: &str) -> Result<DateTime<Utc>, GraphError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| GraphError::InvalidTimestamp {
            user: user.clone(),
            value: raw.to_owned(),
        })
}

/// Span between the earliest and latest check-in in hours, floored to whole
/// minutes and rounded to two decimals. Input order does not matter.
pub fn check_in_duration_hours(check_ins: &[DateTime<Utc>]) -> f32 {
    let (Some(earliest), Some(latest)) = (check_ins.iter().min(), check_ins.iter().max()) else {
        return 0.0;
    };

    let minutes = (*latest - *earliest).num_minutes().max(0);
    round_hundredths(minutes as f64 / 60.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_naive_times() {
        let user = UserId::from(1);
        let zulu = parse_check_in_time(&user, "2010-10-19T23:55:27Z").unwrap();
        let naive = parse_check_in_time(&user, "2010-10-19 23:55:27").unwrap();
        assert_eq!(zulu, naive);
    }

    #[test]
    fn rejects_garbage_time() {
        let user = UserId::from("u7");
        let error = parse_check_in_time(&user, "yesterday").unwrap_err();
        assert_eq!(
            error,
            GraphError::InvalidTimestamp {
                user,
                value: "yesterday".to_owned()
            }
        );
    }

    #[test]
    fn duration_floors_to_minutes() {
        let user = UserId::from(1);
        let times = [
            parse_check_in_time(&user, "2010-10-19T10:00:00Z").unwrap(),
            parse_check_in_time(&user, "2010-10-19T11:30:59Z").unwrap(),
        ];
        assert_eq!(check_in_duration_hours(&times), 1.5);
        assert_eq!(check_in_duration_hours(&[]), 0.0);
    }

    #[test]
    fn ids_deserialize_from_numbers_and_strings() {
        let ids: Vec<UserId> = serde_json::from_str(r#"[3, "abc"]"#).unwrap();
        assert_eq!(ids, vec![UserId::Numeric(3), UserId::Text("abc".to_owned())]);
        assert!(ids[0] < ids[1]);
    }
}
