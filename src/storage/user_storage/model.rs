use chrono::{NaiveTime, TimeDelta};
use thiserror::Error;

use crate::models::{AccessWindow, ConversationState, Credential, UnknownStateError, UserRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserModelError {
    #[error(transparent)]
    UnknownState(#[from] UnknownStateError),

    #[error("Stored time zone '{0}' is not a valid IANA identifier")]
    InvalidTimeZone(String),
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserStorageModel {
    pub id: i64,
    pub first_name: String,
    pub state: String,
    pub time_zone: Option<String>,
    pub access_window_start: Option<NaiveTime>,
    pub access_window_end: Option<NaiveTime>,
    pub nominal_work_seconds: i64,
    pub overtime_threshold_seconds: i64,
    pub spreadsheet_id: Option<String>,
    pub credential: Option<String>,
}

impl From<&UserRecord> for UserStorageModel {
    fn from(value: &UserRecord) -> Self {
        Self {
            id: value.id,
            first_name: value.first_name.clone(),
            state: value.state.as_str().to_string(),
            time_zone: value.time_zone.map(|tz| tz.name().to_string()),
            access_window_start: value.access_window.map(|w| w.start),
            access_window_end: value.access_window.map(|w| w.end),
            nominal_work_seconds: value.nominal_work_duration.num_seconds(),
            overtime_threshold_seconds: value.overtime_threshold.num_seconds(),
            spreadsheet_id: value.spreadsheet_id.clone(),
            credential: value.credential.as_ref().map(|c| c.expose().to_string()),
        }
    }
}

impl TryFrom<UserStorageModel> for UserRecord {
    type Error = UserModelError;

    fn try_from(value: UserStorageModel) -> Result<Self, Self::Error> {
        let state: ConversationState = value.state.parse()?;
        let time_zone = value
            .time_zone
            .filter(|tz| !tz.is_empty())
            .map(|tz| tz.parse().map_err(|_| UserModelError::InvalidTimeZone(tz)))
            .transpose()?;
        let access_window = match (value.access_window_start, value.access_window_end) {
            (Some(start), Some(end)) => Some(AccessWindow { start, end }),
            _ => None,
        };

        Ok(Self {
            id: value.id,
            first_name: value.first_name,
            state,
            time_zone,
            access_window,
            nominal_work_duration: TimeDelta::seconds(value.nominal_work_seconds),
            overtime_threshold: TimeDelta::seconds(value.overtime_threshold_seconds),
            spreadsheet_id: value.spreadsheet_id.filter(|id| !id.is_empty()),
            credential: value.credential.map(Credential::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;

    fn arb_user() -> impl Strategy<Value = UserRecord> {
        (
            any::<i64>(),
            "[A-Za-z ]{0,16}",
            prop::sample::select(ConversationState::ALL.to_vec()),
            prop::option::of(prop_oneof![
                Just(chrono_tz::UTC),
                Just(chrono_tz::Europe::Rome),
                Just(chrono_tz::America::New_York),
                Just(chrono_tz::Asia::Tokyo),
            ]),
            prop::option::of((arb::<NaiveTime>(), arb::<NaiveTime>())),
            0i64..86_400,
            0i64..7_200,
            prop::option::of("[0-9]{1,6}"),
            prop::option::of("[A-Za-z0-9]{8,24}"),
        )
            .prop_map(
                |(
                    id,
                    first_name,
                    state,
                    time_zone,
                    window,
                    nominal,
                    threshold,
                    spreadsheet_id,
                    credential,
                )| UserRecord {
                    id,
                    first_name,
                    state,
                    time_zone,
                    access_window: window.map(|(start, end)| AccessWindow { start, end }),
                    nominal_work_duration: TimeDelta::seconds(nominal),
                    overtime_threshold: TimeDelta::seconds(threshold),
                    spreadsheet_id,
                    credential: credential.map(Credential::new),
                },
            )
    }

    proptest! {
        #[test]
        fn test_user_roundtrip(user in arb_user()) {
            let storage = UserStorageModel::from(&user);
            let restored = UserRecord::try_from(storage).unwrap();

            prop_assert_eq!(user, restored);
        }

        #[test]
        fn test_unknown_state_is_never_swallowed(state in "[a-z_]{1,24}") {
            prop_assume!(state.parse::<ConversationState>().is_err());
            let mut storage = UserStorageModel::from(&UserRecord::new(1, "Ada"));
            storage.state = state.clone();

            prop_assert_eq!(
                UserRecord::try_from(storage),
                Err(UserModelError::UnknownState(UnknownStateError(state)))
            );
        }
    }

    #[test]
    fn invalid_time_zone_is_rejected() {
        let mut storage = UserStorageModel::from(&UserRecord::new(1, "Ada"));
        storage.time_zone = Some("Mars/Olympus_Mons".to_string());

        assert_eq!(
            UserRecord::try_from(storage),
            Err(UserModelError::InvalidTimeZone("Mars/Olympus_Mons".to_string()))
        );
    }

    #[test]
    fn empty_time_zone_means_not_configured() {
        let mut storage = UserStorageModel::from(&UserRecord::new(1, "Ada"));
        storage.time_zone = Some(String::new());

        assert_eq!(UserRecord::try_from(storage).unwrap().time_zone, None);
    }
}
