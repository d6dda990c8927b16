use chrono::{NaiveTime, TimeDelta};

use crate::models::{DayEntryRow, ExitFields};

/// Entry time plus nominal work, wrapping past midnight.
pub fn theoretical_exit(entry: NaiveTime, nominal_work: TimeDelta) -> NaiveTime {
    entry.overflowing_add_signed(nominal_work).0
}

pub fn total_duration(entry: NaiveTime, exit: NaiveTime) -> TimeDelta {
    exit - entry
}

/// Undertime is always reported as a negative figure, surplus only once it
/// exceeds the threshold.
pub fn overtime(total: TimeDelta, nominal_work: TimeDelta, threshold: TimeDelta) -> TimeDelta {
    let surplus = total - nominal_work;

    if surplus > threshold || surplus < TimeDelta::zero() {
        surplus
    } else {
        TimeDelta::zero()
    }
}

pub fn exit_fields(
    row: &DayEntryRow,
    exit: NaiveTime,
    nominal_work: TimeDelta,
    threshold: TimeDelta,
) -> ExitFields {
    let total = total_duration(row.actual_entry_time, exit);

    ExitFields {
        actual_exit_time: exit,
        total_duration: total,
        overtime_duration: overtime(total, nominal_work, threshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::truncate_to_minute;
    use crate::models::user::{default_nominal_work_duration, default_overtime_threshold};
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn overtime_for(entry: NaiveTime, exit: NaiveTime) -> TimeDelta {
        overtime(
            total_duration(entry, exit),
            default_nominal_work_duration(),
            default_overtime_threshold(),
        )
    }

    #[test]
    fn surplus_below_threshold_is_zero() {
        assert_eq!(overtime_for(at(9, 0), at(17, 0)), TimeDelta::zero());
    }

    #[test]
    fn surplus_above_threshold_is_reported() {
        assert_eq!(overtime_for(at(9, 0), at(17, 30)), TimeDelta::minutes(48));
    }

    #[test]
    fn deficit_is_reported_as_negative() {
        assert_eq!(overtime_for(at(9, 0), at(16, 30)), TimeDelta::minutes(-12));
        assert_eq!(overtime_for(at(9, 0), at(16, 0)), TimeDelta::minutes(-42));
    }

    #[test]
    fn surplus_equal_to_threshold_is_zero() {
        let threshold = default_overtime_threshold();
        let total = default_nominal_work_duration() + threshold;

        assert_eq!(
            overtime(total, default_nominal_work_duration(), threshold),
            TimeDelta::zero()
        );
    }

    #[test]
    fn theoretical_exit_adds_nominal_work() {
        assert_eq!(
            theoretical_exit(at(9, 0), default_nominal_work_duration()),
            at(16, 42)
        );
        assert_eq!(theoretical_exit(at(20, 0), TimeDelta::hours(6)), at(2, 0));
    }

    proptest! {
        #[test]
        fn test_overtime_is_never_a_small_positive(
            entry in arb::<NaiveTime>(),
            exit in arb::<NaiveTime>(),
        ) {
            let threshold = default_overtime_threshold();
            let overtime = overtime_for(truncate_to_minute(entry), truncate_to_minute(exit));

            prop_assert!(overtime <= TimeDelta::zero() || overtime > threshold);
        }

        #[test]
        fn test_overtime_is_zero_or_the_surplus(
            entry in arb::<NaiveTime>(),
            exit in arb::<NaiveTime>(),
        ) {
            let (entry, exit) = (truncate_to_minute(entry), truncate_to_minute(exit));
            let surplus = total_duration(entry, exit) - default_nominal_work_duration();
            let overtime = overtime_for(entry, exit);

            prop_assert!(overtime == TimeDelta::zero() || overtime == surplus);
            if surplus < TimeDelta::zero() {
                prop_assert_eq!(overtime, surplus);
            }
        }
    }
}
