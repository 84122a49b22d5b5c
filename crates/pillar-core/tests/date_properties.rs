//! Property tests for calendar arithmetic and tenor parsing.

use pillar_core::prelude::*;
use proptest::prelude::*;

fn any_date() -> impl Strategy<Value = Date> {
    (2000i32..2060, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| Date::from_ymd(y, m, d).unwrap())
}

fn any_calendar() -> impl Strategy<Value = MarketCalendar> {
    prop_oneof![
        Just(MarketCalendar::WeekendsOnly),
        Just(MarketCalendar::Target),
        Just(MarketCalendar::UnitedKingdom),
        Just(MarketCalendar::UnitedStates),
        Just(MarketCalendar::Joint(vec![
            MarketCalendar::Target,
            MarketCalendar::UnitedStates
        ])),
    ]
}

proptest! {
    #[test]
    fn adjusted_dates_are_business_days(date in any_date(), cal in any_calendar()) {
        for bdc in [
            BusinessDayConvention::Following,
            BusinessDayConvention::ModifiedFollowing,
            BusinessDayConvention::Preceding,
            BusinessDayConvention::ModifiedPreceding,
        ] {
            let adjusted = cal.adjust(date, bdc);
            prop_assert!(cal.is_business_day(adjusted));
            prop_assert!((adjusted - date).abs() <= 10);
        }
    }

    #[test]
    fn modified_following_stays_in_month(date in any_date(), cal in any_calendar()) {
        let adjusted = cal.adjust(date, BusinessDayConvention::ModifiedFollowing);
        prop_assert_eq!(adjusted.month(), date.month());
    }

    #[test]
    fn advancing_months_moves_forward(date in any_date(), n in 1i32..120) {
        let cal = MarketCalendar::Target;
        let out = cal
            .advance(date, Period::months(n), BusinessDayConvention::ModifiedFollowing, false)
            .unwrap();
        prop_assert!(out > date);
        prop_assert!(cal.is_business_day(out));
    }

    #[test]
    fn period_display_roundtrip(n in 1i32..400, unit in 0usize..4) {
        let unit = [TimeUnit::Days, TimeUnit::Weeks, TimeUnit::Months, TimeUnit::Years][unit];
        let p = Period::new(n, unit);
        prop_assert_eq!(p.to_string().parse::<Period>().unwrap(), p);
    }

    #[test]
    fn year_fraction_is_antisymmetric(a in any_date(), b in any_date()) {
        for dc in [
            DayCountConvention::Act360,
            DayCountConvention::Act365Fixed,
            DayCountConvention::ActActIsda,
        ] {
            let forward = dc.year_fraction(a, b);
            let backward = dc.year_fraction(b, a);
            prop_assert!((forward + backward).abs() < 1e-12);
        }
    }
}
