//! Tests for score types.

use super::*;

mod simple_score {
    use super::*;

    #[test]
    fn test_comparison() {
        let s1 = SimpleScore::of(-10);
        let s2 = SimpleScore::of(-5);
        let s3 = SimpleScore::of(0);

        assert!(s3 > s2);
        assert!(s2 > s1);
        assert!(s1.is_worse_than(&s2));
    }

    #[test]
    fn test_arithmetic() {
        let s1 = SimpleScore::of(10);
        let s2 = SimpleScore::of(3);

        assert_eq!(s1 + s2, SimpleScore::of(13));
        assert_eq!(s1 - s2, SimpleScore::of(7));
        assert_eq!(-s1, SimpleScore::of(-10));
        assert_eq!(s1.multiply(2.0), SimpleScore::of(20));
        assert_eq!(s1.divide(2.0), SimpleScore::of(5));
    }

    #[test]
    fn test_init_score_dominates() {
        let uninitialized = SimpleScore::of(50).with_init_score(-1);
        let initialized = SimpleScore::of(-50);

        assert!(initialized > uninitialized);
        assert!(!uninitialized.is_solution_initialized());
        assert!(!uninitialized.is_feasible());
        assert_eq!(uninitialized.with_init_score(0), SimpleScore::of(50));
    }

    #[test]
    fn test_parse() {
        assert_eq!(SimpleScore::parse("42").unwrap(), SimpleScore::of(42));
        assert_eq!(SimpleScore::parse("-10").unwrap(), SimpleScore::of(-10));
        assert_eq!(
            SimpleScore::parse("-3init/7").unwrap(),
            SimpleScore::of(7).with_init_score(-3)
        );
        assert!(SimpleScore::parse("abc").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(SimpleScore::of(-4).to_string(), "-4");
        assert_eq!(SimpleScore::of(-4).with_init_score(-2).to_string(), "-2init/-4");
    }
}

mod hard_soft_score {
    use super::*;

    #[test]
    fn test_hard_dominates_soft() {
        assert!(HardSoftScore::of(0, -1000) > HardSoftScore::of(-1, 0));
        assert!(HardSoftScore::of(-1, 5) > HardSoftScore::of(-1, 4));
    }

    #[test]
    fn test_feasibility() {
        assert!(HardSoftScore::of(0, -5).is_feasible());
        assert!(!HardSoftScore::of(-1, 5).is_feasible());
        assert!(!HardSoftScore::of(0, 0).with_init_score(-1).is_feasible());
    }

    #[test]
    fn test_arithmetic_carries_init_score() {
        let a = HardSoftScore::of(-1, -2).with_init_score(-1);
        let b = HardSoftScore::of(-3, 4).with_init_score(-2);

        let sum = a + b;
        assert_eq!(sum.init_score(), -3);
        assert_eq!(sum.hard(), -4);
        assert_eq!(sum.soft(), 2);
        assert_eq!((a - a), HardSoftScore::ZERO);
    }

    #[test]
    fn test_parse_round_trip_through_display() {
        let score = HardSoftScore::of(-2, -30).with_init_score(-4);
        assert_eq!(HardSoftScore::parse(&score.to_string_repr()).unwrap(), score);
        assert_eq!(
            HardSoftScore::parse("0hard/-5soft").unwrap(),
            HardSoftScore::of(0, -5)
        );
        assert!(HardSoftScore::parse("0hard").is_err());
        assert!(HardSoftScore::parse("0medium/1soft").is_err());
    }

    #[test]
    fn test_levels() {
        let score = HardSoftScore::of(-1, -9);
        assert_eq!(score.to_level_numbers(), vec![-1, -9]);
        assert_eq!(HardSoftScore::from_level_numbers(&[-1, -9]), score);
        assert_eq!(HardSoftScore::level_label(0), ScoreLevel::Hard);
        assert_eq!(HardSoftScore::levels_count(), 2);
    }
}
