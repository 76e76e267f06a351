use proptest::prelude::*;
use student_analytics::{StudentAnalyzer, StudentDataGenerator, StudentRecord};

fn generate(seed: u64, n: usize) -> Vec<StudentRecord> {
    StudentDataGenerator::new(seed).generate_student_data(n).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn same_seed_gives_same_dataset(seed in any::<u64>(), n in 1usize..500) {
        let first = generate(seed, n);
        prop_assert_eq!(first.len(), n);
        prop_assert_eq!(&first, &generate(seed, n));
    }

    #[test]
    fn generated_fields_stay_in_range(seed in any::<u64>(), n in 1usize..500) {
        for (i, s) in generate(seed, n).iter().enumerate() {
            prop_assert_eq!(&s.student_id, &format!("STU{:04}", i + 1));
            prop_assert!((0.5..=1.0).contains(&s.attendance_rate), "{:?}", s);
            prop_assert!((0.0..=100.0).contains(&s.avg_assignment_score), "{:?}", s);
            prop_assert!((0.0..=100.0).contains(&s.avg_quiz_score), "{:?}", s);
            prop_assert!((0.0..=100.0).contains(&s.final_grade), "{:?}", s);
            prop_assert!(s.time_on_platform >= 0.0, "{:?}", s);
            prop_assert!((18..30).contains(&s.age), "{:?}", s);
            prop_assert!(s.at_risk <= 1);
        }
    }

    #[test]
    fn final_grade_is_the_weighted_sum(seed in any::<u64>(), n in 1usize..500) {
        for s in generate(seed, n) {
            let expected = ((0.4 * s.avg_assignment_score
                + 0.4 * s.avg_quiz_score
                + 0.2 * s.attendance_rate * 100.0)
                * 100.0)
                .round()
                / 100.0;
            prop_assert_eq!(s.final_grade, expected, "{:?}", s);
        }
    }

    #[test]
    fn at_risk_label_matches_cutoffs(seed in any::<u64>(), n in 1usize..500) {
        for s in generate(seed, n) {
            let expected = s.final_grade < 60.0 || s.attendance_rate < 0.7;
            prop_assert_eq!(s.at_risk == 1, expected, "{:?}", s);
        }
    }

    #[test]
    fn buckets_cover_every_student(seed in any::<u64>(), n in 1usize..500) {
        let data = generate(seed, n);
        let dist = StudentAnalyzer::new(&data).analyze_performance_distribution().unwrap();
        prop_assert_eq!(dist.excellent + dist.good + dist.satisfactory + dist.poor, n);
        prop_assert!(dist.min <= dist.median && dist.median <= dist.max);
    }

    #[test]
    fn top_performers_length_is_bounded(
        seed in any::<u64>(),
        n in 1usize..500,
        top in 1usize..600,
    ) {
        let data = generate(seed, n);
        let ranked = StudentAnalyzer::new(&data).get_top_performers(top).unwrap();
        prop_assert_eq!(ranked.len(), top.min(n));
        prop_assert!(ranked.windows(2).all(|w| w[0].final_grade >= w[1].final_grade));
    }

    #[test]
    fn at_risk_list_is_sorted_and_qualifies(
        seed in any::<u64>(),
        n in 1usize..500,
        threshold in 0.0f64..100.0,
    ) {
        let data = generate(seed, n);
        let flagged = StudentAnalyzer::new(&data).identify_at_risk_students(threshold).unwrap();
        let expected = data
            .iter()
            .filter(|s| s.final_grade < threshold || s.attendance_rate < 0.7)
            .count();
        prop_assert_eq!(flagged.len(), expected);
        prop_assert!(flagged
            .windows(2)
            .all(|w| w[0].record.final_grade <= w[1].record.final_grade));
    }
}
