use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};
use student_analytics::generator::{final_grade_for, StudentDataGenerator};
use student_analytics::{AnalyticsError, StudentRecord};

fn generate(seed: u64, n: usize) -> Vec<StudentRecord> {
    StudentDataGenerator::new(seed).generate_student_data(n).unwrap()
}

#[test]
fn test_injected_rng_matches_seeded_constructor() {
    let injected = StudentDataGenerator::from_rng(StdRng::seed_from_u64(5))
        .generate_student_data(30)
        .unwrap();
    assert_eq!(injected, generate(5, 30));
}

fn clipped_mean(rng: &mut StdRng, draws: usize, mean: f64, std_dev: f64) -> f64 {
    let normal = Normal::new(mean, std_dev).unwrap();
    (0..draws)
        .map(|_| normal.sample(rng).clamp(0.0, 100.0))
        .sum::<f64>()
        / draws as f64
}

fn poisson(rng: &mut StdRng, rate: f64) -> u32 {
    if rate <= 0.0 {
        return 0;
    }
    let draw: f64 = Poisson::new(rate).unwrap().sample(rng);
    draw as u32
}

#[test]
fn test_first_student_follows_documented_draw_order() {
    let mut rng = StdRng::seed_from_u64(42);
    let attendance: f64 = rng.gen_range(0.5..1.0);
    let assignments = clipped_mean(&mut rng, 10, attendance * 85.0, 15.0);
    let quizzes = clipped_mean(&mut rng, 5, attendance * 80.0, 20.0);
    let forum_posts = poisson(&mut rng, attendance * 10.0);
    let platform_time = Normal::new(attendance * 8.0, 3.0).unwrap().sample(&mut rng).max(0.0);
    let late = poisson(&mut rng, (1.0 - attendance) * 3.0);
    let age: u32 = rng.gen_range(18..30);

    let round2 = |v: f64| (v * 100.0).round() / 100.0;
    let student = &generate(42, 1)[0];

    assert_eq!(student.student_id, "STU0001");
    assert_eq!(student.attendance_rate, round2(attendance));
    assert_eq!(student.avg_assignment_score, round2(assignments));
    assert_eq!(student.avg_quiz_score, round2(quizzes));
    assert_eq!(student.forum_posts, forum_posts);
    assert_eq!(student.time_on_platform, round2(platform_time));
    assert_eq!(student.n_late_submissions, late);
    assert_eq!(student.age, age);
    assert_eq!(
        student.final_grade,
        final_grade_for(round2(assignments), round2(quizzes), round2(attendance))
    );
}

#[test]
fn test_different_seeds_differ() {
    assert_ne!(generate(1, 20), generate(2, 20));
}

#[test]
fn test_reference_cohort_of_fifty() {
    let first = generate(42, 50);
    let second = generate(42, 50);

    assert_eq!(first.len(), 50);
    for (i, (a, b)) in first.iter().zip(&second).enumerate() {
        assert_eq!(a.student_id, format!("STU{:04}", i + 1));
        assert_eq!(a.student_id, b.student_id);
        assert_eq!(a.final_grade.to_bits(), b.final_grade.to_bits());
    }
    assert_eq!(first[0].student_id, "STU0001");
    assert_eq!(first[49].student_id, "STU0050");
}

#[test]
fn test_stored_values_have_two_decimals() {
    for s in generate(42, 100) {
        for value in [
            s.attendance_rate,
            s.avg_assignment_score,
            s.avg_quiz_score,
            s.time_on_platform,
            s.final_grade,
        ] {
            assert_eq!(value, (value * 100.0).round() / 100.0);
        }
    }
}

#[test]
fn test_attendance_drives_scores() {
    let data = generate(42, 2000);
    let (high, low): (Vec<&StudentRecord>, Vec<&StudentRecord>) =
        data.iter().partition(|s| s.attendance_rate >= 0.75);
    fn avg(group: &[&StudentRecord], f: impl Fn(&StudentRecord) -> f64) -> f64 {
        group.iter().map(|&s| f(s)).sum::<f64>() / group.len() as f64
    }

    assert!(avg(&high[..], |s| s.avg_assignment_score) > avg(&low[..], |s| s.avg_assignment_score));
    assert!(avg(&high[..], |s| s.forum_posts as f64) > avg(&low[..], |s| s.forum_posts as f64));
    assert!(avg(&high[..], |s| s.n_late_submissions as f64) < avg(&low[..], |s| s.n_late_submissions as f64));
}

#[test]
fn test_invalid_count() {
    let result = StudentDataGenerator::new(42).generate_student_data(0);
    assert!(matches!(result, Err(AnalyticsError::InvalidArgument(_))));
}
