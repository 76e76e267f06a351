//! Synthetic student data.
//!
//! Every draw goes through the one RNG owned by [`StudentDataGenerator`], so a
//! fixed seed reproduces a dataset exactly. Per student the draws happen in
//! this order: attendance, 10 assignment scores, 5 quiz scores, forum posts,
//! platform time, late submissions, then age and name.

use crate::error::{AnalyticsError, Result};
use crate::record::{round2, student_id, Dataset, StudentRecord};
use crate::risk::at_risk_label;
use chrono::{Duration, NaiveDate};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEED: u64 = 42;

/// Largest dataset whose ids still fit the four-digit `STU` format.
pub const MAX_STUDENTS: usize = 9999;

const N_ASSIGNMENTS: usize = 10;
const N_QUIZZES: usize = 5;

const FIRST_NAMES: [&str; 16] = [
    "Denis", "Saitoti", "Kukutia", "Kirionki", "David", "Amina", "Grace", "Brian",
    "Wanjiru", "Otieno", "Faith", "Kevin", "Mercy", "Samuel", "Joy", "Peter",
];

const LAST_NAMES: [&str; 16] = [
    "Lemayian", "Smith", "Johnson", "Williams", "Lemoita", "Kamau", "Achieng", "Mutua",
    "Njoroge", "Wambui", "Kiprop", "Brown", "Ochieng", "Chebet", "Mwangi", "Davis",
];

/// One week of a single student's activity.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeeklyRecord {
    pub student_id: String,
    pub week: u32,
    pub date: NaiveDate,
    pub weekly_score: f64,
    pub hours_studied: f64,
    pub assignments_completed: u32,
}

/// Weighted final grade from the stored (already rounded) component values.
pub fn final_grade_for(avg_assignment_score: f64, avg_quiz_score: f64, attendance_rate: f64) -> f64 {
    round2(0.4 * avg_assignment_score + 0.4 * avg_quiz_score + 0.2 * attendance_rate * 100.0)
}

pub struct StudentDataGenerator<R = StdRng> {
    rng: R,
}

impl StudentDataGenerator<StdRng> {
    pub fn new(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for StudentDataGenerator<StdRng> {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl<R: Rng> StudentDataGenerator<R> {
    /// Wraps an already-built random source, e.g. a fixed test RNG.
    pub fn from_rng(rng: R) -> Self {
        StudentDataGenerator { rng }
    }

    /// Builds `n_students` records numbered `STU0001` upwards.
    pub fn generate_student_data(&mut self, n_students: usize) -> Result<Dataset> {
        if n_students == 0 {
            return Err(AnalyticsError::invalid("number of students must be positive"));
        }
        if n_students > MAX_STUDENTS {
            return Err(AnalyticsError::invalid(format!(
                "at most {} students fit the STU0000 id format, got {}",
                MAX_STUDENTS, n_students
            )));
        }

        let mut students = Vec::with_capacity(n_students);
        for sequence in 1..=n_students {
            students.push(self.generate_record(sequence)?);
        }

        let at_risk = students.iter().filter(|s| s.is_labelled_at_risk()).count();
        debug!("Generated {} students ({} labelled at risk)", students.len(), at_risk);
        Ok(students)
    }

    /// Draws the latent attendance rate, then the rest of the record.
    pub fn generate_record(&mut self, sequence: usize) -> Result<StudentRecord> {
        let attendance: f64 = self.rng.gen_range(0.5..1.0);
        self.record_from_attendance(sequence, attendance)
    }

    /// Generates every field that depends on `attendance`.
    pub fn record_from_attendance(&mut self, sequence: usize, attendance: f64) -> Result<StudentRecord> {
        let assignment_mean = self.mean_clipped_score(N_ASSIGNMENTS, attendance * 85.0, 15.0)?;
        let quiz_mean = self.mean_clipped_score(N_QUIZZES, attendance * 80.0, 20.0)?;
        let forum_posts = self.poisson(attendance * 10.0)?;
        let platform_time = self.normal(attendance * 8.0, 3.0)?.max(0.0);
        let n_late_submissions = self.poisson(((1.0 - attendance) * 3.0).max(0.0))?;
        let age = self.rng.gen_range(18..30);
        let name = self.name();

        let attendance_rate = round2(attendance);
        let avg_assignment_score = round2(assignment_mean);
        let avg_quiz_score = round2(quiz_mean);
        let final_grade = final_grade_for(avg_assignment_score, avg_quiz_score, attendance_rate);

        Ok(StudentRecord {
            student_id: student_id(sequence),
            name,
            age,
            attendance_rate,
            avg_assignment_score,
            avg_quiz_score,
            forum_posts,
            time_on_platform: round2(platform_time),
            n_late_submissions,
            final_grade,
            at_risk: at_risk_label(final_grade, attendance_rate),
        })
    }

    /// Weekly scores drifting around a per-student base with a linear trend.
    pub fn generate_weekly_series(
        &mut self,
        student_id: &str,
        weeks: u32,
        start: NaiveDate,
    ) -> Result<Vec<WeeklyRecord>> {
        if weeks == 0 {
            return Err(AnalyticsError::invalid("weeks must be positive"));
        }

        let base: f64 = self.rng.gen_range(60.0..90.0);
        let trend: f64 = self.rng.gen_range(-1.0..1.0);

        let mut series = Vec::with_capacity(weeks as usize);
        for week in 0..weeks {
            let performance = base + trend * week as f64 + self.normal(0.0, 5.0)?;
            let hours = self.normal(8.0, 2.0)?;
            series.push(WeeklyRecord {
                student_id: student_id.to_string(),
                week: week + 1,
                date: start + Duration::weeks(i64::from(week)),
                weekly_score: round2(performance.clamp(0.0, 100.0)),
                hours_studied: round2(hours.max(0.0)),
                assignments_completed: self.rng.gen_range(0..4),
            });
        }
        Ok(series)
    }

    fn mean_clipped_score(&mut self, draws: usize, mean: f64, std_dev: f64) -> Result<f64> {
        let normal = normal_dist(mean, std_dev)?;
        let total: f64 = (0..draws)
            .map(|_| normal.sample(&mut self.rng).clamp(0.0, 100.0))
            .sum();
        Ok(total / draws as f64)
    }

    fn normal(&mut self, mean: f64, std_dev: f64) -> Result<f64> {
        Ok(normal_dist(mean, std_dev)?.sample(&mut self.rng))
    }

    fn poisson(&mut self, rate: f64) -> Result<u32> {
        // rand_distr rejects a zero rate; the distribution is then a point mass at 0.
        if rate <= 0.0 {
            return Ok(0);
        }
        let poisson = Poisson::new(rate)
            .map_err(|e| AnalyticsError::invalid(format!("poisson rate {}: {}", rate, e)))?;
        let draw: f64 = poisson.sample(&mut self.rng);
        Ok(draw as u32)
    }

    fn name(&mut self) -> String {
        let first = FIRST_NAMES[self.rng.gen_range(0..FIRST_NAMES.len())];
        let last = LAST_NAMES[self.rng.gen_range(0..LAST_NAMES.len())];
        format!("{} {}", first, last)
    }
}

fn normal_dist(mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    Normal::new(mean, std_dev)
        .map_err(|e| AnalyticsError::invalid(format!("normal({}, {}): {}", mean, std_dev, e)))
}
