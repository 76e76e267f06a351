use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use log::{error, warn};
use std::error::Error;
use std::fmt::Display;
use std::path::PathBuf;
use student_analytics::analytics::summarize_weekly_series;
use student_analytics::api::{start_api, AppState};
use student_analytics::data::{load_data, save_data, save_weekly_series};
use student_analytics::{charts, AppConfig, RiskPredictor, StudentAnalyzer, StudentDataGenerator};

#[derive(Parser, Debug)]
#[command(
    name = "student-analytics",
    version,
    about = "Student Performance Analytics & Prediction System"
)]
struct Cli {
    /// TOML file with pipeline settings
    #[arg(long, global = true, env = "STUDENT_ANALYTICS_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, global = true, env = "STUDENT_ANALYTICS_SEED")]
    seed: Option<u64>,

    /// Dataset CSV to write or read
    #[arg(long, global = true, env = "STUDENT_ANALYTICS_DATA")]
    input_file: Option<PathBuf>,

    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate synthetic student data
    Generate {
        #[arg(long)]
        n_students: Option<usize>,

        /// Also write a weekly series for this student id
        #[arg(long)]
        weekly_for: Option<String>,

        #[arg(long, default_value_t = 12)]
        weeks: u32,
    },
    /// Print every analysis section
    Analyze {
        #[arg(long)]
        threshold: Option<f64>,

        #[arg(long)]
        top: Option<usize>,
    },
    /// Train the risk prediction model and report its metrics
    Train {
        #[arg(long)]
        test_fraction: Option<f64>,
    },
    /// Render charts and their data to the output directory
    Visualize {
        /// Train a model first so feature importance is included
        #[arg(long)]
        with_importance: bool,
    },
    /// Serve the analysis over HTTP
    Serve {
        #[arg(long, env = "STUDENT_ANALYTICS_BIND")]
        bind: Option<String>,

        /// Skip model training; /predict will answer 503
        #[arg(long)]
        no_model: bool,
    },
}

fn configure_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn build_config(cli: &Cli) -> student_analytics::Result<AppConfig> {
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(path) = &cli.input_file {
        config.data_file = path.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    match &cli.command {
        Command::Generate { n_students: Some(n), .. } => config.n_students = *n,
        Command::Analyze { threshold, top } => {
            if let Some(threshold) = threshold {
                config.risk_threshold = *threshold;
            }
            if let Some(top) = top {
                config.top_n = *top;
            }
        }
        Command::Train { test_fraction: Some(fraction) } => config.test_fraction = *fraction,
        Command::Serve { bind: Some(bind), .. } => config.bind_address = bind.clone(),
        _ => {}
    }
    config.validate()?;
    Ok(config)
}

fn print_header(title: &str) {
    println!("\n{}", "=".repeat(50));
    println!("{}", title);
    println!("{}", "=".repeat(50));
}

/// Prints one report section; a failing section is reported and skipped.
fn section<T, E: Display>(title: &str, result: Result<T, E>, show: impl FnOnce(T)) {
    match result {
        Ok(value) => {
            println!("\n{}", title);
            show(value);
        }
        Err(e) => error!("{} unavailable: {}", title, e),
    }
}

fn generate(config: &AppConfig, weekly_for: Option<&str>, weeks: u32) -> Result<(), Box<dyn Error>> {
    println!("🚀 Generating data for {} students...", config.n_students);
    let mut generator = StudentDataGenerator::new(config.seed);
    let data = generator.generate_student_data(config.n_students)?;
    save_data(&config.data_file, &data)?;
    println!("Data saved to {}", config.data_file.display());

    if let Some(student_id) = weekly_for {
        let start = Utc::now().date_naive() - Duration::weeks(i64::from(weeks));
        let series = generator.generate_weekly_series(student_id, weeks, start)?;
        let path = config.data_file.with_file_name(format!("{}_weekly.csv", student_id));
        save_weekly_series(&path, &series)?;
        let trend = summarize_weekly_series(&series)?;
        println!(
            "Weekly series for {} saved to {} (trend: {:?}, change {:+.2})",
            student_id,
            path.display(),
            trend.overall_trend,
            trend.score_change
        );
    }
    Ok(())
}

fn analyze(config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let data = load_data(&config.data_file)?;
    let analyzer = StudentAnalyzer::new(&data);
    print_header("ANALYSIS RESULTS");

    section("📊 Summary Statistics:", analyzer.get_summary_statistics(), |stats| {
        println!("  total_students: {}", stats.total_students);
        println!("  at_risk_count: {}", stats.at_risk_count);
        println!("  at_risk_percentage: {}", stats.at_risk_percentage);
        println!("  avg_final_grade: {}", stats.avg_final_grade);
        println!("  avg_attendance: {}", stats.avg_attendance);
        println!("  avg_assignment_score: {}", stats.avg_assignment_score);
        println!("  avg_quiz_score: {}", stats.avg_quiz_score);
        println!("  total_forum_posts: {}", stats.total_forum_posts);
        println!("  avg_time_on_platform: {}", stats.avg_time_on_platform);
    });

    section(
        "⚠️  At-Risk Students:",
        analyzer.identify_at_risk_students(config.risk_threshold),
        |at_risk| {
            println!("  {} students (threshold {})", at_risk.len(), config.risk_threshold);
            for student in at_risk.iter().take(5) {
                println!(
                    "  {} {:<20} grade {:>6.2} attendance {:.2} [{}]",
                    student.record.student_id,
                    student.record.name,
                    student.record.final_grade,
                    student.record.attendance_rate,
                    student.factor_labels().join(", ")
                );
            }
        },
    );

    section(
        "🏆 Top Performers:",
        analyzer.get_top_performers(config.top_n),
        |top| {
            for student in top {
                println!(
                    "  {} {:<20} grade {:>6.2} attendance {:.2}",
                    student.student_id, student.name, student.final_grade, student.attendance_rate
                );
            }
        },
    );

    section(
        "🔗 Feature Correlations with Final Grade:",
        analyzer.calculate_correlations(),
        |correlations| {
            for entry in correlations {
                match entry.correlation {
                    Some(r) => println!("  {:<22} {:>7.3}", entry.feature, r),
                    None => println!("  {:<22} {:>7}", entry.feature, "NaN"),
                }
            }
        },
    );

    section(
        "📈 Performance Distribution:",
        analyzer.analyze_performance_distribution(),
        |dist| {
            println!("  excellent: {}", dist.excellent);
            println!("  good: {}", dist.good);
            println!("  satisfactory: {}", dist.satisfactory);
            println!("  poor: {}", dist.poor);
            println!("  mean: {}", dist.mean);
            println!("  median: {}", dist.median);
            match dist.std {
                Some(std) => println!("  std: {}", std),
                None => println!("  std: NaN"),
            }
            println!("  min: {}", dist.min);
            println!("  max: {}", dist.max);
        },
    );

    section("💬 Engagement:", analyzer.get_engagement_metrics(), |engagement| {
        println!("  avg_forum_posts: {}", engagement.avg_forum_posts);
        println!("  median_forum_posts: {}", engagement.median_forum_posts);
        println!("  highly_engaged: {}", engagement.highly_engaged);
        println!("  low_engagement: {}", engagement.low_engagement);
        println!("  avg_platform_time: {}", engagement.avg_platform_time);
    });
    Ok(())
}

fn train(config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let data = load_data(&config.data_file)?;
    print_header("TRAINING PREDICTION MODEL");

    let mut predictor = RiskPredictor::new();
    let metrics = predictor.train(&data, config.test_fraction, config.seed)?;

    println!("\n🤖 Model Performance:");
    println!("  Accuracy: {}", metrics.accuracy);
    println!("  Precision: {}", metrics.precision);
    println!("  Recall: {}", metrics.recall);
    println!("  F1-Score: {}", metrics.f1_score);
    println!("  Confusion matrix: {:?}", metrics.confusion_matrix);
    println!("  Train/test: {}/{}", metrics.train_size, metrics.test_size);

    println!("\n📊 Feature Importance:");
    for feature in predictor.feature_importance()? {
        println!("  {:<22} {:.3}", feature.feature, feature.importance);
    }
    Ok(())
}

fn visualize(config: &AppConfig, with_importance: bool) -> Result<(), Box<dyn Error>> {
    let data = load_data(&config.data_file)?;
    print_header("GENERATING VISUALIZATIONS");

    let importance = if with_importance {
        let mut predictor = RiskPredictor::new();
        match predictor
            .train(&data, config.test_fraction, config.seed)
            .and_then(|_| predictor.feature_importance())
        {
            Ok(importance) => Some(importance),
            Err(e) => {
                warn!("Skipping feature importance chart: {}", e);
                None
            }
        }
    } else {
        None
    };

    for path in charts::write_all(&data, importance.as_deref(), &config.output_dir)? {
        println!("✓ {}", path.display());
    }
    Ok(())
}

async fn serve(config: &AppConfig, no_model: bool) -> Result<(), Box<dyn Error>> {
    let data = load_data(&config.data_file)?;

    let predictor = if no_model {
        None
    } else {
        let mut predictor = RiskPredictor::new();
        match predictor.train(&data, config.test_fraction, config.seed) {
            Ok(metrics) => {
                println!("🎯 Model trained, accuracy {:.1}%", metrics.accuracy * 100.0);
                Some(predictor)
            }
            Err(e) => {
                warn!("Serving without a model: {}", e);
                None
            }
        }
    };

    let state = AppState {
        data,
        predictor,
        default_top_n: config.top_n,
    };
    println!("🌐 Visit http://{}/summary in your browser!", config.bind_address);
    start_api(state, &config.bind_address).await?;
    Ok(())
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    configure_logging(cli.verbose);
    let config = build_config(&cli)?;

    match &cli.command {
        Command::Generate { weekly_for, weeks, .. } => generate(&config, weekly_for.as_deref(), *weeks)?,
        Command::Analyze { .. } => analyze(&config)?,
        Command::Train { .. } => train(&config)?,
        Command::Visualize { with_importance } => visualize(&config, *with_importance)?,
        Command::Serve { no_model, .. } => serve(&config, *no_model).await?,
    }

    println!("\n✅ Done!");
    Ok(())
}
