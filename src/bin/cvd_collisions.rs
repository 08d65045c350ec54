#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{error::Error, path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use cvd_collisions::{
    delta_stats_par, load_lab_image, run_many_par, simulate_rgbimage_par, ClusterCount,
    CollisionPipeline, CvdSimulation, Deficiency, KmeansOptions, LabImage, Severity,
};
use log::info;

#[derive(Args, Clone, Copy)]
struct Simulation {
    /// The deficiency to simulate: protan, deutan or tritan (also reduced-red/green/blue).
    #[arg(long, default_value = "reduced-green", value_parser = parse_deficiency)]
    cvd: Deficiency,

    /// The severity of the deficiency, from 0.0 to 1.0.
    #[arg(long, default_value_t = Severity::FULL, value_parser = parse_severity)]
    severity: Severity,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a palette and report which colors collide under the deficiency.
    Analyze {
        image: PathBuf,

        #[arg(short, long, default_value_t = ClusterCount::default(), value_parser = parse_cluster_count)]
        k: ClusterCount,

        #[command(flatten)]
        simulation: Simulation,

        /// The CIEDE2000 distance below which two simulated colors collide.
        #[arg(long, default_value_t = 8.0)]
        threshold: f32,

        #[arg(long, default_value_t = 50_000)]
        max_samples: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value_t = 5)]
        attempts: u32,

        #[arg(short, long, default_value_t = 0)]
        threads: u8,

        /// Analyze protan, deutan and tritan at the given severity.
        #[arg(long)]
        all_deficiencies: bool,
    },
    /// Write a copy of an image as it appears under the deficiency.
    Simulate {
        input: PathBuf,

        output: PathBuf,

        #[command(flatten)]
        simulation: Simulation,
    },
    /// Print per-pixel ΔE2000 statistics between an image and its simulated version.
    Delta {
        input: PathBuf,

        #[command(flatten)]
        simulation: Simulation,
    },
}

#[derive(Parser)]
#[command(version, about)]
struct Options {
    /// Log debug output and stage timings.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn parse_cluster_count(s: &str) -> Result<ClusterCount, String> {
    let value: u16 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn parse_deficiency(s: &str) -> Result<Deficiency, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn main() -> ExitCode {
    let Options { verbose, command } = Options::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "warn" }),
    )
    .init();

    match run(command, verbose) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, verbose: bool) -> Result<(), Box<dyn Error>> {
    macro_rules! log {
        ($name: literal, $val: expr) => {
            if verbose {
                let time = std::time::Instant::now();
                let value = $val;
                info!("{} took {}ms", $name, time.elapsed().as_millis());
                value
            } else {
                $val
            }
        };
    }

    match command {
        Command::Analyze {
            image,
            k,
            simulation: Simulation { cvd, severity },
            threshold,
            max_samples,
            seed,
            attempts,
            threads,
            all_deficiencies,
        } => {
            let image = log!("read image", load_lab_image(image)?);

            let pipeline = CollisionPipeline::new(&image)
                .cluster_count(k)
                .deficiency(cvd)
                .severity(severity)
                .threshold(threshold)
                .max_samples(max_samples)
                .seed(seed)
                .kmeans_options(KmeansOptions::new().attempts(attempts));

            let pipelines = if all_deficiencies {
                Deficiency::ALL
                    .iter()
                    .map(|&deficiency| pipeline.deficiency(deficiency))
                    .collect()
            } else {
                vec![pipeline]
            };

            let results = log!(
                "analysis",
                match threads {
                    0 => run_many_par(&pipelines),
                    1 => pipelines.iter().map(CollisionPipeline::run).collect(),
                    t => {
                        let pool = rayon::ThreadPoolBuilder::new()
                            .num_threads(t.into())
                            .build()?;

                        pool.install(|| run_many_par(&pipelines))
                    }
                }
            );

            for (i, result) in results.into_iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print!("{}", result?.report());
            }
        }
        Command::Simulate { input, output, simulation: Simulation { cvd, severity } } => {
            let image = log!("read image", image::open(input)?.into_rgb8());
            let simulation = CvdSimulation::new(cvd, severity);
            let simulated = log!("simulation", simulate_rgbimage_par(&image, &simulation));
            log!("write image", simulated.save(output)?);
        }
        Command::Delta { input, simulation: Simulation { cvd, severity } } => {
            let image = log!("read image", image::open(input)?.into_rgb8());
            let simulation = CvdSimulation::new(cvd, severity);
            let simulated = log!("simulation", simulate_rgbimage_par(&image, &simulation));

            let original = LabImage::from_rgbimage_par(&image)?;
            let simulated = LabImage::from_rgbimage_par(&simulated)?;
            let stats = log!("delta", delta_stats_par(&original, &simulated)?);

            println!("CVD: {cvd}, severity: {severity}");
            println!(
                "ΔE2000 per pixel: mean {:.2}, max {:.2}, min {:.2}",
                stats.mean, stats.max, stats.min
            );
        }
    }

    Ok(())
}
