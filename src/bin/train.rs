//! DNF-SOM training binary.
//!
//! Runs the attention-modulated map-formation experiment: loads (or
//! initializes) a weight map and receptor layout, precomputes the
//! stimulus banks, then trains epoch by epoch. Writes JSONL metrics and
//! periodic weight-map snapshots under the output directory.

use clap::Parser;
use dnf_som::checkpoint::{
    load_layout, load_snapshot, save_layout, save_snapshot, MapSnapshot, ReceptorLayout,
};
use dnf_som::data::receptors::ReceptorSheet;
use dnf_som::data::samples::StimulusBank;
use dnf_som::{SimulationConfig, Trainer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "dnf-som-train",
    about = "Train a dynamic-neural-field topographic map with attentional gain modulation"
)]
struct Args {
    /// Pretrained weight-map snapshot to start from (fresh random map if omitted)
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Receptor layout file (regenerated and saved if omitted)
    #[arg(long)]
    receptors: Option<PathBuf>,

    /// Output directory for snapshots and the receptor layout
    #[arg(long, default_value = "data/ltgm")]
    out_dir: PathBuf,

    /// Output metrics file (JSONL)
    #[arg(long, default_value = "data/ltgm/metrics.jsonl")]
    metrics_file: PathBuf,

    /// Number of training epochs
    #[arg(long, default_value_t = 35000)]
    epochs: usize,

    /// Save a weight-map snapshot every N epochs
    #[arg(long, default_value_t = 1000)]
    snapshot_every: usize,

    /// Print a progress line every N epochs
    #[arg(long, default_value_t = 50)]
    report_every: usize,

    /// Field grid side n
    #[arg(long, default_value_t = 32)]
    field_size: usize,

    /// Receptor grid side Rn
    #[arg(long, default_value_t = 16)]
    receptor_size: usize,

    /// Learning rate
    #[arg(long, default_value_t = 0.4)]
    lrate: f64,

    /// Present a region-of-interest stimulus every N epochs
    #[arg(long, default_value_t = 2)]
    roi_frequency: usize,

    /// RNG seed
    #[arg(long, default_value_t = 137)]
    seed: u64,
}

fn main() {
    let args = Args::parse();

    let base = 960.0 / (args.field_size * args.field_size) as f64;
    let config = SimulationConfig {
        field_size: args.field_size,
        receptor_size: args.receptor_size,
        epochs: args.epochs,
        lrate: args.lrate,
        roi_frequency: args.roi_frequency,
        seed: args.seed,
        excit_strength: base * 3.72,
        inhib_strength: base * 2.40,
        excit_strength_attn: base * 8.00,
        inhib_strength_attn: base * 6.10,
        ..SimulationConfig::default()
    };
    config.validate().expect("Invalid configuration");

    fs::create_dir_all(&args.out_dir).expect("Failed to create output directory");
    if let Some(parent) = args.metrics_file.parent() {
        fs::create_dir_all(parent).expect("Failed to create metrics output directory");
    }

    let mut rng = StdRng::seed_from_u64(config.seed);

    // Receptor layout: reload to stay consistent with a pretrained map,
    // otherwise draw a fresh jittered grid and persist it.
    let sheet = match &args.receptors {
        Some(path) => {
            eprintln!("Loading receptor layout: {}", path.display());
            load_layout(path)
                .and_then(|layout| layout.into_sheet())
                .expect("Failed to load receptor layout")
        }
        None => {
            let sheet =
                ReceptorSheet::regular(config.receptor_size, config.receptor_noise, &mut rng);
            let path = args.out_dir.join("receptors.json");
            save_layout(&ReceptorLayout::from_sheet(&sheet), &path)
                .expect("Failed to save receptor layout");
            eprintln!("Receptor layout saved: {}", path.display());
            sheet
        }
    };
    assert_eq!(
        sheet.side(),
        config.receptor_size,
        "receptor layout side does not match --receptor-size"
    );

    eprintln!("Generating {} stimulus pairs...", config.epochs);
    let bank = StimulusBank::generate(&sheet, config.epochs, config.stimulus_extent, &mut rng);
    let attended = bank.attended.iter().filter(|&&m| m).count();

    let mut trainer = Trainer::with_rng(config.clone(), rng).expect("Failed to build trainer");

    let mut map = match &args.weights {
        Some(path) => {
            eprintln!("Loading pretrained map: {}", path.display());
            let snapshot = load_snapshot(path).expect("Failed to load weight map");
            assert_eq!(snapshot.field_size, config.field_size, "field size mismatch");
            assert_eq!(
                snapshot.receptor_size, config.receptor_size,
                "receptor size mismatch"
            );
            snapshot.weights
        }
        None => trainer.fresh_map(),
    };

    let mut metrics_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.metrics_file)
        .expect("Failed to open metrics file");

    eprintln!("DNF-SOM Training");
    eprintln!(
        "  Net size: {}x{}x{}x{}",
        config.field_size, config.field_size, config.receptor_size, config.receptor_size
    );
    eprintln!(
        "  Ke: {:.3} sigma_e: {:.3}  Ki: {:.3} sigma_i: {:.3}",
        config.excit_strength, config.excit_extent, config.inhib_strength, config.inhib_extent
    );
    eprintln!(
        "  Ke_a: {:.3}  Ki_a: {:.3}",
        config.excit_strength_attn, config.inhib_strength_attn
    );
    eprintln!(
        "  Time: {:.3} dt: {:.3} tau: {:.3}",
        config.duration, config.dt, config.tau
    );
    eprintln!("  Lrate: {:.3}  RoI period: {}", config.lrate, config.roi_frequency);
    eprintln!(
        "  Noise: {:.3}  Epochs: {}  (attended epochs: {})",
        config.receptor_noise, config.epochs, attended
    );
    eprintln!("  Output: {}", args.out_dir.display());
    eprintln!();

    let run_start = Instant::now();
    let mut attention_epochs = 0usize;

    for epoch in 0..config.epochs {
        let report = match trainer.train_epoch(&mut map, &bank, epoch) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("Epoch {} failed: {e}", epoch);
                std::process::exit(1);
            }
        };
        if report.kernel == dnf_som::KernelVariant::Attentional {
            attention_epochs += 1;
        }

        writeln!(
            metrics_file,
            "{}",
            serde_json::json!({
                "type": "epoch",
                "epoch": report.epoch,
                "kernel": report.kernel,
                "focused": report.focused,
                "peak_excitation": report.peak_excitation,
                "mean_drive": report.mean_drive,
                "active_units": report.active_units,
            })
        )
        .expect("Failed to write metrics");

        if epoch % args.report_every == 0 {
            eprintln!(
                "Epoch {:6} | peak Le: {:.4} | drive: {:.4} | active: {:4} | {:.1}s",
                epoch,
                report.peak_excitation,
                report.mean_drive,
                report.active_units,
                run_start.elapsed().as_secs_f32()
            );
        }

        if args.snapshot_every > 0 && epoch > 0 && epoch % args.snapshot_every == 0 {
            let path = args.out_dir.join(format!("weights_{:06}.json", epoch));
            let snapshot = MapSnapshot {
                epoch,
                field_size: config.field_size,
                receptor_size: config.receptor_size,
                weights: map.clone(),
            };
            match save_snapshot(&snapshot, &path) {
                Ok(()) => {
                    metrics_file.flush().expect("Failed to flush metrics");
                    eprintln!("  Snapshot saved: {}", path.display());
                }
                Err(e) => eprintln!("  Warning: snapshot save failed: {e}"),
            }
        }
    }

    let final_path = args.out_dir.join(format!("weights_{:06}.json", config.epochs));
    let snapshot = MapSnapshot {
        epoch: config.epochs,
        field_size: config.field_size,
        receptor_size: config.receptor_size,
        weights: map,
    };
    save_snapshot(&snapshot, &final_path).expect("Failed to save final snapshot");
    metrics_file.flush().expect("Failed to flush metrics");

    eprintln!(
        "\nTraining complete in {:.1}s. Attention: {} Normal: {}",
        run_start.elapsed().as_secs_f32(),
        attention_epochs,
        config.epochs - attention_epochs
    );
    eprintln!("Final snapshot: {}", final_path.display());
}
