//! Minimal end-to-end run: synthesize a recording, epoch it, summarize it.
//!
//! ```sh
//! cargo run --example basic_usage
//! ```

use ephys_abf::{Abf, AbfWriteSpec, write_abf1_file};
use ephys_epochs::{Bandwidth, create_epochs, epoch_density, epoch_histogram, epoch_periodogram};

fn main() -> anyhow::Result<()> {
    // 2 sweeps of a noisy 8 Hz membrane oscillation at 10 kHz
    let fs = 10_000.0f32;
    let sweeps: Vec<Vec<Vec<f32>>> = (0..2)
        .map(|s| {
            vec![
                (0..20_000)
                    .map(|k| {
                        let t = k as f32 / fs;
                        -0.055
                            + 0.004 * (2.0 * std::f32::consts::PI * 8.0 * t).sin()
                            + 0.0005 * ((k * 37 + s * 11) % 97) as f32 / 97.0
                    })
                    .collect(),
            ]
        })
        .collect();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("demo.abf");
    let mut spec = AbfWriteSpec::new(sweeps, vec!["Vm".to_string()], vec!["V".to_string()]);
    spec.adc_range = 1.0;
    write_abf1_file(&path, &spec)?;

    let abf = Abf::open(&path)?;
    println!(
        "opened {}: {} sweeps at {:.0} Hz",
        path.display(),
        abf.n_sweeps(),
        abf.sampling_rate()
    );

    // 1 s windows every 0.5 s
    let epochs = create_epochs(&abf.data_frame, 10_000, 5_000)?;
    println!("epoched into {} rows", epochs.height());

    let hist = epoch_histogram(&epochs, "Vm", -0.06, -0.05, 40)?;
    let kde = epoch_density(&epochs, "Vm", -0.06, -0.05, Some(128), Bandwidth::Scott)?;
    let psd = epoch_periodogram(&epochs, "Vm", abf.sampling_rate())?;
    println!(
        "histogram: {} rows, kde: {} rows, periodogram: {} rows",
        hist.height(),
        kde.height(),
        psd.height()
    );

    Ok(())
}
