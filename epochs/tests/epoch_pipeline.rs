//! End-to-end pipeline tests: synthetic ABF file → long table → epochs →
//! per-epoch statistics.

use ephys_abf::{Abf, AbfWriteSpec, write_abf1_file};
use ephys_epochs::{
    Bandwidth, SweepSource, create_epochs, epoch_density, epoch_histogram, epoch_periodogram,
    epoch_source, step_window, sweep_channel_matrix,
};

/// 3 sweeps × 1 channel of a 40 Hz tone around -50 mV, 10 kHz sampling
fn tone_file(dir: &tempfile::TempDir) -> Abf {
    let fs = 10_000.0f32;
    let sweeps: Vec<Vec<Vec<f32>>> = (0..3)
        .map(|_| {
            vec![
                (0..4000)
                    .map(|k| {
                        -0.050 + 0.005 * (2.0 * std::f32::consts::PI * 40.0 * k as f32 / fs).sin()
                    })
                    .collect(),
            ]
        })
        .collect();
    let mut spec = AbfWriteSpec::new(sweeps, vec!["Vm".to_string()], vec!["V".to_string()]);
    spec.adc_range = 1.0; // tighten the ADC step so the tone survives quantization
    let path = dir.path().join("tone.abf");
    write_abf1_file(&path, &spec).unwrap();
    Abf::open(&path).unwrap()
}

#[test]
fn epoching_a_recording_preserves_sweep_structure() {
    let dir = tempfile::tempdir().unwrap();
    let abf = tone_file(&dir);

    let epochs = epoch_source(&abf, 1000, 500).unwrap();
    // 1 + (4000 - 1000) / 500 = 7 epochs per sweep
    assert_eq!(epochs.height(), 3 * 7 * 1000);

    let labels = epochs.column("epoch").unwrap().str().unwrap();
    assert_eq!(labels.get(0).unwrap(), "epoch001");
    assert_eq!(labels.get(6999).unwrap(), "epoch007");
}

#[test]
fn histogram_concentrates_around_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let abf = tone_file(&dir);

    let epochs = create_epochs(&abf.data_frame, 2000, 2000).unwrap();
    let hist = epoch_histogram(&epochs, "Vm", -0.06, -0.04, 20).unwrap();

    // 3 sweeps × 2 epochs × 20 bins
    assert_eq!(hist.height(), 120);

    // every sample of every epoch lies within the ±5 mV tone band
    let counts = hist.column("count").unwrap().f64().unwrap();
    let per_epoch: f64 = counts.into_iter().flatten().take(20).sum();
    assert_eq!(per_epoch as usize, 2000);
}

#[test]
fn density_grids_are_shared_across_epochs() {
    let dir = tempfile::tempdir().unwrap();
    let abf = tone_file(&dir);

    let epochs = create_epochs(&abf.data_frame, 2000, 1000).unwrap();
    let kde = epoch_density(&epochs, "Vm", -0.06, -0.04, Some(64), Bandwidth::Silverman).unwrap();

    let x = kde.column("x").unwrap().f64().unwrap();
    // first grid point of the first two epochs coincide
    assert_eq!(x.get(0), x.get(64));
    assert_eq!(kde.height() % 64, 0);
}

#[test]
fn periodogram_recovers_the_stimulus_tone() {
    let dir = tempfile::tempdir().unwrap();
    let abf = tone_file(&dir);

    let epochs = create_epochs(&abf.data_frame, 2000, 2000).unwrap();
    let psd = epoch_periodogram(&epochs, "Vm", abf.sampling_rate()).unwrap();

    // pick the strongest non-DC bin of the first epoch
    let freq = psd.column("frequency").unwrap().f64().unwrap();
    let power = psd.column("power").unwrap().f64().unwrap();
    let (mut best_k, mut best_p) = (0usize, f64::MIN);
    for k in 1..1001 {
        let p = power.get(k).unwrap();
        if p > best_p {
            best_p = p;
            best_k = k;
        }
    }
    assert!((freq.get(best_k).unwrap() - 40.0).abs() < 5.1);
}

#[test]
fn array_and_table_paths_agree() {
    let dir = tempfile::tempdir().unwrap();
    let abf = tone_file(&dir);

    let sweep = abf.sweep_frame("sweep001").unwrap();
    let matrix = sweep_channel_matrix(&sweep, &["Vm"]).unwrap();
    let windows = step_window(&matrix, 1000, 500).unwrap();

    let epochs = create_epochs(&sweep, 1000, 500).unwrap();
    assert_eq!(windows.shape()[0] * windows.shape()[1], epochs.height());

    // first value of the second window matches the table's epoch002 block
    let vm = epochs.column("Vm").unwrap().f32().unwrap();
    let table_value = f64::from(vm.get(1000).unwrap());
    assert!((windows[[1, 0, 0]] - table_value).abs() < 1e-9);
}

#[test]
fn sweep_source_exposes_recording_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let abf = tone_file(&dir);

    assert_eq!(SweepSource::channel_names(&abf), vec!["Vm"]);
    assert!((SweepSource::sampling_rate(&abf) - 10_000.0).abs() < 1.0);
    assert_eq!(SweepSource::sweep_table(&abf).height(), 12_000);
}
