#[cfg(test)]
mod tests {
    use crate::{
        Abf, AbfWriteSpec, AbfDataFormat, AbfVersion, OperationMode, sweep_label,
        write_abf1_file, write_abf2_file,
    };
    use approx::assert_relative_eq;
    use std::path::PathBuf;

    /// Two sweeps, two channels, ramp + scaled ramp values
    fn two_sweep_spec(samples: usize) -> AbfWriteSpec {
        let sweeps = (0..2)
            .map(|s| {
                vec![
                    (0..samples)
                        .map(|k| (s * samples + k) as f32 * 1e-3)
                        .collect(),
                    (0..samples).map(|k| k as f32 * -2e-3).collect(),
                ]
            })
            .collect();
        AbfWriteSpec::new(
            sweeps,
            vec!["Vm".to_string(), "Im".to_string()],
            vec!["mV".to_string(), "pA".to_string()],
        )
    }

    fn temp_abf(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        dir.path().join(name)
    }

    #[test]
    fn test_sweep_label_padding() {
        assert_eq!(sweep_label(1), "sweep001");
        assert_eq!(sweep_label(42), "sweep042");
        assert_eq!(sweep_label(999), "sweep999");
        // widens past 999 rather than truncating
        assert_eq!(sweep_label(1000), "sweep1000");
    }

    #[test]
    fn test_abf1_round_trip_int16() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_abf(&dir, "episodic.abf");
        let spec = two_sweep_spec(100);
        write_abf1_file(&path, &spec).unwrap();

        let abf = Abf::open(&path).unwrap();
        assert_eq!(abf.header.version, AbfVersion::V1);
        assert_eq!(abf.header.data_format, AbfDataFormat::Int16);
        assert_eq!(abf.n_sweeps(), 2);
        assert_eq!(abf.samples_per_sweep(), 100);
        assert_eq!(abf.channel_names(), vec!["Vm", "Im"]);
        assert_eq!(abf.channels[0].units.as_ref(), "mV");
        assert_eq!(abf.data_frame.height(), 200);

        // 2 channels at 50 µs multiplexed interval → 10 kHz per channel
        assert_relative_eq!(abf.sampling_rate(), 10_000.0, epsilon = 1.0);

        // int16 quantization step is range/resolution ≈ 0.3 mV at ±10 V
        let step = f64::from(10.0 / 32_768.0f32);
        let vm = abf.get_channel_f64("Vm").unwrap();
        assert_eq!(vm.len(), 200);
        for (k, &v) in vm.iter().enumerate() {
            assert_relative_eq!(v, k as f64 * 1e-3, epsilon = step);
        }
    }

    #[test]
    fn test_abf1_time_restarts_each_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_abf(&dir, "time.abf");
        write_abf1_file(&path, &two_sweep_spec(50)).unwrap();

        let abf = Abf::open(&path).unwrap();
        let time = abf.data_frame.column("time").unwrap().f32().unwrap();
        assert_relative_eq!(time.get(0).unwrap(), 0.0);
        // first sample of the second sweep restarts at zero
        assert_relative_eq!(time.get(50).unwrap(), 0.0);
        // 10 kHz per channel → 100 µs between samples
        assert_relative_eq!(time.get(1).unwrap(), 1e-4, epsilon = 1e-9);
    }

    #[test]
    fn test_abf1_gap_free_is_one_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_abf(&dir, "gapfree.abf");
        let mut spec = two_sweep_spec(80);
        spec.sweeps.truncate(1);
        spec.operation_mode = OperationMode::GapFree;
        write_abf1_file(&path, &spec).unwrap();

        let abf = Abf::open(&path).unwrap();
        assert_eq!(abf.protocol.operation_mode, OperationMode::GapFree);
        assert_eq!(abf.n_sweeps(), 1);
        assert_eq!(abf.sweep_labels(), vec!["sweep001"]);
        assert_eq!(abf.samples_per_sweep(), 80);
    }

    #[test]
    fn test_abf1_round_trip_float32_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_abf(&dir, "float.abf");
        let mut spec = two_sweep_spec(64);
        spec.data_format = AbfDataFormat::Float32;
        write_abf1_file(&path, &spec).unwrap();

        let abf = Abf::open(&path).unwrap();
        assert_eq!(abf.header.data_format, AbfDataFormat::Float32);
        let im = abf.get_channel_f64("Im").unwrap();
        // no quantization on the float path
        assert_relative_eq!(im[3], f64::from(3.0f32 * -2e-3), epsilon = 1e-12);
    }

    #[test]
    fn test_abf2_round_trip_with_guid() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_abf(&dir, "v2.abf");
        let guid = [7u8; 16];
        write_abf2_file(&path, &two_sweep_spec(100), Some(guid)).unwrap();

        let abf = Abf::open(&path).unwrap();
        assert_eq!(abf.header.version, AbfVersion::V2);
        assert_eq!(abf.n_sweeps(), 2);
        assert_eq!(abf.channel_names(), vec!["Vm", "Im"]);
        assert_eq!(abf.channels[1].units.as_ref(), "pA");
        assert_eq!(abf.guid, uuid::Uuid::from_bytes(guid).to_string());

        let step = f64::from(10.0 / 32_768.0f32);
        let im = abf.get_channel_f64("Im").unwrap();
        assert_relative_eq!(im[10], -0.02, epsilon = step);
    }

    #[test]
    fn test_abf2_without_guid_generates_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_abf(&dir, "v2_noguid.abf");
        write_abf2_file(&path, &two_sweep_spec(40), None).unwrap();

        let abf = Abf::open(&path).unwrap();
        assert!(abf.header.guid.is_none());
        // a v4 GUID is generated at load
        assert!(uuid::Uuid::parse_str(&abf.guid).is_ok());
    }

    #[test]
    fn test_sweep_frame_selects_one_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_abf(&dir, "frame.abf");
        write_abf1_file(&path, &two_sweep_spec(30)).unwrap();

        let abf = Abf::open(&path).unwrap();
        let frame = abf.sweep_frame("sweep002").unwrap();
        assert_eq!(frame.height(), 30);
        assert!(abf.sweep_frame("sweep007").is_err());
    }

    #[test]
    fn test_invalid_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_abf(&dir, "notanabf.csv");
        write_abf1_file(&path, &two_sweep_spec(10)).unwrap();
        assert!(Abf::open(&path).is_err());
    }

    #[test]
    fn test_bad_signature_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_abf(&dir, "bad.abf");
        std::fs::write(&path, b"RIFF definitely not an abf file").unwrap();
        let err = Abf::open(&path).unwrap_err();
        assert!(err.to_string().contains("signature"));
    }

    #[test]
    fn test_truncated_data_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_abf(&dir, "short.abf");
        write_abf1_file(&path, &two_sweep_spec(100)).unwrap();

        // chop off half the DATA section
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 200]).unwrap();
        let err = Abf::open(&path).unwrap_err();
        assert!(err.to_string().contains("Insufficient data"));
    }

    #[test]
    fn test_unknown_channel_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_abf(&dir, "chan.abf");
        write_abf1_file(&path, &two_sweep_spec(10)).unwrap();

        let abf = Abf::open(&path).unwrap();
        assert!(abf.get_channel_f64("Rs").is_err());
        assert!(abf.channel_map().contains_key("Vm"));
    }

    #[test]
    fn test_count_scaling_chain() {
        use crate::channel::AdcChannelBuilder;
        use crate::protocol::AcquisitionProtocol;

        let channel = AdcChannelBuilder::default()
            .adc_number(0i16)
            .channel_name("Vm")
            .units("mV")
            .instrument_scale_factor(0.02f32)
            .instrument_offset(1.0f32)
            .signal_gain(1.0f32)
            .signal_offset(0.25f32)
            .programmable_gain(2.0f32)
            .telegraph_enabled(true)
            .telegraph_gain(5.0f32)
            .build()
            .unwrap();
        let protocol = AcquisitionProtocol {
            operation_mode: OperationMode::Episodic,
            adc_sequence_interval_us: 100.0,
            n_channels: 1,
            samples_per_sweep: 10,
            sweep_count: 1,
            adc_range: 10.0,
            adc_resolution: 32_768,
        };

        // counts → volts step divided by the full gain chain
        let expected = (10.0 / 32_768.0) / (0.02 * 1.0 * 2.0 * 5.0);
        assert_relative_eq!(channel.count_scale(&protocol), expected);
        assert_relative_eq!(channel.count_offset(), 0.75);
    }

    #[test]
    fn test_info_json_summarizes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_abf(&dir, "info.abf");
        write_abf1_file(&path, &two_sweep_spec(10)).unwrap();

        let abf = Abf::open(&path).unwrap();
        let json = abf.info_json().unwrap();
        assert!(json.contains("\"n_sweeps\": 2"));
        assert!(json.contains("\"Vm\""));
        assert!(json.contains("sampling_rate_hz"));
    }
}
