#[cfg(test)]
mod tests {
    use crate::config::{BenchConfig, Isolation, Overrides};
    use crate::workload::{MAX_READ_SIZE, WorkloadKind, WorkloadSpec};
    use anyhow::Result;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_match_stock_comparison() {
        let config = BenchConfig::default();
        assert_eq!(config.isolation, Isolation::Process);
        assert_eq!(config.io.cycles, 1_000);
        assert_eq!(config.io.read_size, 4 * 65_535);
        assert_eq!(config.io.source, PathBuf::from("/dev/urandom"));
        assert_eq!(config.cpu.cycles, 1_000_000);
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() -> Result<()> {
        let config = BenchConfig::from_toml_str(
            r#"
                isolation = "thread"

                [cpu]
                cycles = 500
            "#,
        )?;
        assert_eq!(config.isolation, Isolation::Thread);
        assert_eq!(config.cpu.cycles, 500);
        assert_eq!(config.io.cycles, 1_000);
        Ok(())
    }

    #[test]
    fn test_yaml_config() -> Result<()> {
        let config = BenchConfig::from_yaml_str("io:\n  cycles: 3\n  source: /tmp/rand\n")?;
        assert_eq!(config.io.cycles, 3);
        assert_eq!(config.io.source, PathBuf::from("/tmp/rand"));
        assert_eq!(config.io.read_size, 4 * 65_535);
        assert_eq!(BenchConfig::from_yaml_str("  \n")?, BenchConfig::default());
        Ok(())
    }

    #[test]
    fn test_unknown_isolation_is_rejected() {
        assert!(BenchConfig::from_toml_str("isolation = \"fiber\"").is_err());
        assert!(BenchConfig::from_yaml_str("isolation: fiber").is_err());
    }

    #[test]
    fn test_load_dispatches_on_extension() -> Result<()> {
        let dir = tempfile::tempdir()?;

        let yaml_path = dir.path().join("bench.yml");
        let mut file = std::fs::File::create(&yaml_path)?;
        writeln!(file, "cpu:\n  cycles: 77")?;
        assert_eq!(BenchConfig::load(&yaml_path)?.cpu.cycles, 77);

        let toml_path = dir.path().join("bench.toml");
        std::fs::write(&toml_path, "[cpu]\ncycles = 78\n")?;
        assert_eq!(BenchConfig::load(&toml_path)?.cpu.cycles, 78);

        let err = BenchConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("read config"));
        Ok(())
    }

    #[test]
    fn test_overrides_apply_to_selected_workload_only() -> Result<()> {
        let mut config = BenchConfig::default();
        let overrides = Overrides {
            cycles: Some(9),
            read_size: Some(32),
            source: Some(PathBuf::from("/tmp/r")),
            isolation: Some(Isolation::Thread),
        };
        config.apply(WorkloadKind::Io, &overrides)?;
        assert_eq!(config.io.cycles, 9);
        assert_eq!(config.io.read_size, 32);
        assert_eq!(config.cpu.cycles, 1_000_000);
        assert_eq!(config.isolation, Isolation::Thread);
        assert_eq!(
            config.workload(WorkloadKind::Io),
            WorkloadSpec::Io {
                cycles: 9,
                read_size: 32,
                source: PathBuf::from("/tmp/r"),
            }
        );
        Ok(())
    }

    #[test]
    fn test_io_only_overrides_rejected_for_cpu() {
        let mut config = BenchConfig::default();
        let overrides = Overrides {
            read_size: Some(32),
            ..Overrides::default()
        };
        let err = config.apply(WorkloadKind::Cpu, &overrides).unwrap_err();
        assert!(err.to_string().contains("only apply to the io workload"));
    }

    #[test]
    fn test_validate_rejects_zero_read_size_and_empty_source() {
        let mut config = BenchConfig::default();
        config.io.read_size = 0;
        assert!(config.validate().is_err());

        let mut config = BenchConfig::default();
        config.io.source = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_read_size() {
        let mut config = BenchConfig::default();
        config.io.read_size = MAX_READ_SIZE;
        assert!(config.validate().is_ok());

        config.io.read_size = MAX_READ_SIZE + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("io.read_size must be at most"), "{err:#}");
    }
}
