//! Cross-variant tests: channel resolution grid, staged files and the
//! rendered document shape shared by all three plan compilers.

#[cfg(test)]
mod tests {
    use crate::{
        generate_cloud_config, new_init_control_plane, new_join_control_plane, new_join_worker,
        CloudConfig, Confinement, ControlPlaneInitInput, ControlPlaneJoinInput, File, Script,
        WorkerInput, CLOUD_CONFIG_HEADER,
    };

    struct ChannelCase {
        kubernetes_version: &'static str,
        confinement: Confinement,
        risk_level: &'static str,
        expect: &'static str,
    }

    const CHANNEL_CASES: &[ChannelCase] = &[
        ChannelCase {
            kubernetes_version: "v1.25.2",
            confinement: Confinement::Classic,
            risk_level: "",
            expect: "--channel 1.25 --classic",
        },
        ChannelCase {
            kubernetes_version: "v1.25.2",
            confinement: Confinement::Classic,
            risk_level: "stable",
            expect: "--channel 1.25/stable --classic",
        },
        ChannelCase {
            kubernetes_version: "v1.25.2",
            confinement: Confinement::Classic,
            risk_level: "edge",
            expect: "--channel 1.25/edge --classic",
        },
        ChannelCase {
            kubernetes_version: "v1.25.2",
            confinement: Confinement::Strict,
            risk_level: "",
            expect: "--channel 1.25-strict",
        },
        ChannelCase {
            kubernetes_version: "v1.26.0",
            confinement: Confinement::Strict,
            risk_level: "edge",
            expect: "--channel 1.26-strict/edge",
        },
        ChannelCase {
            kubernetes_version: "1.24.17",
            confinement: Confinement::Classic,
            risk_level: "",
            expect: "--channel 1.24 --classic",
        },
    ];

    fn init_input(case: &ChannelCase) -> ControlPlaneInitInput {
        ControlPlaneInitInput {
            control_plane_endpoint: "k8s.my-domain.com".to_string(),
            token: "a".repeat(32),
            token_ttl: 10000,
            kubernetes_version: case.kubernetes_version.to_string(),
            confinement: case.confinement,
            risk_level: case.risk_level.to_string(),
            ..Default::default()
        }
    }

    fn join_input(case: &ChannelCase) -> ControlPlaneJoinInput {
        ControlPlaneJoinInput {
            control_plane_endpoint: "k8s.my-domain.com".to_string(),
            token: "a".repeat(32),
            token_ttl: 10000,
            kubernetes_version: case.kubernetes_version.to_string(),
            confinement: case.confinement,
            risk_level: case.risk_level.to_string(),
            join_node_ips: vec!["10.0.3.39".to_string()],
            ..Default::default()
        }
    }

    fn worker_input(case: &ChannelCase) -> WorkerInput {
        WorkerInput {
            control_plane_endpoint: "k8s.my-domain.com".to_string(),
            token: "a".repeat(32),
            kubernetes_version: case.kubernetes_version.to_string(),
            confinement: case.confinement,
            risk_level: case.risk_level.to_string(),
            join_node_ips: vec!["10.0.3.39".to_string()],
            ..Default::default()
        }
    }

    fn install_command(config: &CloudConfig) -> &str {
        config
            .runcmd
            .iter()
            .find(|cmd| cmd.contains("00-install-snapk8s.sh"))
            .unwrap()
    }

    #[test]
    fn test_channel_grid_across_all_variants() {
        for case in CHANNEL_CASES {
            let expected = format!("\"{}\"", case.expect);

            let init = new_init_control_plane(&init_input(case)).unwrap();
            assert!(
                install_command(&init).contains(&expected),
                "init: {} {:?} {}",
                case.kubernetes_version,
                case.confinement,
                case.risk_level
            );

            let join = new_join_control_plane(&join_input(case)).unwrap();
            assert!(
                install_command(&join).contains(&expected),
                "join: {} {:?} {}",
                case.kubernetes_version,
                case.confinement,
                case.risk_level
            );

            let worker = new_join_worker(&worker_input(case)).unwrap();
            assert!(
                install_command(&worker).contains(&expected),
                "worker: {} {:?} {}",
                case.kubernetes_version,
                case.confinement,
                case.risk_level
            );
        }
    }

    #[test]
    fn test_invalid_version_rejected_across_all_variants() {
        let case = ChannelCase {
            kubernetes_version: "not-a-version",
            confinement: Confinement::Classic,
            risk_level: "",
            expect: "",
        };
        assert!(matches!(
            new_init_control_plane(&init_input(&case)),
            Err(crate::Error::InvalidVersion(_))
        ));
        assert!(matches!(
            new_join_control_plane(&join_input(&case)),
            Err(crate::Error::InvalidVersion(_))
        ));
        assert!(matches!(
            new_join_worker(&worker_input(&case)),
            Err(crate::Error::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_all_step_scripts_staged_before_any_command() {
        let case = &CHANNEL_CASES[0];
        for config in [
            new_init_control_plane(&init_input(case)).unwrap(),
            new_join_control_plane(&join_input(case)).unwrap(),
            new_join_worker(&worker_input(case)).unwrap(),
        ] {
            for script in &Script::ALL {
                let file = config
                    .write_files
                    .iter()
                    .find(|file| file.path == script.path())
                    .unwrap_or_else(|| panic!("missing script file {}", script.path()));
                assert!(!file.content.is_empty());
                assert_eq!(file.permissions, "0500");
                assert_eq!(file.owner, "root:root");
            }
            assert_eq!(config.runcmd[0], "set -x");
        }
    }

    #[test]
    fn test_extra_write_files_on_all_variants() {
        let extra = File {
            content: "CONTENT".to_string(),
            path: "/tmp/extra-file".to_string(),
            permissions: "0644".to_string(),
            owner: "ubuntu:ubuntu".to_string(),
        };

        let case = &CHANNEL_CASES[0];

        let mut init = init_input(case);
        init.extra_write_files = vec![extra.clone()];
        assert!(new_init_control_plane(&init)
            .unwrap()
            .write_files
            .contains(&extra));

        let mut join = join_input(case);
        join.extra_write_files = vec![extra.clone()];
        assert!(new_join_control_plane(&join)
            .unwrap()
            .write_files
            .contains(&extra));

        let mut worker = worker_input(case);
        worker.extra_write_files = vec![extra.clone()];
        assert!(new_join_worker(&worker).unwrap().write_files.contains(&extra));
    }

    #[test]
    fn test_extra_kubelet_args_staged_on_all_variants() {
        let args = vec!["--node-labels=size=large".to_string()];
        let case = &CHANNEL_CASES[0];

        let mut init = init_input(case);
        init.extra_kubelet_args = args.clone();
        let mut join = join_input(case);
        join.extra_kubelet_args = args.clone();
        let mut worker = worker_input(case);
        worker.extra_kubelet_args = args.clone();

        for config in [
            new_init_control_plane(&init).unwrap(),
            new_join_control_plane(&join).unwrap(),
            new_join_worker(&worker).unwrap(),
        ] {
            let file = config
                .write_files
                .iter()
                .find(|file| file.path == "/var/tmp/extra-kubelet-args")
                .unwrap();
            assert_eq!(file.content, "--node-labels=size=large");
        }
    }

    #[test]
    fn test_rendered_document_shape() {
        let case = &CHANNEL_CASES[0];
        let rendered =
            generate_cloud_config(&new_init_control_plane(&init_input(case)).unwrap()).unwrap();
        let text = String::from_utf8(rendered).unwrap();

        assert!(text.starts_with(CLOUD_CONFIG_HEADER));
        let write_files = text.find("write_files:").unwrap();
        let runcmd = text.find("runcmd:").unwrap();
        let bootcmd = text.find("bootcmd:").unwrap();
        assert!(write_files < runcmd);
        assert!(runcmd < bootcmd);
    }

    #[test]
    fn test_rendering_is_deterministic_across_variants() {
        let case = &CHANNEL_CASES[0];
        for _ in 0..3 {
            let a =
                generate_cloud_config(&new_join_control_plane(&join_input(case)).unwrap()).unwrap();
            let b =
                generate_cloud_config(&new_join_control_plane(&join_input(case)).unwrap()).unwrap();
            assert_eq!(a, b);
        }
    }
}
