//! Unit tests for the reconcile_helpers module

#[cfg(test)]
mod tests {
    use crate::reconcile_helpers::*;
    use crds::{
        CloudInitWriteFile, ClusterConfiguration, InitConfiguration, Machine, MachineAddress,
        MachineSpec, MachineStatus, SnapClusterConfigSpec, DEFAULT_JOIN_TOKEN_TTL_SECS,
    };

    fn machine(name: &str, provider_id: Option<&str>, phase: &str, addresses: &[&str]) -> Machine {
        let mut machine = Machine::new(
            name,
            MachineSpec {
                cluster_name: "cluster-a".to_string(),
                provider_id: provider_id.map(str::to_string),
                ..Default::default()
            },
        );
        machine.status = Some(MachineStatus {
            phase: Some(phase.to_string()),
            addresses: addresses
                .iter()
                .map(|address| MachineAddress {
                    type_: "InternalIP".to_string(),
                    address: (*address).to_string(),
                })
                .collect(),
        });
        machine
    }

    #[test]
    fn test_ports_remapped_by_default() {
        let spec = SnapClusterConfigSpec::default();
        assert_eq!(
            resolved_ports(&spec),
            ("30000".to_string(), "2379".to_string())
        );
    }

    #[test]
    fn test_ports_default_when_remap_disabled() {
        let spec = SnapClusterConfigSpec {
            cluster_configuration: Some(ClusterConfiguration {
                port_compatibility_remap: false,
            }),
            ..Default::default()
        };
        assert_eq!(
            resolved_ports(&spec),
            ("25000".to_string(), "19001".to_string())
        );
    }

    #[test]
    fn test_generated_token_is_valid() {
        let token = generate_join_token();
        assert_eq!(token.len(), cloudinit::TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_join_token());
    }

    #[test]
    fn test_join_addresses_filter_and_order() {
        let machines = vec![
            machine("cp-0", Some("provider://0"), "Running", &["10.0.3.39"]),
            // Not provisioned yet
            machine("cp-1", None, "Running", &["10.0.3.40"]),
            // Not running
            machine("cp-2", Some("provider://2"), "Provisioning", &["10.0.3.41"]),
            // No address reported yet
            machine("cp-3", Some("provider://3"), "Running", &[]),
            machine("cp-4", Some("provider://4"), "Running", &["10.0.3.42"]),
        ];
        assert_eq!(join_addresses(&machines), vec!["10.0.3.39", "10.0.3.42"]);
    }

    #[test]
    fn test_init_input_from_spec() {
        let spec = SnapClusterConfigSpec {
            init_configuration: Some(InitConfiguration {
                join_token_ttl_in_secs: Some(10000),
                addons: vec!["ingress".to_string()],
                ip_in_ip: true,
                http_proxy: Some("http://proxy:3128".to_string()),
                confinement: "strict".to_string(),
                risk_level: "edge".to_string(),
                extra_kubelet_args: vec!["--node-labels=a=b".to_string()],
                ..Default::default()
            }),
            ..Default::default()
        };
        let ctx = BootstrapContext {
            spec: &spec,
            endpoint: "k8s.my-domain.com".to_string(),
            kubernetes_version: "v1.25.2".to_string(),
            token: "a".repeat(32),
        };

        let input = init_input(&ctx, "CERT".to_string(), "KEY".to_string());
        assert_eq!(input.ca_cert, "CERT");
        assert_eq!(input.ca_key, "KEY");
        assert_eq!(input.control_plane_endpoint, "k8s.my-domain.com");
        assert_eq!(input.token_ttl, 10000);
        assert_eq!(input.cluster_agent_port, "30000");
        assert_eq!(input.dqlite_port, "2379");
        assert!(input.ip_in_ip);
        assert_eq!(input.addons, vec!["ingress"]);
        assert_eq!(input.confinement, cloudinit::Confinement::Strict);
        assert_eq!(input.risk_level, "edge");
        assert_eq!(input.containerd_proxy.http.as_deref(), Some("http://proxy:3128"));
        assert_eq!(input.extra_kubelet_args, vec!["--node-labels=a=b"]);
    }

    #[test]
    fn test_init_input_defaults_without_init_configuration() {
        let spec = SnapClusterConfigSpec::default();
        let ctx = BootstrapContext {
            spec: &spec,
            endpoint: "10.0.0.1".to_string(),
            kubernetes_version: "v1.25.2".to_string(),
            token: "a".repeat(32),
        };

        let input = init_input(&ctx, String::new(), String::new());
        assert_eq!(input.token_ttl, DEFAULT_JOIN_TOKEN_TTL_SECS);
        assert!(input.addons.is_empty());
        assert_eq!(input.confinement, cloudinit::Confinement::Classic);
        assert!(!input.ip_in_ip);
    }

    #[test]
    fn test_control_plane_join_input_carries_commands_and_proxies() {
        let spec = SnapClusterConfigSpec {
            init_configuration: Some(InitConfiguration {
                disable_default_cni: true,
                snapstore_proxy_scheme: "https".to_string(),
                snapstore_proxy_domain: "snapstore.internal".to_string(),
                snapstore_proxy_id: "store-id".to_string(),
                snapstore_http_proxy: Some("http://proxy:3128".to_string()),
                boot_commands: vec!["echo boot".to_string()],
                pre_run_commands: vec!["echo pre".to_string()],
                post_run_commands: vec!["echo post".to_string()],
                ..Default::default()
            }),
            ..Default::default()
        };
        let ctx = BootstrapContext {
            spec: &spec,
            endpoint: "k8s.my-domain.com".to_string(),
            kubernetes_version: "v1.25.2".to_string(),
            token: "a".repeat(32),
        };

        let input = control_plane_join_input(
            &ctx,
            "auth".to_string(),
            vec!["10.0.3.39".to_string()],
        );
        assert_eq!(input.auth_token, "auth");
        assert!(input.disable_default_cni);
        assert_eq!(input.join_node_ips, vec!["10.0.3.39"]);
        assert_eq!(input.snapstore_proxy.domain, "snapstore.internal");
        assert_eq!(input.snapstore_http_proxy.as_deref(), Some("http://proxy:3128"));
        assert_eq!(input.boot_commands, vec!["echo boot"]);
        assert_eq!(input.pre_run_commands, vec!["echo pre"]);
        assert_eq!(input.post_run_commands, vec!["echo post"]);
    }

    #[test]
    fn test_worker_input_subset() {
        let spec = SnapClusterConfigSpec::default();
        let ctx = BootstrapContext {
            spec: &spec,
            endpoint: "k8s.my-domain.com".to_string(),
            kubernetes_version: "v1.25.2".to_string(),
            token: "a".repeat(32),
        };

        let input = worker_input(&ctx, vec!["10.0.3.39".to_string()]);
        assert_eq!(input.cluster_agent_port, "30000");
        assert_eq!(input.join_node_ips, vec!["10.0.3.39"]);
    }

    #[test]
    fn test_write_files_conversion() {
        let files = vec![CloudInitWriteFile {
            content: "CONTENT".to_string(),
            path: "/tmp/file".to_string(),
            permissions: "0644".to_string(),
            owner: "root:root".to_string(),
        }];
        let converted = write_files_from_api(&files);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].content, "CONTENT");
        assert_eq!(converted[0].path, "/tmp/file");
        assert_eq!(converted[0].permissions, "0644");
        assert_eq!(converted[0].owner, "root:root");
    }
}
