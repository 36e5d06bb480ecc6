use pfsense2unifi::cli::run_with_args;
use std::fs;

const CONFIG: &str = r#"
[pfsense]
host = "192.0.2.1"
username = "admin"
password = "pfsense"

[unifi]
controller = "https://192.0.2.2"
api_key = "key"
lan_name = "Default"
"#;

const SOURCE_XML: &str = r#"<?xml version="1.0"?>
<pfsense>
    <unbound>
        <hosts>
            <host>testdns</host>
            <domain>bendiksens.net</domain>
            <ip>1.3.3.7</ip>
        </hosts>
    </unbound>
</pfsense>
"#;

#[test]
fn run_with_args_requires_a_mode() {
    let err = run_with_args(["pfsense2unifi"]).unwrap_err();
    assert!(err.to_string().contains("No mode given"));
}

#[test]
fn run_with_args_reports_missing_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let err = run_with_args([
        "pfsense2unifi",
        "--unifi-only",
        "--config",
        config.to_str().unwrap(),
    ])
    .unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("Failed to load configuration"));
}

#[test]
fn run_with_args_overrides_input_and_gateway_paths() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let input = dir.path().join("backup.xml");
    let gateway = dir.path().join("out.json");
    fs::write(&config, CONFIG).unwrap();
    fs::write(&input, SOURCE_XML).unwrap();

    run_with_args([
        "pfsense2unifi",
        "--unifi-only",
        "--skip-dhcp",
        "--config",
        config.to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
        "--gateway-out",
        gateway.to_str().unwrap(),
    ])
    .unwrap();

    let written = fs::read_to_string(&gateway).unwrap();
    assert!(written.contains("testdns.bendiksens.net"));
}

#[test]
fn run_with_args_upload_needs_ssh_settings() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let input = dir.path().join("config.xml");
    fs::write(&config, CONFIG).unwrap();
    fs::write(&input, SOURCE_XML).unwrap();

    let err = run_with_args([
        "pfsense2unifi",
        "--unifi-only",
        "--skip-dhcp",
        "--upload-gateway",
        "--config",
        config.to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
    ])
    .unwrap_err();

    assert!(format!("{:#}", err).contains("--upload-gateway"));
}
