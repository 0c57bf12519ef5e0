use spiketools::cfg::Monitor;
use std::path::PathBuf;
use std::time::Duration;

fn serialize_config(config: &Monitor) -> String {
    let ser = serde_json::to_string(config).unwrap();
    return ser;
}

fn deserialize_config(config: &str) -> Monitor {
    let de: Monitor = serde_json::from_str(config).unwrap();
    return de;
}

#[test]
fn serde_roundtrip() {
    let config = Monitor {
        port: String::from("COM5"),
        on_screen: 800,
        poll_period: Duration::from_millis(50),
        carry_partial: true,
        ..Default::default()
    };
    let serconfig = serialize_config(&config);
    let deconfig = deserialize_config(&serconfig);
    assert_eq!(config, deconfig);
}

#[test]
fn de_empty_is_default() {
    let de = deserialize_config("{}");
    assert_eq!(de, Monitor::default());
    assert_eq!(de.baud, 115_200);
    assert_eq!(de.read_quota, 300);
    assert_eq!(de.on_screen, 400);
    assert_eq!(de.max_act(), 120);
    assert_eq!(de.read_timeout, Duration::from_millis(100));
    assert_eq!(de.image, PathBuf::from("img.bmp"));
    assert!(!de.carry_partial);
    assert!(de.validate().is_ok());
}

#[test]
fn de_humantime() {
    let x =
        r#"{
            "port": "/dev/ttyACM0",
            "read_timeout": "250ms",
            "poll_period": "1s 500ms",
            "image": "digits/three.png",
            "max_act": 200
        }"#;

    let de = deserialize_config(x);

    let r = Monitor {
        port: String::from("/dev/ttyACM0"),
        read_timeout: "250ms".parse::<humantime::Duration>().unwrap().into(),
        poll_period: "1s 500ms".parse::<humantime::Duration>().unwrap().into(),
        image: PathBuf::from("digits/three.png"),
        max_act: 200,
        ..Default::default()
    };

    assert_eq!(r, de);
    assert_eq!(de.max_act(), 200);
}

#[test]
fn validate_rejects_bad_values() {
    let too_bright = Monitor { max_act: 256, ..Default::default() };
    assert!(too_bright.validate().is_err());

    let no_quota = Monitor { read_quota: 0, ..Default::default() };
    assert!(no_quota.validate().is_err());

    let no_period = Monitor { poll_period: Duration::ZERO, ..Default::default() };
    assert!(no_period.validate().is_err());
}

#[test]
fn from_file_reports_missing() {
    let err = Monitor::from_file("/nonexistent/spikeview.json").unwrap_err();
    assert!(format!("{:#}", err).contains("cannot open config"));
}
