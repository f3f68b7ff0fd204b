fn main() {
    println!("cargo:rerun-if-env-changed=ROOMBRIDGE_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=ROOMBRIDGE_WIFI_PASSWORD");
    println!("cargo:rerun-if-env-changed=ROOMBRIDGE_MQTT_USER");
    println!("cargo:rerun-if-env-changed=ROOMBRIDGE_MQTT_PASSWORD");
    println!("cargo:rerun-if-env-changed=ROOMBRIDGE_CONFIG_JSON");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
