use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    application: Application,
    receiver: Receiver,
    output: Output,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct Receiver {
    port: u16,
    multicast_group: String,
    interface: String,
    unicast: bool,
    buffer_size: usize,
}

#[derive(Deserialize)]
struct Output {
    latency_ms: u32,
    stream_name: String,
    channel_capacity: usize,
}

// 在编译时读取 config.toml 并设置环境变量
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    // 应用信息
    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);

    // 网络接收配置
    println!("cargo:rustc-env=RECEIVER_PORT={}", config.receiver.port);
    println!("cargo:rustc-env=RECEIVER_MULTICAST_GROUP={}", config.receiver.multicast_group);
    println!("cargo:rustc-env=RECEIVER_INTERFACE={}", config.receiver.interface);
    println!("cargo:rustc-env=RECEIVER_UNICAST={}", config.receiver.unicast);
    println!("cargo:rustc-env=RECEIVER_BUFFER_SIZE={}", config.receiver.buffer_size);

    // 音频输出配置
    println!("cargo:rustc-env=OUTPUT_LATENCY_MS={}", config.output.latency_ms);
    println!("cargo:rustc-env=OUTPUT_STREAM_NAME={}", config.output.stream_name);
    println!("cargo:rustc-env=OUTPUT_CHANNEL_CAPACITY={}", config.output.channel_capacity);
}
