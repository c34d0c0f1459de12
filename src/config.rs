use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    // 应用信息
    pub app_name: &'static str,
    pub app_version: &'static str,

    // 网络接收配置
    pub receiver_port: u16,
    pub multicast_group: Ipv4Addr,
    pub interface: Ipv4Addr,
    pub unicast: bool,
    pub receiver_buffer_size: usize,

    // 音频输出配置
    pub latency_ms: u32,
    pub stream_name: &'static str,
    pub channel_capacity: usize,
}

impl Config {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            app_name: env!("APP_NAME"),
            app_version: env!("APP_VERSION"),

            receiver_port: env!("RECEIVER_PORT").parse()
                .map_err(|_| "Failed to parse RECEIVER_PORT")?,
            multicast_group: env!("RECEIVER_MULTICAST_GROUP").parse()
                .map_err(|_| "Failed to parse RECEIVER_MULTICAST_GROUP")?,
            interface: env!("RECEIVER_INTERFACE").parse()
                .map_err(|_| "Failed to parse RECEIVER_INTERFACE")?,
            unicast: env!("RECEIVER_UNICAST").parse()
                .map_err(|_| "Failed to parse RECEIVER_UNICAST")?,
            receiver_buffer_size: env!("RECEIVER_BUFFER_SIZE").parse()
                .map_err(|_| "Failed to parse RECEIVER_BUFFER_SIZE")?,

            latency_ms: env!("OUTPUT_LATENCY_MS").parse()
                .map_err(|_| "Failed to parse OUTPUT_LATENCY_MS")?,
            stream_name: env!("OUTPUT_STREAM_NAME"),
            channel_capacity: env!("OUTPUT_CHANNEL_CAPACITY").parse()
                .map_err(|_| "Failed to parse OUTPUT_CHANNEL_CAPACITY")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new().expect("Failed to create default Config from build-time environment variables")
    }
}
