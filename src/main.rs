mod audio;
mod config;
mod error;
mod protocol;
mod receiver;

use audio::{PlayConfig, Player};
use config::Config;
use protocol::AudioChunk;
use receiver::Receiver;
use tokio::signal;
use tokio::sync::mpsc;

fn main() -> anyhow::Result<()> {
    // 初始化日志，默认 info 级别
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 修改环境变量必须在任何线程启动之前完成
    audio::pulse_device::set_icon_hint();

    // 加载配置
    let config = Config::new().unwrap_or_default();
    log::info!("{} receiver {} starting", config.app_name, config.app_version);

    // 接收任务 -> 播放线程
    let (tx_chunk, rx_chunk) = mpsc::channel::<AudioChunk>(config.channel_capacity);

    // 播放在独立的系统线程中进行，PulseAudio 连接失败直接退出
    let player = Player::start(
        PlayConfig {
            latency_ms: config.latency_ms,
            port_name: config.stream_name.to_string(),
        },
        rx_chunk,
    )?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(config, tx_chunk, player))
}

async fn run(config: Config, tx_chunk: mpsc::Sender<AudioChunk>, player: Player) -> anyhow::Result<()> {
    // 创建失败时 Sender 已被释放，等播放线程关闭输出后再退出
    let receiver = match Receiver::new(&config, tx_chunk).await {
        Ok(receiver) => receiver,
        Err(e) => {
            tokio::task::spawn_blocking(move || player.join()).await?;
            return Err(e);
        }
    };
    let mut receiver_task = tokio::spawn(async move {
        if let Err(e) = receiver.run().await {
            log::error!("Receiver error: {}", e);
        }
    });

    let receiver_done = tokio::select! {
        // 监听 Ctrl+C 信号
        _ = signal::ctrl_c() => {
            log::info!("Received Ctrl+C, shutting down...");
            false
        }
        _ = &mut receiver_task => {
            log::info!("Receiver stopped, shutting down...");
            true
        }
    };

    // 取消接收任务以释放 Sender，播放线程随之退出
    if !receiver_done {
        receiver_task.abort();
        let _ = receiver_task.await;
    }
    tokio::task::spawn_blocking(move || player.join()).await?;
    Ok(())
}
