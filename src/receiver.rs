use crate::config::Config;
use crate::protocol::{self, AudioChunk};
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

/// Receives Scream packets and hands them to the playback thread.
pub struct Receiver {
    socket: UdpSocket,
    buffer_size: usize,
    tx: mpsc::Sender<AudioChunk>,
}

impl Receiver {
    pub async fn new(config: &Config, tx: mpsc::Sender<AudioChunk>) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, config.receiver_port)).await?;

        if config.unicast {
            log::info!("Receiving unicast on port {}", config.receiver_port);
        } else {
            socket.join_multicast_v4(config.multicast_group, config.interface)?;
            log::info!(
                "Receiving multicast {}:{} on interface {}",
                config.multicast_group,
                config.receiver_port,
                config.interface,
            );
        }

        Ok(Self::from_socket(socket, config.receiver_buffer_size, tx))
    }

    pub fn from_socket(socket: UdpSocket, buffer_size: usize, tx: mpsc::Sender<AudioChunk>) -> Self {
        Self {
            socket,
            buffer_size,
            tx,
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Forward packets until the playback side goes away.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut buf = vec![0u8; self.buffer_size];
        log::info!("Listening on {}", self.local_addr()?);
        loop {
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            let Some(chunk) = protocol::parse_packet(&buf[..len]) else {
                log::debug!("Dropping {} byte packet from {}: no audio payload", len, from);
                continue;
            };
            if self.tx.send(chunk).await.is_err() {
                log::info!("Playback side closed, receiver stopping");
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ReceiverFormat;

    #[tokio::test]
    async fn forwards_parsed_packets_and_skips_empty_ones() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        let receiver = Receiver::from_socket(socket, 2048, tx);
        let addr = receiver.local_addr().unwrap();

        let task = tokio::spawn(async move { receiver.run().await });

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(&[1, 16, 2, 3, 0], addr).await.unwrap();
        sender.send_to(&[129, 24, 6, 0x3f, 0, 7, 8, 9], addr).await.unwrap();

        let chunk = rx.recv().await.unwrap();
        assert_eq!(
            chunk.format,
            ReceiverFormat {
                sample_rate: 129,
                sample_size: 24,
                channels: 6,
                channel_map: 0x003f,
            }
        );
        assert_eq!(&chunk.audio[..], &[7, 8, 9]);

        drop(rx);
        sender.send_to(&[1, 16, 2, 3, 0, 1], addr).await.unwrap();
        task.await.unwrap().unwrap();
    }
}
