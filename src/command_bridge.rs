use crate::config::Config;
use crate::protocol::{Command, ErrorReply};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum CommandEvent {
    Command(Command),
    /// Raw PCM16 audio datagram
    Audio(Bytes),
}

pub struct CommandBridge {
    socket: Arc<UdpSocket>,
    buffer_size: usize,
    tx: mpsc::Sender<CommandEvent>,
}

// 命令源进程通过本地UDP发送JSON命令或PCM音频，端口在配置中指定
impl CommandBridge {
    pub async fn new(config: &Config, tx: mpsc::Sender<CommandEvent>) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(format!("0.0.0.0:{}", config.command_local_port)).await?;
        Ok(Self::from_socket(socket, config.bridge_buffer_size, tx))
    }

    pub fn from_socket(socket: UdpSocket, buffer_size: usize, tx: mpsc::Sender<CommandEvent>) -> Self {
        Self {
            socket: Arc::new(socket),
            buffer_size,
            tx,
        }
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let mut buf = vec![0u8; self.buffer_size.max(1)];
        loop {
            let (len, peer) = self.socket.recv_from(&mut buf).await?;
            if len == 0 {
                continue;
            }

            let event = match classify(&buf[..len]) {
                Ok(event) => event,
                Err(message) => {
                    log::warn!("Rejected command from {}: {}", peer, message);
                    self.reply_error(peer, message).await;
                    continue;
                }
            };

            if let Err(e) = self.tx.send(event).await {
                log::error!("Failed to forward command event: {}", e);
                break;
            }
        }
        Ok(())
    }

    async fn reply_error(&self, peer: SocketAddr, message: String) {
        let reply = match serde_json::to_string(&ErrorReply::new(message)) {
            Ok(reply) => reply,
            Err(_) => return,
        };
        if let Err(e) = self.socket.send_to(reply.as_bytes(), peer).await {
            log::warn!("Failed to send error reply to {}: {}", peer, e);
        }
    }
}

/// JSON objects are commands; anything else is PCM audio.
fn classify(data: &[u8]) -> Result<CommandEvent, String> {
    if data.first() == Some(&b'{') {
        let text = std::str::from_utf8(data).map_err(|e| e.to_string())?;
        return Command::parse(text)
            .map(CommandEvent::Command)
            .map_err(|e| e.to_string());
    }
    Ok(CommandEvent::Audio(Bytes::copy_from_slice(data)))
}
