use crate::config::Config;
use crate::motion::ExpressionWeights;
use crate::protocol::ExpressionFrame;
use tokio::net::UdpSocket;

/// Forwards expression weights to the renderer process.
pub struct FaceBridge {
    socket: UdpSocket,
    target_addr: String,
}

// 渲染进程和Core进程通过本地UDP通信，每个动画帧发送一次表情权重
impl FaceBridge {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let target_addr = format!("{}:{}", config.face_remote_ip, config.face_remote_port);
        Self::connect(target_addr).await
    }

    pub async fn connect(target_addr: String) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        Ok(Self {
            socket,
            target_addr,
        })
    }

    /// Send the current weights if anything changed since the last frame.
    pub async fn flush(&self, weights: &mut ExpressionWeights) -> anyhow::Result<bool> {
        if !weights.take_dirty() {
            return Ok(false);
        }
        let msg = serde_json::to_string(&ExpressionFrame::new(weights.as_map()))?;
        self.socket.send_to(msg.as_bytes(), &self.target_addr).await?;
        Ok(true)
    }
}
