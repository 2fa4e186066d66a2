use std::sync::Arc;
use std::time::Duration;

use lipsync_face::animation::FaceAnimator;
use lipsync_face::audio::{
    CaptureTap, HttpFetcher, LipSync, OnEnded, PlayOptions, PlaybackRouter, create_decoder_factory,
    create_output,
};
use lipsync_face::command_bridge::{CommandBridge, CommandEvent};
use lipsync_face::config::Config;
use lipsync_face::face_bridge::FaceBridge;
use lipsync_face::motion::{ExpressionController, ExpressionWeights};
use lipsync_face::protocol::Command;
use tokio::signal;
use tokio::sync::mpsc;

/// Events delivered back onto the main loop from other contexts.
enum CoreEvent {
    PlaybackEnded,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    // 加载配置
    let config = Config::new().unwrap_or_default();
    log::info!("{} {} starting", config.app_name, config.app_version);

    // 命令通道
    let (tx_cmd_event, mut rx_cmd_event) = mpsc::channel::<CommandEvent>(100);
    // 播放结束通知，回到主循环处理
    let (tx_core_event, mut rx_core_event) = mpsc::channel::<CoreEvent>(100);

    // 启动命令桥，接收表情命令和音频
    let command_bridge = Arc::new(CommandBridge::new(&config, tx_cmd_event).await?);
    let command_bridge_clone = command_bridge.clone();
    tokio::spawn(async move {
        if let Err(e) = command_bridge_clone.run().await {
            log::error!("CommandBridge error: {}", e);
        }
    });

    // 渲染桥，发送表情权重
    let face_bridge = FaceBridge::new(&config).await?;

    // 音频播放与口型分析共享同一个采集抽头
    let tap = CaptureTap::new(config.audio.window_size);
    let router = Arc::new(PlaybackRouter::new(
        create_decoder_factory(&config.audio)?,
        create_output(&config.audio),
        Arc::new(HttpFetcher::new()),
        tap.clone(),
    ));
    let controller = ExpressionController::new(ExpressionWeights::new(), config.blink.clone());
    let mut animator = FaceAnimator::new(controller, LipSync::new(tap), config.lip_sync_expression);

    let mut ticker = tokio::time::interval(Duration::from_secs_f32(config.tick_interval_secs()));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_tick = tokio::time::Instant::now();

    log::info!(
        "Core started: commands on udp/{}, faces to {}:{}, {} Hz",
        config.command_local_port,
        config.face_remote_ip,
        config.face_remote_port,
        config.tick_hz,
    );

    loop {
        tokio::select! {
            // 监听 Ctrl+C 信号
            _ = signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down...");
                break;
            }

            // 动画帧
            now = ticker.tick() => {
                let delta = now.duration_since(last_tick).as_secs_f32();
                last_tick = now;

                animator.tick(delta);

                if let Err(e) = face_bridge.flush(animator.controller_mut().sink_mut()).await {
                    log::warn!("Failed to send expression frame: {}", e);
                }
            }

            // 命令源事件
            Some(event) = rx_cmd_event.recv() => {
                match event {
                    CommandEvent::Command(Command::Emotion(preset)) => {
                        log::info!("Emotion command: {}", preset);
                        animator.controller_mut().set_emotion(preset);
                    }
                    CommandEvent::Command(Command::LipSync { expression, value }) => {
                        animator.command_lip_sync(&expression, value);
                    }
                    CommandEvent::Command(Command::PlayUrl(url)) => {
                        animator.playback_started();
                        let router = router.clone();
                        let on_ended = ended_notifier(&tx_core_event);
                        tokio::spawn(async move {
                            // 错误已在路由内记录并回调
                            let _ = router.play_from_url(&url, Some(on_ended)).await;
                        });
                    }
                    CommandEvent::Audio(data) => {
                        animator.playback_started();
                        let router = router.clone();
                        let on_ended = ended_notifier(&tx_core_event);
                        let options = PlayOptions::raw_pcm16(config.audio.pcm_sample_rate);
                        tokio::spawn(async move {
                            let _ = router.play(data, options, Some(on_ended)).await;
                        });
                    }
                }
            }

            Some(event) = rx_core_event.recv() => {
                match event {
                    CoreEvent::PlaybackEnded => animator.playback_ended(),
                }
            }
        }
    }
    Ok(())
}

/// Completion callback that hops back onto the main loop.
fn ended_notifier(tx: &mpsc::Sender<CoreEvent>) -> OnEnded {
    let tx = tx.clone();
    // Fired from a playback thread or from inside the runtime, so never block.
    Box::new(move || {
        if let Err(e) = tx.try_send(CoreEvent::PlaybackEnded) {
            log::warn!("Failed to deliver playback end: {}", e);
        }
    })
}
