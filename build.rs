use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    application: Application,
    audio: Audio,
    animation: Animation,
    blink: Blink,
    bridge: Bridge,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct Audio {
    playback_device: String,
    playback_period_size: usize,
    stream_format: String,
    opus_sample_rate: u32,
    opus_channels: u32,
    pcm_sample_rate: u32,
    window_size: usize,
}

#[derive(Deserialize)]
struct Animation {
    tick_hz: u32,
    lip_sync_expression: String,
}

#[derive(Deserialize)]
struct Blink {
    close_duration: f32,
    closed_duration: f32,
    open_duration: f32,
    hold_min: f32,
    hold_jitter: f32,
}

#[derive(Deserialize)]
struct Bridge {
    command_local_port: u16,
    face_remote_ip: String,
    face_remote_port: u16,
    buffer_size: usize,
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

    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);

    // 音频配置
    println!("cargo:rustc-env=AUDIO_PLAYBACK_DEVICE={}", config.audio.playback_device);
    println!("cargo:rustc-env=AUDIO_PLAYBACK_PERIOD_SIZE={}", config.audio.playback_period_size);
    println!("cargo:rustc-env=AUDIO_STREAM_FORMAT={}", config.audio.stream_format);
    println!("cargo:rustc-env=AUDIO_OPUS_SAMPLE_RATE={}", config.audio.opus_sample_rate);
    println!("cargo:rustc-env=AUDIO_OPUS_CHANNELS={}", config.audio.opus_channels);
    println!("cargo:rustc-env=AUDIO_PCM_SAMPLE_RATE={}", config.audio.pcm_sample_rate);
    println!("cargo:rustc-env=AUDIO_WINDOW_SIZE={}", config.audio.window_size);

    // 动画配置
    println!("cargo:rustc-env=ANIMATION_TICK_HZ={}", config.animation.tick_hz);
    println!("cargo:rustc-env=ANIMATION_LIP_SYNC_EXPRESSION={}", config.animation.lip_sync_expression);

    // 眨眼配置
    println!("cargo:rustc-env=BLINK_CLOSE_DURATION={}", config.blink.close_duration);
    println!("cargo:rustc-env=BLINK_CLOSED_DURATION={}", config.blink.closed_duration);
    println!("cargo:rustc-env=BLINK_OPEN_DURATION={}", config.blink.open_duration);
    println!("cargo:rustc-env=BLINK_HOLD_MIN={}", config.blink.hold_min);
    println!("cargo:rustc-env=BLINK_HOLD_JITTER={}", config.blink.hold_jitter);

    // UDP 桥配置
    println!("cargo:rustc-env=BRIDGE_COMMAND_LOCAL_PORT={}", config.bridge.command_local_port);
    println!("cargo:rustc-env=BRIDGE_FACE_REMOTE_IP={}", config.bridge.face_remote_ip);
    println!("cargo:rustc-env=BRIDGE_FACE_REMOTE_PORT={}", config.bridge.face_remote_port);
    println!("cargo:rustc-env=BRIDGE_BUFFER_SIZE={}", config.bridge.buffer_size);
}
